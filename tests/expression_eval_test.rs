// Copyright 2025 Stoolap Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Expression evaluation over table columns

use std::sync::Arc;

use tablexpr::{
    ArrayValue, ColumnDesc, DataType, Error, IndexAxis, MemoryTable, NdArray, Scalar,
    ShapeClass, StoredArray, StoredValue, Table, TableExpr, TableStore, Value, ValueType,
};
use tempfile::TempDir;

/// X: double times, S: labels, I: per-row index, A: fixed [2, 3] arrays
fn store() -> Arc<dyn TableStore> {
    let times = [1.4e9, 1.41e9, 1.43e9, 1.44e9, 1.47e9];
    let arrays = (0..5)
        .map(|r| {
            let data: Vec<f64> = (0..6).map(|k| (r * 10 + k) as f64).collect();
            Some(StoredArray::from(NdArray::new(&[2, 3], data).unwrap()))
        })
        .collect();
    Arc::new(
        MemoryTable::builder("obs", 5)
            .scalar_column(
                "X",
                DataType::Float64,
                times.iter().map(|&t| StoredValue::Float64(t)).collect(),
            )
            .scalar_column(
                "S",
                DataType::String,
                ["a", "b", "a", "c", "b"].into_iter().map(StoredValue::from).collect(),
            )
            .scalar_column(
                "I",
                DataType::Float64,
                [0.0, 1.0, 5.0, 0.0, 1.0].into_iter().map(StoredValue::from).collect(),
            )
            .array_column(ColumnDesc::fixed_array("A", DataType::Float64, &[2, 3]), arrays)
            .build()
            .unwrap(),
    )
}

fn open() -> (TempDir, Table) {
    let dir = tempfile::tempdir().unwrap();
    let table = Table::open(dir.path(), store()).unwrap();
    (dir, table)
}

fn bools(values: Vec<Value>) -> Vec<bool> {
    values
        .into_iter()
        .map(|v| v.into_scalar().and_then(|s| s.as_bool()).unwrap())
        .collect()
}

#[test]
fn test_time_comparison() {
    let (_dir, table) = open();
    let expr = table.col("X").unwrap().greater(&1.42e9.into()).unwrap();
    assert_eq!(expr.result_type(), ValueType::Bool);
    assert_eq!(expr.shape_class(), ShapeClass::Scalar);
    assert_eq!(
        bools(expr.evaluate_column().unwrap()),
        vec![false, false, true, true, true]
    );

    let selected = table.select(&expr).unwrap();
    assert_eq!(selected.nrow(), 3);
    assert_eq!(
        selected.col("X").unwrap().evaluate_scalar(0).unwrap(),
        Scalar::double(1.43e9)
    );
}

#[test]
fn test_string_equality_and_logic() {
    let (_dir, table) = open();
    let s = table.col("S").unwrap();
    let x = table.col("X").unwrap();
    let expr = s
        .equal(&"b".into())
        .unwrap()
        .or(&x.less(&1.405e9.into()).unwrap())
        .unwrap();
    assert_eq!(
        bools(expr.evaluate_column().unwrap()),
        vec![true, true, false, false, true]
    );
    let not = expr.not().unwrap();
    assert_eq!(
        bools(not.evaluate_column().unwrap()),
        vec![false, false, true, true, false]
    );
}

#[test]
fn test_membership() {
    let (_dir, table) = open();
    let set = ArrayValue::Double(NdArray::from_vec(vec![1.0, 5.0]));
    let expr = table.col("I").unwrap().is_in(&set.into()).unwrap();
    assert_eq!(
        bools(expr.evaluate_column().unwrap()),
        vec![false, true, true, false, true]
    );
}

#[test]
fn test_array_element_and_section() {
    let (_dir, table) = open();
    let a = table.col("A").unwrap();
    assert_eq!(a.shape_class(), ShapeClass::Array);
    assert_eq!(a.result_shape().unwrap().as_slice(), &[2, 3]);

    let elem = a
        .index(vec![IndexAxis::value(1.0), IndexAxis::value(2.0)])
        .unwrap();
    assert_eq!(elem.shape_class(), ShapeClass::Scalar);
    // first axis varies fastest
    assert_eq!(elem.evaluate_scalar(3).unwrap(), Scalar::double(35.0));

    let column = a
        .index(vec![IndexAxis::full(), IndexAxis::value(1.0)])
        .unwrap();
    assert_eq!(column.shape_class(), ShapeClass::Array);
    let part = column.evaluate_array(2).unwrap();
    assert_eq!(part.shape(), &[2, 1]);
    assert_eq!(part.get(0), Some(Scalar::double(22.0)));
    assert_eq!(part.get(1), Some(Scalar::double(23.0)));
}

#[test]
fn test_whole_column_matches_row_evaluation() {
    let (_dir, table) = open();
    let a = table.col("A").unwrap();
    let exprs = [
        a.index(vec![IndexAxis::value(0.0), IndexAxis::span(1.0, 2.0)])
            .unwrap(),
        a.index(vec![IndexAxis::value(1.0), IndexAxis::value(0.0)])
            .unwrap(),
        a.times(&2.0.into()).unwrap(),
    ];
    for expr in &exprs {
        let column = expr.evaluate_column().unwrap();
        let rows: Vec<Value> = (0..table.nrow())
            .map(|row| expr.evaluate(row).unwrap())
            .collect();
        assert_eq!(column, rows, "{}", expr);
    }
}

#[test]
fn test_scalar_broadcasts_over_array() {
    let (_dir, table) = open();
    let doubled = table.col("A").unwrap().times(&2.0.into()).unwrap();
    assert_eq!(doubled.shape_class(), ShapeClass::Array);
    let elem = doubled
        .index(vec![IndexAxis::value(1.0), IndexAxis::value(2.0)])
        .unwrap();
    assert_eq!(elem.evaluate_scalar(1).unwrap(), Scalar::double(30.0));
}

#[test]
fn test_row_index_error_names_row_and_expression() {
    let (_dir, table) = open();
    let i = table.col("I").unwrap();
    let expr = table
        .col("A")
        .unwrap()
        .index(vec![IndexAxis::at(i.node().clone()), IndexAxis::value(0.0)])
        .unwrap();
    assert!(!expr.is_constant());
    assert_eq!(expr.evaluate_scalar(1).unwrap(), Scalar::double(11.0));

    let err = expr.evaluate_scalar(2).unwrap_err();
    assert!(err.is_evaluation_error());
    assert_eq!(err.row(), Some(2));
    assert!(err.to_string().ends_with("(in expression A[I,0])"), "{}", err);

    let err = expr.evaluate_column().unwrap_err();
    assert_eq!(err.row(), Some(2));
}

#[test]
fn test_construction_errors() {
    let (_dir, table) = open();
    let err = table.col("nope").unwrap_err();
    assert!(matches!(err.root(), Error::ColumnNotFound(name) if name == "nope"));

    let s = table.col("S").unwrap();
    let x = table.col("X").unwrap();
    assert!(s.plus(&x).unwrap_err().is_construction_error());
    assert!(x.and(&x).unwrap_err().is_construction_error());
    assert!(x.index(vec![IndexAxis::value(0.0)]).is_err());
}

#[test]
fn test_constant_folding() {
    let expr = TableExpr::from(3.0)
        .times(&TableExpr::from(4.0))
        .unwrap()
        .minus(&TableExpr::from(2.0))
        .unwrap();
    assert!(expr.is_constant());
    assert_eq!(expr.nrow(), None);
    assert_eq!(expr.to_string(), "10");
    assert_eq!(expr.evaluate_scalar(1000).unwrap(), Scalar::double(10.0));
}

#[test]
fn test_row_out_of_range() {
    let (_dir, table) = open();
    let x = table.col("X").unwrap();
    assert_eq!(
        x.evaluate(5).unwrap_err(),
        Error::RowOutOfRange { row: 5, nrow: 5 }
    );
}

#[test]
fn test_whole_column_with_empty_cells() {
    let store: Arc<dyn TableStore> = Arc::new(
        MemoryTable::builder("ragged", 3)
            .array_column(
                ColumnDesc::variable_array("R", DataType::Float64, Some(1)),
                vec![
                    Some(StoredArray::from(NdArray::from_vec(Vec::<f64>::new()))),
                    Some(StoredArray::from(NdArray::from_vec(vec![1.0, 2.0]))),
                    Some(StoredArray::from(NdArray::from_vec(Vec::<f64>::new()))),
                ],
            )
            .build()
            .unwrap(),
    );
    let table = Table::temporary(store);
    let r = table.col("R").unwrap();

    let column = r.evaluate_column().unwrap();
    let rows: Vec<Value> = (0..table.nrow())
        .map(|row| r.evaluate(row).unwrap())
        .collect();
    assert_eq!(column, rows);
    assert_eq!(column[0].as_array().unwrap().shape(), &[0]);
    assert_eq!(column[1].as_array().unwrap().len(), 2);
}
