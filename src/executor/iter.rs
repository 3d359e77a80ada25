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

//! Grouped iteration
//!
//! [`TableIterator`] orders the rows of a table by one or more scalar key
//! columns and yields every maximal run of rows with equal keys as a
//! [`TableGroup`]. Ties are broken by row number, so all sort algorithms
//! produce the same order.

use std::cmp::Ordering;
use std::fmt;
use std::iter::FusedIterator;
use std::str::FromStr;
use std::time::Instant;

use crate::api::Table;
use crate::core::{Error, Result, Scalar, ShapeClass};
use crate::storage::{ColumnAccessor, LockType};

/// Direction of the key order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl FromStr for SortOrder {
    type Err = Error;

    /// Parses on the first character: `a...` or `d...`
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().chars().next().map(|c| c.to_ascii_lowercase()) {
            Some('a') => Ok(SortOrder::Ascending),
            Some('d') => Ok(SortOrder::Descending),
            _ => Err(Error::parse(format!("unknown sort order '{}'", s))),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortOrder::Ascending => write!(f, "ascending"),
            SortOrder::Descending => write!(f, "descending"),
        }
    }
}

/// Sort algorithm used to order the rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortAlgorithm {
    QuickSort,
    InsertionSort,
    #[default]
    HeapSort,
    /// Rows are already in key order
    NoSort,
}

impl FromStr for SortAlgorithm {
    type Err = Error;

    /// Parses on the first character: `q`, `i` or `n`; anything else is heap sort
    fn from_str(s: &str) -> Result<Self> {
        Ok(match s.trim().chars().next().map(|c| c.to_ascii_lowercase()) {
            Some('q') => SortAlgorithm::QuickSort,
            Some('i') => SortAlgorithm::InsertionSort,
            Some('n') => SortAlgorithm::NoSort,
            _ => SortAlgorithm::HeapSort,
        })
    }
}

impl fmt::Display for SortAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortAlgorithm::QuickSort => write!(f, "quicksort"),
            SortAlgorithm::InsertionSort => write!(f, "insertion"),
            SortAlgorithm::HeapSort => write!(f, "heapsort"),
            SortAlgorithm::NoSort => write!(f, "nosort"),
        }
    }
}

/// Rows sharing one key value
#[derive(Debug, Clone)]
pub struct TableGroup {
    table: Table,
    keys: Vec<Scalar>,
    rows: Vec<usize>,
}

impl TableGroup {
    /// View of the group's rows
    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn into_table(self) -> Table {
        self.table
    }

    /// Key values of the group, one per key column
    pub fn keys(&self) -> &[Scalar] {
        &self.keys
    }

    /// Row numbers in the iterated table
    pub fn rows(&self) -> &[usize] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Iterator over the key groups of a table
#[derive(Debug)]
pub struct TableIterator {
    table: Table,
    keys: Vec<String>,
    /// Key tuple of every row, indexed by row number
    key_values: Vec<Vec<Scalar>>,
    /// Row numbers in key order
    order: Vec<usize>,
    pos: usize,
}

impl TableIterator {
    pub fn new(
        table: &Table,
        keys: &[&str],
        order: SortOrder,
        algorithm: SortAlgorithm,
    ) -> Result<Self> {
        if keys.is_empty() {
            return Err(Error::invalid_argument("iteration needs at least one key column"));
        }
        let accessors = keys
            .iter()
            .map(|&key| {
                let accessor = ColumnAccessor::new(table.store().clone(), key)?;
                if accessor.shape_class() != ShapeClass::Scalar {
                    return Err(Error::invalid_argument(format!(
                        "iteration key column '{}' is not a scalar column",
                        key
                    )));
                }
                Ok(accessor)
            })
            .collect::<Result<Vec<_>>>()?;

        let nrow = table.nrow();
        let key_values = {
            let _guard = table.access_guard(LockType::Read)?;
            (0..nrow)
                .map(|row| accessors.iter().map(|a| a.scalar_at(row)).collect())
                .collect::<Result<Vec<Vec<Scalar>>>>()?
        };

        let started = Instant::now();
        let mut rows: Vec<usize> = (0..nrow).collect();
        let mut comparisons = 0u64;
        let mut cmp = |a: &usize, b: &usize| {
            comparisons += 1;
            let ord = compare_keys(&key_values[*a], &key_values[*b]);
            let ord = match order {
                SortOrder::Ascending => ord,
                SortOrder::Descending => ord.reverse(),
            };
            ord.then(a.cmp(b))
        };
        match algorithm {
            SortAlgorithm::QuickSort => rows.sort_unstable_by(&mut cmp),
            SortAlgorithm::InsertionSort => insertion_sort(&mut rows, &mut cmp),
            SortAlgorithm::HeapSort => heap_sort(&mut rows, &mut cmp),
            SortAlgorithm::NoSort => {}
        }
        tracing::debug!(
            table = %table.name(),
            ?keys,
            nrow,
            %order,
            %algorithm,
            comparisons,
            elapsed_us = started.elapsed().as_micros() as u64,
            "ordered rows for grouped iteration"
        );

        Ok(Self {
            table: table.clone(),
            keys: keys.iter().map(|k| k.to_string()).collect(),
            key_values,
            order: rows,
            pos: 0,
        })
    }

    /// Key column names
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Row numbers in iteration order
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// Start again from the first group
    pub fn reset(&mut self) {
        self.pos = 0;
    }

    fn next_group(&mut self) -> Option<(Vec<Scalar>, Vec<usize>)> {
        let first = *self.order.get(self.pos)?;
        let start = self.pos;
        let key = &self.key_values[first];
        self.pos += 1;
        while let Some(&row) = self.order.get(self.pos) {
            if compare_keys(&self.key_values[row], key) != Ordering::Equal {
                break;
            }
            self.pos += 1;
        }
        Some((key.clone(), self.order[start..self.pos].to_vec()))
    }
}

impl Iterator for TableIterator {
    type Item = Result<TableGroup>;

    fn next(&mut self) -> Option<Self::Item> {
        let (keys, rows) = self.next_group()?;
        Some(self.table.subset(rows.clone()).map(|table| TableGroup {
            table,
            keys,
            rows,
        }))
    }
}

impl FusedIterator for TableIterator {}

fn compare_keys(a: &[Scalar], b: &[Scalar]) -> Ordering {
    a.iter()
        .zip(b)
        .map(|(x, y)| x.sort_cmp(y))
        .find(|o| o.is_ne())
        .unwrap_or(Ordering::Equal)
}

fn insertion_sort<T, F>(v: &mut [T], cmp: &mut F)
where
    F: FnMut(&T, &T) -> Ordering,
{
    for i in 1..v.len() {
        let mut j = i;
        while j > 0 && cmp(&v[j - 1], &v[j]) == Ordering::Greater {
            v.swap(j - 1, j);
            j -= 1;
        }
    }
}

fn heap_sort<T, F>(v: &mut [T], cmp: &mut F)
where
    F: FnMut(&T, &T) -> Ordering,
{
    let n = v.len();
    for root in (0..n / 2).rev() {
        sift_down(v, root, n, cmp);
    }
    for end in (1..n).rev() {
        v.swap(0, end);
        sift_down(v, 0, end, cmp);
    }
}

/// Restore the max-heap property below `root` within `v[..end]`
fn sift_down<T, F>(v: &mut [T], mut root: usize, end: usize, cmp: &mut F)
where
    F: FnMut(&T, &T) -> Ordering,
{
    loop {
        let mut child = 2 * root + 1;
        if child >= end {
            return;
        }
        if child + 1 < end && cmp(&v[child], &v[child + 1]) == Ordering::Less {
            child += 1;
        }
        if cmp(&v[root], &v[child]) != Ordering::Less {
            return;
        }
        v.swap(root, child);
        root = child;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DataType;
    use crate::storage::{MemoryTable, StoredValue};
    use proptest::prelude::*;
    use std::sync::Arc;

    fn table(scan: Vec<u8>) -> Table {
        let n = scan.len();
        let store = MemoryTable::builder("obs", n)
            .scalar_column(
                "scan",
                DataType::UInt8,
                scan.into_iter().map(StoredValue::UInt8).collect(),
            )
            .scalar_column(
                "id",
                DataType::Int32,
                (0..n as i32).map(StoredValue::Int32).collect(),
            )
            .build()
            .unwrap();
        Table::temporary(Arc::new(store))
    }

    fn sizes(iter: TableIterator) -> Vec<usize> {
        iter.map(|g| g.unwrap().len()).collect()
    }

    #[test]
    fn test_parse_order_and_algorithm() {
        assert_eq!("asc".parse::<SortOrder>().unwrap(), SortOrder::Ascending);
        assert_eq!("Descending".parse::<SortOrder>().unwrap(), SortOrder::Descending);
        assert!("x".parse::<SortOrder>().is_err());
        assert_eq!("quick".parse::<SortAlgorithm>().unwrap(), SortAlgorithm::QuickSort);
        assert_eq!("INSERT".parse::<SortAlgorithm>().unwrap(), SortAlgorithm::InsertionSort);
        assert_eq!("nosort".parse::<SortAlgorithm>().unwrap(), SortAlgorithm::NoSort);
        assert_eq!("heap".parse::<SortAlgorithm>().unwrap(), SortAlgorithm::HeapSort);
        assert_eq!("whatever".parse::<SortAlgorithm>().unwrap(), SortAlgorithm::HeapSort);
    }

    #[test]
    fn test_groups_by_scan() {
        let t = table(vec![1, 1, 2, 2, 2, 3]);
        let mut iter =
            TableIterator::new(&t, &["scan"], SortOrder::Ascending, SortAlgorithm::HeapSort)
                .unwrap();
        let first = iter.next().unwrap().unwrap();
        assert_eq!(first.keys(), &[Scalar::double(1.0)]);
        assert_eq!(first.rows(), &[0, 1]);
        assert_eq!(first.table().nrow(), 2);
        assert_eq!(sizes(iter), vec![3, 1]);
    }

    #[test]
    fn test_exhaustion_is_sticky_and_reset_restarts() {
        let t = table(vec![2, 1, 2]);
        let mut iter =
            TableIterator::new(&t, &["scan"], SortOrder::Descending, SortAlgorithm::QuickSort)
                .unwrap();
        let first = iter.next().unwrap().unwrap();
        assert_eq!(first.keys(), &[Scalar::double(2.0)]);
        assert_eq!(first.rows(), &[0, 2]);
        assert!(iter.next().is_some());
        assert!(iter.next().is_none());
        assert!(iter.next().is_none());
        iter.reset();
        assert_eq!(iter.next().unwrap().unwrap().rows(), &[0, 2]);
    }

    #[test]
    fn test_no_sort_keeps_natural_runs() {
        let t = table(vec![1, 2, 1]);
        let iter =
            TableIterator::new(&t, &["scan"], SortOrder::Ascending, SortAlgorithm::NoSort)
                .unwrap();
        assert_eq!(sizes(iter), vec![1, 1, 1]);
    }

    #[test]
    fn test_group_view_reads_parent_rows() {
        let t = table(vec![5, 4, 5]);
        let mut iter =
            TableIterator::new(&t, &["scan"], SortOrder::Ascending, SortAlgorithm::QuickSort)
                .unwrap();
        let _four = iter.next().unwrap().unwrap();
        let five = iter.next().unwrap().unwrap();
        let ids = five.table().col("id").unwrap();
        assert_eq!(ids.evaluate_scalar(1).unwrap(), Scalar::double(2.0));
    }

    #[test]
    fn test_keys_must_be_scalar_columns() {
        let t = table(vec![1]);
        assert!(TableIterator::new(&t, &[], SortOrder::Ascending, SortAlgorithm::HeapSort)
            .is_err());
        let err = TableIterator::new(&t, &["nope"], SortOrder::Ascending, SortAlgorithm::HeapSort)
            .unwrap_err();
        assert!(err.is_construction_error());
    }

    proptest! {
        #[test]
        fn prop_groups_partition_rows(scan in prop::collection::vec(0u8..6, 0..60)) {
            let t = table(scan.clone());
            let mut results: Vec<Vec<Vec<usize>>> = Vec::new();
            for algorithm in [
                SortAlgorithm::QuickSort,
                SortAlgorithm::InsertionSort,
                SortAlgorithm::HeapSort,
            ] {
                let iter = TableIterator::new(&t, &["scan"], SortOrder::Ascending, algorithm)
                    .unwrap();
                let groups: Vec<TableGroup> = iter.map(|g| g.unwrap()).collect();

                let mut seen = vec![false; scan.len()];
                for group in &groups {
                    prop_assert!(!group.is_empty());
                    for &row in group.rows() {
                        prop_assert!(!seen[row]);
                        seen[row] = true;
                        prop_assert_eq!(Scalar::double(f64::from(scan[row])), group.keys()[0].clone());
                    }
                }
                prop_assert!(seen.iter().all(|&s| s));
                for pair in groups.windows(2) {
                    prop_assert_eq!(
                        pair[0].keys()[0].sort_cmp(&pair[1].keys()[0]),
                        Ordering::Less
                    );
                }

                results.push(groups.iter().map(|g| g.rows().to_vec()).collect());
            }
            // every algorithm yields the same groups
            prop_assert!(results.windows(2).all(|w| w[0] == w[1]));
        }
    }
}
