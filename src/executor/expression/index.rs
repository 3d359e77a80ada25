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

//! Array index
//!
//! An [`IndexNode`] holds per axis an optional start, end and increment
//! expression. Values are rounded to the nearest integer and the index
//! origin is subtracted from start and end. Rules per axis:
//!
//! - no start selects from position 0
//! - no end runs to the end of the source, or stops at the start when a
//!   start is given
//! - a negative end runs to the end of the source
//! - no increment means 1
//!
//! Constant parts are converted and validated once when the node is built.
//! Row-varying parts are evaluated for each row and reported with the row.

use std::borrow::Cow;
use std::fmt;

use crate::core::{Constancy, Error, Result, Scalar, ShapeClass, SliceEnd, Slicer, ValueType};
use crate::storage::IndexOrigin;

use super::{ConstantNode, ExprNode, NodeRef};

/// Start, end and increment of one axis
#[derive(Debug, Clone, Default)]
pub struct IndexAxis {
    start: Option<NodeRef>,
    end: Option<NodeRef>,
    increment: Option<NodeRef>,
}

impl IndexAxis {
    pub fn new(start: Option<NodeRef>, end: Option<NodeRef>, increment: Option<NodeRef>) -> Self {
        Self {
            start,
            end,
            increment,
        }
    }

    /// Single position
    pub fn at(start: NodeRef) -> Self {
        Self::new(Some(start), None, None)
    }

    /// Inclusive range; open sides default to the array bounds
    pub fn range(start: Option<NodeRef>, end: Option<NodeRef>) -> Self {
        Self::new(start, end, None)
    }

    /// Whole axis
    pub fn full() -> Self {
        Self::default()
    }

    /// Constant single position
    pub fn value(position: f64) -> Self {
        Self::at(ConstantNode::node(Scalar::double(position)))
    }

    /// Constant inclusive range
    pub fn span(start: f64, end: f64) -> Self {
        Self::range(
            Some(ConstantNode::node(Scalar::double(start))),
            Some(ConstantNode::node(Scalar::double(end))),
        )
    }

    pub fn with_increment(mut self, increment: NodeRef) -> Self {
        self.increment = Some(increment);
        self
    }

    /// Only a start, so the axis selects one element
    pub fn is_single(&self) -> bool {
        self.start.is_some() && self.end.is_none() && self.increment.is_none()
    }

    fn parts(&self) -> impl Iterator<Item = (&'static str, &NodeRef)> {
        [
            ("start", self.start.as_ref()),
            ("end", self.end.as_ref()),
            ("increment", self.increment.as_ref()),
        ]
        .into_iter()
        .filter_map(|(what, node)| node.map(|n| (what, n)))
    }
}

impl fmt::Display for IndexAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_single() {
            if let Some(start) = &self.start {
                return write!(f, "{}", start);
            }
        }
        if let Some(start) = &self.start {
            write!(f, "{}", start)?;
        }
        f.write_str(":")?;
        if let Some(end) = &self.end {
            write!(f, "{}", end)?;
        }
        if let Some(increment) = &self.increment {
            write!(f, ":{}", increment)?;
        }
        Ok(())
    }
}

/// Index value after conversion
#[derive(Debug, Clone)]
enum Bound {
    Fixed(usize),
    Varying(NodeRef),
}

#[derive(Debug, Clone)]
enum EndBound {
    Fixed(usize),
    MimicSource,
    SameAsStart,
    Varying(NodeRef),
}

#[derive(Debug, Clone)]
struct AxisBounds {
    start: Bound,
    end: EndBound,
    increment: Bound,
}

/// Multi-axis index applied to an array
#[derive(Debug, Clone)]
pub struct IndexNode {
    axes: Vec<IndexAxis>,
    bounds: Vec<AxisBounds>,
    origin: i64,
    single: bool,
    constancy: Constancy,
    /// Slicer of a fully constant index
    fixed: Option<Slicer>,
}

impl IndexNode {
    pub fn new(axes: Vec<IndexAxis>, origin: IndexOrigin) -> Result<Self> {
        if axes.is_empty() {
            return Err(Error::invalid_index("index needs at least one axis"));
        }
        for (axis, index) in axes.iter().enumerate() {
            for (what, node) in index.parts() {
                if node.value_type() != ValueType::Double
                    || node.shape_class() != ShapeClass::Scalar
                {
                    return Err(Error::invalid_index(format!(
                        "{} on axis {} must be a real scalar, got {} {}",
                        what,
                        axis,
                        node.value_type(),
                        node.shape_class()
                    )));
                }
            }
        }

        let origin = origin.offset();
        let bounds = axes
            .iter()
            .map(|index| convert_constants(index, origin))
            .collect::<Result<Vec<_>>>()?;
        let constancy = Constancy::all(
            axes.iter()
                .flat_map(|index| index.parts().map(|(_, n)| n.constancy())),
        );
        let single = axes.iter().all(IndexAxis::is_single);

        let mut node = Self {
            axes,
            bounds,
            origin,
            single,
            constancy,
            fixed: None,
        };
        if constancy.is_constant() {
            node.fixed = Some(node.build_slicer(0)?);
        }
        Ok(node)
    }

    pub fn ndim(&self) -> usize {
        self.axes.len()
    }

    pub fn axes(&self) -> &[IndexAxis] {
        &self.axes
    }

    /// True if every axis has a start and nothing else
    pub fn is_single(&self) -> bool {
        self.single
    }

    pub fn constancy(&self) -> Constancy {
        self.constancy
    }

    pub fn is_constant(&self) -> bool {
        self.constancy.is_constant()
    }

    /// Slicer of a constant index
    pub fn fixed_slicer(&self) -> Option<&Slicer> {
        self.fixed.as_ref()
    }

    /// Slicer for a row; the constant slicer is shared by all rows
    pub fn slicer(&self, row: usize) -> Result<Cow<'_, Slicer>> {
        match &self.fixed {
            Some(slicer) => Ok(Cow::Borrowed(slicer)),
            None => self.build_slicer(row).map(Cow::Owned),
        }
    }

    /// Validate against what is statically known of the indexed array
    pub fn check_against(&self, array: &dyn ExprNode) -> Result<()> {
        if let Some(ndim) = array.ndim() {
            if ndim != self.ndim() {
                return Err(Error::DimensionMismatch {
                    expected: ndim,
                    got: self.ndim(),
                });
            }
        }
        let Some(shape) = array.fixed_shape() else {
            return Ok(());
        };
        for (axis, (bounds, &length)) in self.bounds.iter().zip(shape.iter()).enumerate() {
            if let Bound::Fixed(start) = bounds.start {
                if start >= length {
                    return Err(Error::invalid_index(format!(
                        "index value {} exceeds array shape {} on axis {}",
                        start as i64 + self.origin,
                        length,
                        axis
                    )));
                }
            }
            if let EndBound::Fixed(end) = bounds.end {
                if end >= length {
                    return Err(Error::invalid_index(format!(
                        "index end value {} exceeds array shape {} on axis {}",
                        end as i64 + self.origin,
                        length,
                        axis
                    )));
                }
            }
        }
        Ok(())
    }

    fn build_slicer(&self, row: usize) -> Result<Slicer> {
        let n = self.ndim();
        let mut starts = Vec::with_capacity(n);
        let mut ends = Vec::with_capacity(n);
        let mut strides = Vec::with_capacity(n);
        for (axis, bounds) in self.bounds.iter().enumerate() {
            let start = match &bounds.start {
                Bound::Fixed(v) => *v,
                Bound::Varying(node) => {
                    let value = rounded(&**node, row)?;
                    position(value - self.origin).ok_or_else(|| Error::InvalidRowIndex {
                        row,
                        axis,
                        what: "start".to_string(),
                        value,
                    })?
                }
            };
            let end = match &bounds.end {
                EndBound::Fixed(v) => SliceEnd::At(*v),
                EndBound::MimicSource => SliceEnd::MimicSource,
                EndBound::SameAsStart => SliceEnd::At(start),
                EndBound::Varying(node) => {
                    if raw(&**node, row)? < 0.0 {
                        SliceEnd::MimicSource
                    } else {
                        let value = rounded(&**node, row)?;
                        let end = position(value - self.origin).ok_or_else(|| {
                            Error::InvalidRowIndex {
                                row,
                                axis,
                                what: "end".to_string(),
                                value,
                            }
                        })?;
                        SliceEnd::At(end)
                    }
                }
            };
            let stride = match &bounds.increment {
                Bound::Fixed(v) => *v,
                Bound::Varying(node) => {
                    let value = rounded(&**node, row)?;
                    stride(value).ok_or_else(|| Error::InvalidRowIndex {
                        row,
                        axis,
                        what: "increment".to_string(),
                        value,
                    })?
                }
            };
            starts.push(start);
            ends.push(end);
            strides.push(stride);
        }
        Slicer::new(starts, ends, strides)
    }
}

impl fmt::Display for IndexNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, axis) in self.axes.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", axis)?;
        }
        f.write_str("]")
    }
}

/// Convert and validate the constant parts of an axis
fn convert_constants(index: &IndexAxis, origin: i64) -> Result<AxisBounds> {
    let start = match &index.start {
        None => Bound::Fixed(0),
        Some(node) if node.is_constant() => {
            let value = rounded(&**node, 0)?;
            let pos = position(value - origin).ok_or_else(|| {
                Error::invalid_index(format!("index value {} before array origin", value))
            })?;
            Bound::Fixed(pos)
        }
        Some(node) => Bound::Varying(node.clone()),
    };

    let end = match &index.end {
        None if index.start.is_some() => EndBound::SameAsStart,
        None => EndBound::MimicSource,
        Some(node) if node.is_constant() => {
            if raw(&**node, 0)? < 0.0 {
                EndBound::MimicSource
            } else {
                let value = rounded(&**node, 0)?;
                let pos = position(value - origin).ok_or_else(|| {
                    Error::invalid_index(format!("index end value {} before array origin", value))
                })?;
                EndBound::Fixed(pos)
            }
        }
        Some(node) => EndBound::Varying(node.clone()),
    };

    if let (Bound::Fixed(s), EndBound::Fixed(e)) = (&start, &end) {
        if e < s {
            return Err(Error::invalid_index(format!(
                "index end {} before start {}",
                *e as i64 + origin,
                *s as i64 + origin
            )));
        }
    }

    let increment = match &index.increment {
        None => Bound::Fixed(1),
        Some(node) if node.is_constant() => {
            let value = rounded(&**node, 0)?;
            Bound::Fixed(stride(value).ok_or_else(|| {
                Error::invalid_index(format!("index increment {} must be positive", value))
            })?)
        }
        Some(node) => Bound::Varying(node.clone()),
    };

    Ok(AxisBounds {
        start,
        end,
        increment,
    })
}

fn raw(node: &dyn ExprNode, row: usize) -> Result<f64> {
    let value = node.get_scalar(row)?;
    value
        .as_double()
        .ok_or_else(|| Error::internal(format!("index value {} is not a number", value)))
}

/// Round half up, truncating toward zero like an integer cast
fn rounded(node: &dyn ExprNode, row: usize) -> Result<i64> {
    Ok((raw(node, row)? + 0.5) as i64)
}

fn position(value: i64) -> Option<usize> {
    usize::try_from(value).ok()
}

fn stride(value: i64) -> Option<usize> {
    usize::try_from(value).ok().filter(|&s| s > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ArrayValue, NdArray};
    use std::sync::Arc;

    /// Scalar equal to a function of the row number
    #[derive(Debug)]
    struct PerRow(fn(usize) -> f64);

    impl fmt::Display for PerRow {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("rownr()")
        }
    }

    impl ExprNode for PerRow {
        fn value_type(&self) -> ValueType {
            ValueType::Double
        }
        fn shape_class(&self) -> ShapeClass {
            ShapeClass::Scalar
        }
        fn constancy(&self) -> Constancy {
            Constancy::Variable
        }
        fn get_scalar(&self, row: usize) -> Result<Scalar> {
            Ok(Scalar::double((self.0)(row)))
        }
    }

    fn per_row(f: fn(usize) -> f64) -> NodeRef {
        Arc::new(PerRow(f))
    }

    fn num(v: f64) -> NodeRef {
        ConstantNode::node(Scalar::double(v))
    }

    #[test]
    fn test_start_only_is_single() {
        let index = IndexNode::new(vec![IndexAxis::value(2.0)], IndexOrigin::Zero).unwrap();
        assert!(index.is_single());
        assert!(index.is_constant());
        let slicer = index.slicer(0).unwrap();
        assert_eq!(slicer.start(), &[2]);
        assert_eq!(slicer.end(), &[SliceEnd::At(2)]);
        assert_eq!(index.to_string(), "[2]");
    }

    #[test]
    fn test_end_or_increment_breaks_single() {
        let with_end = IndexNode::new(
            vec![IndexAxis::value(1.0), IndexAxis::span(0.0, 0.0)],
            IndexOrigin::Zero,
        )
        .unwrap();
        assert!(!with_end.is_single());

        let with_incr = IndexNode::new(
            vec![IndexAxis::value(1.0).with_increment(num(2.0))],
            IndexOrigin::Zero,
        )
        .unwrap();
        assert!(!with_incr.is_single());
        // the missing end takes the start
        assert_eq!(with_incr.slicer(0).unwrap().end(), &[SliceEnd::At(1)]);
        assert_eq!(with_incr.to_string(), "[1::2]");
    }

    #[test]
    fn test_defaults_and_origin() {
        let index = IndexNode::new(
            vec![IndexAxis::full(), IndexAxis::span(1.0, 3.0)],
            IndexOrigin::One,
        )
        .unwrap();
        let slicer = index.slicer(0).unwrap();
        assert_eq!(slicer.start(), &[0, 0]);
        assert_eq!(slicer.end(), &[SliceEnd::MimicSource, SliceEnd::At(2)]);
        assert_eq!(slicer.stride(), &[1, 1]);
        assert_eq!(index.to_string(), "[:,1:3]");
    }

    #[test]
    fn test_rounding() {
        let index = IndexNode::new(vec![IndexAxis::span(0.6, 2.4)], IndexOrigin::Zero).unwrap();
        let slicer = index.slicer(0).unwrap();
        assert_eq!(slicer.start(), &[1]);
        assert_eq!(slicer.end(), &[SliceEnd::At(2)]);
    }

    #[test]
    fn test_negative_end_mimics_source() {
        let constant = IndexNode::new(vec![IndexAxis::span(1.0, -1.0)], IndexOrigin::Zero).unwrap();
        assert_eq!(constant.slicer(0).unwrap().end(), &[SliceEnd::MimicSource]);

        let varying = IndexNode::new(
            vec![
                IndexAxis::range(Some(num(1.0)), Some(per_row(|r| r as f64 - 1.0))),
                IndexAxis::span(0.0, 1.0),
            ],
            IndexOrigin::Zero,
        )
        .unwrap();
        assert!(!varying.is_constant());
        let row0 = varying.slicer(0).unwrap();
        assert_eq!(row0.end(), &[SliceEnd::MimicSource, SliceEnd::At(1)]);
        let row3 = varying.slicer(3).unwrap();
        assert_eq!(row3.end(), &[SliceEnd::At(2), SliceEnd::At(1)]);
    }

    #[test]
    fn test_invalid_constants_fail_at_construction() {
        let err = IndexNode::new(vec![IndexAxis::value(-1.0)], IndexOrigin::Zero).unwrap_err();
        assert!(err.is_construction_error());
        let err = IndexNode::new(vec![IndexAxis::value(0.0)], IndexOrigin::One).unwrap_err();
        assert!(matches!(err, Error::InvalidIndex(_)));
        assert!(IndexNode::new(
            vec![IndexAxis::full().with_increment(num(0.0))],
            IndexOrigin::Zero
        )
        .is_err());
        assert!(IndexNode::new(vec![IndexAxis::span(3.0, 1.0)], IndexOrigin::Zero).is_err());
        let flag = ConstantNode::node(Scalar::Bool(true));
        assert!(IndexNode::new(vec![IndexAxis::at(flag)], IndexOrigin::Zero).is_err());
        assert!(IndexNode::new(Vec::new(), IndexOrigin::Zero).is_err());
    }

    #[test]
    fn test_invalid_row_values_name_the_row() {
        let index = IndexNode::new(
            vec![IndexAxis::at(per_row(|r| 2.0 - r as f64))],
            IndexOrigin::Zero,
        )
        .unwrap();
        assert_eq!(index.slicer(2).unwrap().start(), &[0]);
        let err = index.slicer(5).unwrap_err();
        assert_eq!(
            err,
            Error::InvalidRowIndex {
                row: 5,
                axis: 0,
                what: "start".to_string(),
                value: -2
            }
        );
        assert!(err.is_evaluation_error());

        let index = IndexNode::new(
            vec![IndexAxis::full().with_increment(per_row(|r| r as f64))],
            IndexOrigin::Zero,
        )
        .unwrap();
        assert!(index.slicer(1).is_ok());
        assert!(matches!(
            index.slicer(0),
            Err(Error::InvalidRowIndex { row: 0, .. })
        ));
    }

    #[test]
    fn test_check_against_array() {
        let array = ConstantNode::new(ArrayValue::Double(
            NdArray::new(&[3, 4], vec![0.0; 12]).unwrap(),
        ));
        let ok = IndexNode::new(
            vec![IndexAxis::value(2.0), IndexAxis::span(0.0, 3.0)],
            IndexOrigin::Zero,
        )
        .unwrap();
        assert!(ok.check_against(&array).is_ok());

        let one_axis = IndexNode::new(vec![IndexAxis::value(0.0)], IndexOrigin::Zero).unwrap();
        assert_eq!(
            one_axis.check_against(&array).unwrap_err(),
            Error::DimensionMismatch {
                expected: 2,
                got: 1
            }
        );

        let past_end = IndexNode::new(
            vec![IndexAxis::value(0.0), IndexAxis::span(0.0, 4.0)],
            IndexOrigin::Zero,
        )
        .unwrap();
        assert!(matches!(
            past_end.check_against(&array),
            Err(Error::InvalidIndex(_))
        ));
    }
}
