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

//! Expression evaluation and table iteration
//!
//! - [`expression`] - Typed expression trees evaluated row by row
//! - [`iter`] - Grouped iteration over sorted key columns

pub mod expression;
pub mod iter;

pub use expression::{
    evaluate_node, ArrayPartNode, BinaryNode, BinaryOp, ColumnNode, ConstantNode, ExprNode,
    IndexAxis, IndexNode, NodeRef, TableExpr, UnaryNode, UnaryOp,
};
pub use iter::{SortAlgorithm, SortOrder, TableGroup, TableIterator};
