//! The grouping engine: an ordered binary tree of composite keys, each node
//! carrying one accumulator per requested operation.
//!
//! A tree rather than a hash map because traversal must come out in key
//! order (reversed on request) without a separate sort pass. Ownership is
//! strictly parent-owns-children; reversal inverts the comparison at insert
//! so the traversal itself never changes.

use std::cmp::Ordering;
use std::fmt;

use crate::aggregate::{Aggregate, AggregateError, Op};
use crate::select::{self, SelectError, Selection};

/// Errors from building or feeding a group tree.
#[derive(Debug, Clone, PartialEq)]
pub enum GroupError {
    /// Operation list with an odd number of arguments
    UnpairedOperation,
    /// Operation name outside min/max/sum/count/mean
    UnknownOp(String),
    /// Key or operation selection failure
    Select(SelectError),
    /// Accumulator failure (width or number parse)
    Aggregate(AggregateError),
}

impl fmt::Display for GroupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupError::UnpairedOperation => {
                write!(f, "operations come in pairs: <op> <selection>")
            }
            GroupError::UnknownOp(name) => write!(f, "unknown operation '{}'", name),
            GroupError::Select(e) => write!(f, "{}", e),
            GroupError::Aggregate(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for GroupError {}

impl From<SelectError> for GroupError {
    fn from(e: SelectError) -> Self {
        GroupError::Select(e)
    }
}

impl From<AggregateError> for GroupError {
    fn from(e: AggregateError) -> Self {
        GroupError::Aggregate(e)
    }
}

/// Parse the trailing `op selection op selection …` argument vector.
pub fn parse_operations(args: &[String]) -> Result<Vec<(Op, Vec<Selection>)>, GroupError> {
    if args.len() % 2 != 0 {
        return Err(GroupError::UnpairedOperation);
    }
    let mut operations = Vec::with_capacity(args.len() / 2);
    for pair in args.chunks(2) {
        let op = Op::from_name(&pair[0]).ok_or_else(|| GroupError::UnknownOp(pair[0].clone()))?;
        let selection = select::parse(&pair[1])?;
        operations.push((op, selection));
    }
    Ok(operations)
}

/// One group: its composite key and the accumulator per operation.
pub struct GroupRow {
    pub keys: Vec<String>,
    aggregates: Vec<Box<dyn Aggregate>>,
}

impl GroupRow {
    fn new(keys: Vec<String>, operations: &[(Op, Vec<Selection>)]) -> Self {
        GroupRow {
            keys,
            aggregates: operations.iter().map(|(op, _)| op.instantiate()).collect(),
        }
    }

    fn fold(
        &mut self,
        row: &[String],
        operations: &[(Op, Vec<Selection>)],
    ) -> Result<(), GroupError> {
        for (aggregate, (_, selection)) in self.aggregates.iter_mut().zip(operations) {
            let projected = select::select_all(selection, row)?;
            aggregate.update(&projected)?;
        }
        Ok(())
    }

    /// The accumulated vectors, one per operation.
    pub fn results(&self) -> Vec<Vec<f64>> {
        self.aggregates.iter().map(|a| a.result()).collect()
    }
}

struct Node {
    row: GroupRow,
    left: Option<Box<Node>>,
    right: Option<Box<Node>>,
}

pub struct GroupTree {
    root: Option<Box<Node>>,
    keys: Vec<Selection>,
    operations: Vec<(Op, Vec<Selection>)>,
    reverse: bool,
}

impl GroupTree {
    pub fn new(
        key_selection: &str,
        operation_args: &[String],
        reverse: bool,
    ) -> Result<Self, GroupError> {
        Ok(GroupTree {
            root: None,
            keys: select::parse(key_selection)?,
            operations: parse_operations(operation_args)?,
            reverse,
        })
    }

    /// Fold one row into its group, creating the group on first sight.
    /// A row whose composite key resolves empty is dropped.
    pub fn upsert(&mut self, row: &[String]) -> Result<(), GroupError> {
        let keys = select::select_all(&self.keys, row)?;
        if keys.is_empty() {
            return Ok(());
        }
        insert(
            &mut self.root,
            keys,
            row,
            &self.operations,
            self.reverse,
        )
    }

    /// In-order walk over the groups.
    pub fn traverse<F: FnMut(&GroupRow)>(&self, visit: &mut F) {
        walk(&self.root, visit);
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }
}

fn insert(
    slot: &mut Option<Box<Node>>,
    keys: Vec<String>,
    row: &[String],
    operations: &[(Op, Vec<Selection>)],
    reverse: bool,
) -> Result<(), GroupError> {
    match slot {
        None => {
            let mut group = GroupRow::new(keys, operations);
            group.fold(row, operations)?;
            *slot = Some(Box::new(Node {
                row: group,
                left: None,
                right: None,
            }));
            Ok(())
        }
        Some(node) => match compare(&keys, &node.row.keys, reverse) {
            Ordering::Equal => node.row.fold(row, operations),
            Ordering::Less => insert(&mut node.left, keys, row, operations, reverse),
            Ordering::Greater => insert(&mut node.right, keys, row, operations, reverse),
        },
    }
}

fn walk<F: FnMut(&GroupRow)>(slot: &Option<Box<Node>>, visit: &mut F) {
    if let Some(node) = slot {
        walk(&node.left, visit);
        visit(&node.row);
        walk(&node.right, visit);
    }
}

// Component-wise lexicographic; the first unequal component decides.
fn compare(a: &[String], b: &[String], reverse: bool) -> Ordering {
    let order = a.cmp(b);
    if reverse {
        order.reverse()
    } else {
        order
    }
}
