//! Binary search tree sort over records
//!
//! Records are inserted one at a time into an unbalanced tree stored in an
//! arena and read back with an in-order walk. A record goes to the left of a
//! node only when its key strictly precedes the node's key under the active
//! direction; everything else, equal keys included, goes right. Duplicates
//! therefore come out in insertion order.
//!
//! There is no rebalancing. Already-sorted or reverse-sorted input degenerates
//! into a list and costs O(n^2) comparisons. Insertion and traversal are both
//! iterative, so deep trees cost time but never stack.

use crate::config::SortDirection;
use crate::core_sort::validate_key;
use crate::error::SortResult;
use crate::record::Record;
use std::cmp::Ordering;

type NodeId = usize;

#[derive(Debug)]
struct Node {
    record: Record,
    left: Option<NodeId>,
    right: Option<NodeId>,
}

/// Unbalanced binary search tree keyed on one record field
#[derive(Debug)]
pub struct RecordTree {
    nodes: Vec<Node>,
    root: Option<NodeId>,
    key: usize,
    direction: SortDirection,
}

impl RecordTree {
    pub fn new(key: usize, direction: SortDirection) -> Self {
        Self::with_capacity(key, direction, 0)
    }

    pub fn with_capacity(key: usize, direction: SortDirection, capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            root: None,
            key,
            direction,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    fn goes_left(&self, record: &Record, node: &Node) -> bool {
        let ordering = record.key(self.key).cmp(node.record.key(self.key));
        self.direction.apply(ordering) == Ordering::Less
    }

    pub fn insert(&mut self, record: Record) {
        let id = self.nodes.len();

        let mut current = match self.root {
            None => {
                self.nodes.push(Node {
                    record,
                    left: None,
                    right: None,
                });
                self.root = Some(id);
                return;
            }
            Some(root) => root,
        };

        loop {
            let left = self.goes_left(&record, &self.nodes[current]);
            let node = &mut self.nodes[current];
            let slot = if left { &mut node.left } else { &mut node.right };
            match *slot {
                Some(child) => current = child,
                None => {
                    *slot = Some(id);
                    break;
                }
            }
        }

        self.nodes.push(Node {
            record,
            left: None,
            right: None,
        });
    }

    /// Arena indices in left, self, right order
    fn in_order(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = Vec::new();
        let mut current = self.root;

        while current.is_some() || !stack.is_empty() {
            while let Some(id) = current {
                stack.push(id);
                current = self.nodes[id].left;
            }
            if let Some(id) = stack.pop() {
                order.push(id);
                current = self.nodes[id].right;
            }
        }

        order
    }

    /// Height of the longest root-to-leaf path
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack: Vec<(NodeId, usize)> = self.root.map(|id| (id, 1)).into_iter().collect();
        while let Some((id, level)) = stack.pop() {
            deepest = deepest.max(level);
            let node = &self.nodes[id];
            stack.extend(node.left.map(|child| (child, level + 1)));
            stack.extend(node.right.map(|child| (child, level + 1)));
        }
        deepest
    }

    /// Consume the tree and return its records in sorted order
    pub fn into_sorted(self) -> Vec<Record> {
        let order = self.in_order();
        let mut slots: Vec<Option<Record>> =
            self.nodes.into_iter().map(|node| Some(node.record)).collect();
        order.into_iter().filter_map(|id| slots[id].take()).collect()
    }
}

impl Extend<Record> for RecordTree {
    fn extend<T: IntoIterator<Item = Record>>(&mut self, iter: T) {
        for record in iter {
            self.insert(record);
        }
    }
}

/// Reorder `records` in place by tree insertion and in-order traversal.
///
/// `records` is left untouched when the key is out of range for any record.
pub fn tree_sort(
    records: &mut Vec<Record>,
    key: usize,
    direction: SortDirection,
) -> SortResult<()> {
    validate_key(records, key)?;
    let mut tree = RecordTree::with_capacity(key, direction, records.len());
    tree.extend(records.drain(..));
    records.extend(tree.into_sorted());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(lines: &[&str]) -> Vec<Record> {
        lines.iter().map(|l| Record::parse(l, ',')).collect()
    }

    fn lines(records: &[Record]) -> Vec<String> {
        records.iter().map(|r| r.join(',')).collect()
    }

    #[test]
    fn test_sorts_ascending() -> SortResult<()> {
        let mut data = records(&["b,2", "a,1", "c,3"]);
        tree_sort(&mut data, 0, SortDirection::Ascending)?;
        assert_eq!(lines(&data), vec!["a,1", "b,2", "c,3"]);
        Ok(())
    }

    #[test]
    fn test_sorts_descending_on_second_field() -> SortResult<()> {
        let mut data = records(&["x,1", "y,3", "z,2"]);
        tree_sort(&mut data, 1, SortDirection::Descending)?;
        assert_eq!(lines(&data), vec!["y,3", "z,2", "x,1"]);
        Ok(())
    }

    #[test]
    fn test_duplicates_keep_insertion_order() -> SortResult<()> {
        let mut data = records(&["a,1", "a,2"]);
        tree_sort(&mut data, 0, SortDirection::Ascending)?;
        assert_eq!(lines(&data), vec!["a,1", "a,2"]);

        let mut data = records(&["b,1", "a,1", "b,2", "c,0", "b,3"]);
        tree_sort(&mut data, 0, SortDirection::Descending)?;
        assert_eq!(lines(&data), vec!["c,0", "b,1", "b,2", "b,3", "a,1"]);
        Ok(())
    }

    #[test]
    fn test_equal_key_goes_right() {
        let mut tree = RecordTree::new(0, SortDirection::Ascending);
        tree.insert(Record::parse("m", ','));
        tree.insert(Record::parse("m", ','));
        tree.insert(Record::parse("m", ','));
        assert_eq!(tree.depth(), 3);

        let root = tree.root.expect("tree has a root");
        assert!(tree.nodes[root].left.is_none());
        assert_eq!(tree.nodes[root].right, Some(1));
    }

    #[test]
    fn test_byte_order_comparison() -> SortResult<()> {
        let mut data = records(&["b", "B", "a", "10", "9", "é"]);
        tree_sort(&mut data, 0, SortDirection::Ascending)?;
        assert_eq!(lines(&data), vec!["10", "9", "B", "a", "b", "é"]);
        Ok(())
    }

    #[test]
    fn test_sorted_input_degenerates_without_overflow() -> SortResult<()> {
        let count = 5_000;
        let mut data: Vec<Record> = (0..count)
            .map(|i| Record::new(vec![format!("{i:06}")]))
            .collect();

        let mut tree = RecordTree::with_capacity(0, SortDirection::Ascending, count);
        tree.extend(data.iter().cloned());
        assert_eq!(tree.depth(), count);
        assert_eq!(tree.len(), count);

        tree_sort(&mut data, 0, SortDirection::Descending)?;
        assert_eq!(data.first().and_then(|r| r.field(0)), Some("004999"));
        assert_eq!(data.last().and_then(|r| r.field(0)), Some("000000"));
        Ok(())
    }

    #[test]
    fn test_empty_and_single() -> SortResult<()> {
        let mut empty: Vec<Record> = Vec::new();
        tree_sort(&mut empty, 0, SortDirection::Ascending)?;
        assert!(empty.is_empty());
        assert!(RecordTree::new(0, SortDirection::Ascending).is_empty());

        let mut single = records(&["only,1"]);
        tree_sort(&mut single, 1, SortDirection::Descending)?;
        assert_eq!(lines(&single), vec!["only,1"]);
        Ok(())
    }
}
