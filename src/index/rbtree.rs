//! Arena-backed red-black tree
//!
//! `OrderedIndex<K, V>` is an ordered map over any `K: Ord`. Nodes live in
//! a contiguous `Vec` and refer to each other by integer id, so parent
//! back-links carry no ownership. An absent child is `None` and is treated
//! as black.
//!
//! # Invariants
//!
//! After every public operation:
//! - The root is black
//! - No red node has a red child
//! - Every path from a node to an absent child crosses the same number of
//!   black nodes
//! - In-order keys are strictly increasing
//!
//! The arena stays dense: a removed node's slot is filled by the last node
//! in the arena, so the node count is always `nodes.len()`.

use std::cmp::Ordering;
use std::fmt;

use super::errors::{IndexError, IndexResult};

/// Position of a node in the arena
type NodeId = usize;

/// Node color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Red,
    Black,
}

#[derive(Debug, Clone)]
struct Node<K, V> {
    key: K,
    value: V,
    color: Color,
    parent: Option<NodeId>,
    left: Option<NodeId>,
    right: Option<NodeId>,
}

/// Ordered map backed by a red-black tree.
#[derive(Clone)]
pub struct OrderedIndex<K, V> {
    nodes: Vec<Node<K, V>>,
    root: Option<NodeId>,
}

impl<K, V> Default for OrderedIndex<K, V> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            root: None,
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for OrderedIndex<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.in_order()).finish()
    }
}

impl<K, V> OrderedIndex<K, V> {
    /// Creates an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the index holds no entries
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Drops every entry
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
    }

    /// Entry with the smallest key
    pub fn first(&self) -> Option<NodeRef<'_, K, V>> {
        self.root.map(|root| self.node_ref(self.minimum(root)))
    }

    /// Iterates all entries in ascending key order.
    ///
    /// Each call starts a fresh traversal.
    pub fn in_order(&self) -> InOrder<'_, K, V> {
        InOrder { next: self.first() }
    }

    /// In-order successor of `node`
    pub fn successor<'a>(&'a self, node: NodeRef<'a, K, V>) -> Option<NodeRef<'a, K, V>> {
        self.successor_id(node.id).map(|id| self.node_ref(id))
    }

    fn node_ref(&self, id: NodeId) -> NodeRef<'_, K, V> {
        NodeRef { index: self, id }
    }

    fn color(&self, id: Option<NodeId>) -> Color {
        id.map_or(Color::Black, |id| self.nodes[id].color)
    }

    fn set_color(&mut self, id: Option<NodeId>, color: Color) {
        if let Some(id) = id {
            self.nodes[id].color = color;
        }
    }

    fn minimum(&self, mut id: NodeId) -> NodeId {
        while let Some(left) = self.nodes[id].left {
            id = left;
        }
        id
    }

    fn successor_id(&self, id: NodeId) -> Option<NodeId> {
        if let Some(right) = self.nodes[id].right {
            return Some(self.minimum(right));
        }

        let mut child = id;
        let mut parent = self.nodes[id].parent;
        while let Some(p) = parent {
            if self.nodes[p].left == Some(child) {
                return Some(p);
            }
            child = p;
            parent = self.nodes[p].parent;
        }
        None
    }

    /// Points `parent`'s link to `old` (or the root) at `new`
    fn replace_child(&mut self, parent: Option<NodeId>, old: NodeId, new: Option<NodeId>) {
        match parent {
            None => self.root = new,
            Some(p) => {
                if self.nodes[p].left == Some(old) {
                    self.nodes[p].left = new;
                } else {
                    self.nodes[p].right = new;
                }
            }
        }
    }

    fn rotate_left(&mut self, x: NodeId) {
        let Some(y) = self.nodes[x].right else {
            return;
        };

        let inner = self.nodes[y].left;
        self.nodes[x].right = inner;
        if let Some(inner) = inner {
            self.nodes[inner].parent = Some(x);
        }

        let parent = self.nodes[x].parent;
        self.nodes[y].parent = parent;
        self.replace_child(parent, x, Some(y));

        self.nodes[y].left = Some(x);
        self.nodes[x].parent = Some(y);
    }

    fn rotate_right(&mut self, x: NodeId) {
        let Some(y) = self.nodes[x].left else {
            return;
        };

        let inner = self.nodes[y].right;
        self.nodes[x].left = inner;
        if let Some(inner) = inner {
            self.nodes[inner].parent = Some(x);
        }

        let parent = self.nodes[x].parent;
        self.nodes[y].parent = parent;
        self.replace_child(parent, x, Some(y));

        self.nodes[y].right = Some(x);
        self.nodes[x].parent = Some(y);
    }

    fn insert_fixup(&mut self, mut z: NodeId) {
        while let Some(parent) = self.nodes[z].parent {
            if self.nodes[parent].color == Color::Black {
                break;
            }
            // A red parent is never the root, so the grandparent exists.
            let Some(grand) = self.nodes[parent].parent else {
                break;
            };

            if self.nodes[grand].left == Some(parent) {
                let uncle = self.nodes[grand].right;
                if self.color(uncle) == Color::Red {
                    self.nodes[parent].color = Color::Black;
                    self.set_color(uncle, Color::Black);
                    self.nodes[grand].color = Color::Red;
                    z = grand;
                    continue;
                }

                if self.nodes[parent].right == Some(z) {
                    z = parent;
                    self.rotate_left(z);
                }
                let Some(parent) = self.nodes[z].parent else {
                    break;
                };
                self.nodes[parent].color = Color::Black;
                self.nodes[grand].color = Color::Red;
                self.rotate_right(grand);
            } else {
                let uncle = self.nodes[grand].left;
                if self.color(uncle) == Color::Red {
                    self.nodes[parent].color = Color::Black;
                    self.set_color(uncle, Color::Black);
                    self.nodes[grand].color = Color::Red;
                    z = grand;
                    continue;
                }

                if self.nodes[parent].left == Some(z) {
                    z = parent;
                    self.rotate_right(z);
                }
                let Some(parent) = self.nodes[z].parent else {
                    break;
                };
                self.nodes[parent].color = Color::Black;
                self.nodes[grand].color = Color::Red;
                self.rotate_left(grand);
            }
        }

        self.set_color(self.root, Color::Black);
    }

    /// Restores black-height after a black node was unlinked.
    ///
    /// `x` is the node that took the removed node's place (possibly absent)
    /// and `parent` is its parent.
    fn delete_fixup(&mut self, mut x: Option<NodeId>, mut parent: Option<NodeId>) {
        while x != self.root && self.color(x) == Color::Black {
            let Some(p) = parent else {
                break;
            };

            if self.nodes[p].left == x {
                let Some(mut w) = self.nodes[p].right else {
                    break;
                };
                if self.nodes[w].color == Color::Red {
                    self.nodes[w].color = Color::Black;
                    self.nodes[p].color = Color::Red;
                    self.rotate_left(p);
                    let Some(next) = self.nodes[p].right else {
                        break;
                    };
                    w = next;
                }

                if self.color(self.nodes[w].left) == Color::Black
                    && self.color(self.nodes[w].right) == Color::Black
                {
                    self.nodes[w].color = Color::Red;
                    x = Some(p);
                    parent = self.nodes[p].parent;
                } else {
                    if self.color(self.nodes[w].right) == Color::Black {
                        self.set_color(self.nodes[w].left, Color::Black);
                        self.nodes[w].color = Color::Red;
                        self.rotate_right(w);
                        let Some(next) = self.nodes[p].right else {
                            break;
                        };
                        w = next;
                    }
                    self.nodes[w].color = self.nodes[p].color;
                    self.nodes[p].color = Color::Black;
                    self.set_color(self.nodes[w].right, Color::Black);
                    self.rotate_left(p);
                    x = self.root;
                    parent = None;
                }
            } else {
                let Some(mut w) = self.nodes[p].left else {
                    break;
                };
                if self.nodes[w].color == Color::Red {
                    self.nodes[w].color = Color::Black;
                    self.nodes[p].color = Color::Red;
                    self.rotate_right(p);
                    let Some(next) = self.nodes[p].left else {
                        break;
                    };
                    w = next;
                }

                if self.color(self.nodes[w].right) == Color::Black
                    && self.color(self.nodes[w].left) == Color::Black
                {
                    self.nodes[w].color = Color::Red;
                    x = Some(p);
                    parent = self.nodes[p].parent;
                } else {
                    if self.color(self.nodes[w].left) == Color::Black {
                        self.set_color(self.nodes[w].right, Color::Black);
                        self.nodes[w].color = Color::Red;
                        self.rotate_left(w);
                        let Some(next) = self.nodes[p].left else {
                            break;
                        };
                        w = next;
                    }
                    self.nodes[w].color = self.nodes[p].color;
                    self.nodes[p].color = Color::Black;
                    self.set_color(self.nodes[w].left, Color::Black);
                    self.rotate_right(p);
                    x = self.root;
                    parent = None;
                }
            }
        }

        self.set_color(x, Color::Black);
    }

    /// Exchanges the key/value payloads of two distinct nodes
    fn swap_payload(&mut self, a: NodeId, b: NodeId) {
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        let (head, tail) = self.nodes.split_at_mut(hi);
        let (first, second) = (&mut head[lo], &mut tail[0]);
        std::mem::swap(&mut first.key, &mut second.key);
        std::mem::swap(&mut first.value, &mut second.value);
    }

    /// Frees an already unlinked node, moving the last arena node into its slot.
    fn release(&mut self, id: NodeId) -> Node<K, V> {
        let last = self.nodes.len() - 1;
        if id != last {
            let moved = &self.nodes[last];
            let (parent, left, right) = (moved.parent, moved.left, moved.right);

            self.replace_child(parent, last, Some(id));
            if let Some(left) = left {
                self.nodes[left].parent = Some(id);
            }
            if let Some(right) = right {
                self.nodes[right].parent = Some(id);
            }
        }
        self.nodes.swap_remove(id)
    }
}

impl<K: Ord, V> OrderedIndex<K, V> {
    /// Inserts or replaces the value for `key`.
    ///
    /// Returns true if the key already existed. A replacement only swaps the
    /// value; the tree shape is untouched and no rebalancing happens.
    pub fn insert(&mut self, key: K, value: V) -> bool {
        let mut parent = None;
        let mut cursor = self.root;
        let mut went_left = false;

        while let Some(id) = cursor {
            parent = Some(id);
            match key.cmp(&self.nodes[id].key) {
                Ordering::Less => {
                    cursor = self.nodes[id].left;
                    went_left = true;
                }
                Ordering::Greater => {
                    cursor = self.nodes[id].right;
                    went_left = false;
                }
                Ordering::Equal => {
                    self.nodes[id].value = value;
                    return true;
                }
            }
        }

        let id = self.nodes.len();
        self.nodes.push(Node {
            key,
            value,
            color: Color::Red,
            parent,
            left: None,
            right: None,
        });

        match parent {
            None => self.root = Some(id),
            Some(p) if went_left => self.nodes[p].left = Some(id),
            Some(p) => self.nodes[p].right = Some(id),
        }

        self.insert_fixup(id);
        false
    }

    /// Removes `key`. Returns false if it was absent.
    pub fn delete(&mut self, key: &K) -> bool {
        self.remove(key).is_some()
    }

    /// Removes `key` and returns its value
    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.remove_entry(key).map(|(_, value)| value)
    }

    /// Removes `key` and returns the stored key and value
    pub fn remove_entry(&mut self, key: &K) -> Option<(K, V)> {
        let z = self.locate(key)?;

        // A node with two children trades payloads with its successor, which
        // has no left child, and the successor's node is unlinked instead.
        let target = match (self.nodes[z].left, self.nodes[z].right) {
            (Some(_), Some(right)) => {
                let successor = self.minimum(right);
                self.swap_payload(z, successor);
                successor
            }
            _ => z,
        };

        let child = self.nodes[target].left.or(self.nodes[target].right);
        let parent = self.nodes[target].parent;
        if let Some(child) = child {
            self.nodes[child].parent = parent;
        }
        self.replace_child(parent, target, child);

        if self.nodes[target].color == Color::Black {
            self.delete_fixup(child, parent);
        }

        let node = self.release(target);
        Some((node.key, node.value))
    }

    /// Exact lookup
    pub fn find(&self, key: &K) -> Option<&V> {
        self.locate(key).map(|id| &self.nodes[id].value)
    }

    /// Returns true if `key` is present
    pub fn contains_key(&self, key: &K) -> bool {
        self.locate(key).is_some()
    }

    /// Smallest entry whose key is greater than or equal to `key`
    pub fn lower_bound(&self, key: &K) -> Option<NodeRef<'_, K, V>> {
        let mut best = None;
        let mut cursor = self.root;

        while let Some(id) = cursor {
            if self.nodes[id].key >= *key {
                best = Some(id);
                cursor = self.nodes[id].left;
            } else {
                cursor = self.nodes[id].right;
            }
        }

        best.map(|id| self.node_ref(id))
    }

    /// Iterates entries with key >= `key` in ascending order
    pub fn range_from(&self, key: &K) -> InOrder<'_, K, V> {
        InOrder {
            next: self.lower_bound(key),
        }
    }

    fn locate(&self, key: &K) -> Option<NodeId> {
        let mut cursor = self.root;
        while let Some(id) = cursor {
            match key.cmp(&self.nodes[id].key) {
                Ordering::Less => cursor = self.nodes[id].left,
                Ordering::Greater => cursor = self.nodes[id].right,
                Ordering::Equal => return Some(id),
            }
        }
        None
    }

    /// Verifies every red-black and ordering invariant.
    ///
    /// Returns the black-height of the root (0 for an empty index).
    pub fn check_invariants(&self) -> IndexResult<usize> {
        if self.color(self.root) == Color::Red {
            return Err(IndexError::RedRoot);
        }

        let mut visited = 0;
        let mut previous = None;
        let black_height = self.check_subtree(self.root, None, &mut visited, &mut previous)?;

        if visited != self.nodes.len() {
            return Err(IndexError::LengthMismatch {
                tracked: self.nodes.len(),
                reachable: visited,
            });
        }

        Ok(black_height)
    }

    fn check_subtree(
        &self,
        node: Option<NodeId>,
        parent: Option<NodeId>,
        visited: &mut usize,
        previous: &mut Option<NodeId>,
    ) -> IndexResult<usize> {
        let Some(id) = node else {
            return Ok(0);
        };
        let current = &self.nodes[id];

        if current.parent != parent || *visited >= self.nodes.len() {
            return Err(IndexError::BrokenParentLink { position: *visited });
        }

        let left = self.check_subtree(current.left, Some(id), visited, previous)?;

        let position = *visited;
        if let Some(prev) = *previous {
            if self.nodes[prev].key >= current.key {
                return Err(IndexError::OrderViolation { position });
            }
        }
        *previous = Some(id);
        *visited += 1;

        if current.color == Color::Red
            && (self.color(current.left) == Color::Red || self.color(current.right) == Color::Red)
        {
            return Err(IndexError::DoubleRed { position });
        }

        let right = self.check_subtree(current.right, Some(id), visited, previous)?;
        if left != right {
            return Err(IndexError::BlackHeightMismatch {
                position,
                left,
                right,
            });
        }

        Ok(left + usize::from(current.color == Color::Black))
    }
}

/// Borrowed handle to one entry of an `OrderedIndex`.
///
/// Holding a `NodeRef` borrows the index, so the tree cannot change
/// underneath it.
pub struct NodeRef<'a, K, V> {
    index: &'a OrderedIndex<K, V>,
    id: NodeId,
}

impl<K, V> Clone for NodeRef<'_, K, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, V> Copy for NodeRef<'_, K, V> {}

impl<'a, K, V> NodeRef<'a, K, V> {
    pub fn key(&self) -> &'a K {
        &self.index.nodes[self.id].key
    }

    pub fn value(&self) -> &'a V {
        &self.index.nodes[self.id].value
    }

    pub fn color(&self) -> Color {
        self.index.nodes[self.id].color
    }

    /// Next entry in key order
    pub fn successor(&self) -> Option<NodeRef<'a, K, V>> {
        self.index.successor(*self)
    }
}

impl<K: fmt::Debug, V> fmt::Debug for NodeRef<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("key", self.key())
            .field("color", &self.color())
            .finish()
    }
}

/// Ascending iterator produced by `in_order` and `range_from`
pub struct InOrder<'a, K, V> {
    next: Option<NodeRef<'a, K, V>>,
}

impl<'a, K, V> Iterator for InOrder<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.successor();
        Some((current.key(), current.value()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(keys: &[i64]) -> OrderedIndex<i64, String> {
        let mut index = OrderedIndex::new();
        for &k in keys {
            index.insert(k, format!("v{}", k));
            index.check_invariants().unwrap();
        }
        index
    }

    fn keys(index: &OrderedIndex<i64, String>) -> Vec<i64> {
        index.in_order().map(|(k, _)| *k).collect()
    }

    #[test]
    fn test_empty_index() {
        let mut index: OrderedIndex<i64, ()> = OrderedIndex::new();
        assert!(index.is_empty());
        assert_eq!(index.len(), 0);
        assert!(index.find(&1).is_none());
        assert!(index.lower_bound(&1).is_none());
        assert!(index.first().is_none());
        assert!(!index.delete(&1));
        assert_eq!(index.check_invariants().unwrap(), 0);
    }

    #[test]
    fn test_insert_ascending_stays_balanced() {
        let all: Vec<i64> = (0..256).collect();
        let index = build(&all);

        assert_eq!(index.len(), 256);
        assert_eq!(keys(&index), all);
        // 256 nodes never need more than 2*log2(257) levels
        let black_height = index.check_invariants().unwrap();
        assert!(black_height >= 4 && black_height <= 9);
    }

    #[test]
    fn test_insert_existing_replaces_value() {
        let mut index = build(&[5, 3, 8]);
        let root_before = index.root;

        assert!(index.insert(3, "three".to_string()));
        assert_eq!(index.len(), 3);
        assert_eq!(index.root, root_before);
        assert_eq!(index.find(&3).map(String::as_str), Some("three"));
    }

    #[test]
    fn test_insert_returns_false_for_new_key() {
        let mut index = OrderedIndex::new();
        assert!(!index.insert(1, "a"));
        assert!(!index.insert(2, "b"));
        assert!(index.insert(1, "c"));
    }

    #[test]
    fn test_find() {
        let index = build(&[40, 20, 60, 10, 30, 50, 70]);
        assert_eq!(index.find(&30).map(String::as_str), Some("v30"));
        assert!(index.find(&35).is_none());
        assert!(index.contains_key(&70));
        assert!(!index.contains_key(&0));
    }

    #[test]
    fn test_delete_leaf_inner_and_root() {
        let mut index = build(&[40, 20, 60, 10, 30, 50, 70, 25, 35]);

        // leaf
        assert!(index.delete(&10));
        index.check_invariants().unwrap();
        // node with two children
        assert!(index.delete(&30));
        index.check_invariants().unwrap();
        // root
        let root_key = index.nodes[index.root.unwrap()].key;
        assert!(index.delete(&root_key));
        index.check_invariants().unwrap();

        assert!(!index.delete(&10));
        assert_eq!(index.len(), 6);
        assert!(!keys(&index).contains(&root_key));
    }

    #[test]
    fn test_delete_everything() {
        let all: Vec<i64> = (0..128).map(|i| (i * 37) % 128).collect();
        let mut index = build(&all);

        for k in 0..128 {
            assert!(index.delete(&k), "key {} should be present", k);
            index.check_invariants().unwrap();
            assert_eq!(index.len(), 127 - k as usize);
        }
        assert!(index.is_empty());
        assert!(index.root.is_none());
    }

    #[test]
    fn test_remove_returns_value() {
        let mut index = build(&[1, 2, 3]);
        assert_eq!(index.remove(&2), Some("v2".to_string()));
        assert_eq!(index.remove(&2), None);
        assert_eq!(index.remove_entry(&3), Some((3, "v3".to_string())));
    }

    #[test]
    fn test_lower_bound() {
        let index = build(&[10, 20, 30, 40]);

        assert_eq!(index.lower_bound(&5).map(|n| *n.key()), Some(10));
        assert_eq!(index.lower_bound(&20).map(|n| *n.key()), Some(20));
        assert_eq!(index.lower_bound(&21).map(|n| *n.key()), Some(30));
        assert_eq!(index.lower_bound(&40).map(|n| *n.key()), Some(40));
        assert!(index.lower_bound(&41).is_none());
    }

    #[test]
    fn test_successor_walk() {
        let index = build(&[50, 25, 75, 10, 30, 60, 90]);

        let mut walked = Vec::new();
        let mut node = index.first();
        while let Some(n) = node {
            walked.push(*n.key());
            node = index.successor(n);
        }
        assert_eq!(walked, vec![10, 25, 30, 50, 60, 75, 90]);
    }

    #[test]
    fn test_range_from() {
        let index = build(&[1, 3, 5, 7, 9]);
        let tail: Vec<i64> = index.range_from(&4).map(|(k, _)| *k).collect();
        assert_eq!(tail, vec![5, 7, 9]);
        assert_eq!(index.range_from(&10).count(), 0);
    }

    #[test]
    fn test_in_order_is_restartable() {
        let index = build(&[3, 1, 2]);
        let first: Vec<i64> = keys(&index);
        let second: Vec<i64> = keys(&index);
        assert_eq!(first, second);
        assert_eq!(first, vec![1, 2, 3]);
    }

    #[test]
    fn test_clear() {
        let mut index = build(&[1, 2, 3]);
        index.clear();
        assert!(index.is_empty());
        assert_eq!(index.in_order().count(), 0);

        index.insert(9, "v9".to_string());
        assert_eq!(keys(&index), vec![9]);
        index.check_invariants().unwrap();
    }

    #[test]
    fn test_check_invariants_detects_red_root() {
        let mut index = build(&[1]);
        let root = index.root.unwrap();
        index.nodes[root].color = Color::Red;
        assert_eq!(index.check_invariants(), Err(IndexError::RedRoot));
    }

    #[test]
    fn test_check_invariants_detects_black_height_mismatch() {
        let mut index = build(&[2, 1, 3]);
        // both children start red; blackening one unbalances the root
        let left = index.nodes[index.root.unwrap()].left.unwrap();
        index.nodes[left].color = Color::Black;
        assert!(matches!(
            index.check_invariants(),
            Err(IndexError::BlackHeightMismatch { .. })
        ));
    }

    #[test]
    fn test_check_invariants_detects_order_violation() {
        let mut index = build(&[2, 1, 3]);
        let left = index.nodes[index.root.unwrap()].left.unwrap();
        index.nodes[left].key = 10;
        assert!(matches!(
            index.check_invariants(),
            Err(IndexError::OrderViolation { .. })
        ));
    }
}
