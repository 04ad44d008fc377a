use crate::grid::Position;
use crate::vertex::{Cost, INFINITY};
use rustc_hash::FxHashMap;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Two-part D* Lite priority, compared lexicographically.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct Key {
    pub k1: Cost,
    pub k2: Cost,
}

impl Key {
    pub const INFINITY: Key = Key {
        k1: INFINITY,
        k2: INFINITY,
    };

    pub fn new(k1: Cost, k2: Cost) -> Self {
        Key { k1, k2 }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct QueueEntry {
    key: Key,
    pos: Position,
    stamp: u64,
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse for min-heap behavior
        other
            .key
            .cmp(&self.key)
            .then_with(|| other.pos.cmp(&self.pos))
            .then_with(|| other.stamp.cmp(&self.stamp))
    }
}

/// Min-priority queue of vertices with lazy deletion.
///
/// Membership is tracked apart from the heap. Every push stamps its entry and
/// records the stamp as the vertex's membership; an entry whose stamp no
/// longer matches is stale and gets dropped when it reaches the top.
#[derive(Debug, Default)]
pub struct Frontier {
    heap: BinaryHeap<QueueEntry>,
    members: FxHashMap<Position, u64>,
    next_stamp: u64,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of member vertices.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Number of heap entries, stale ones included.
    pub fn physical_len(&self) -> usize {
        self.heap.len()
    }

    /// Inserts `pos` with `key` unless it is already a member.
    pub fn push(&mut self, pos: Position, key: Key) -> bool {
        if self.members.contains_key(&pos) {
            return false;
        }
        let stamp = self.next_stamp;
        self.next_stamp += 1;
        self.members.insert(pos, stamp);
        self.heap.push(QueueEntry { key, pos, stamp });
        true
    }

    /// Revokes membership. The heap entry stays behind until popped.
    pub fn remove(&mut self, pos: Position) -> bool {
        self.members.remove(&pos).is_some()
    }

    pub fn pop(&mut self) -> Option<(Key, Position)> {
        while let Some(entry) = self.heap.pop() {
            if self.is_live(&entry) {
                self.members.remove(&entry.pos);
                return Some((entry.key, entry.pos));
            }
        }
        None
    }

    /// Smallest live key, or [`Key::INFINITY`] when there are no members.
    pub fn peek_key(&mut self) -> Key {
        while let Some(entry) = self.heap.peek() {
            if self.is_live(entry) {
                return entry.key;
            }
            self.heap.pop();
        }
        Key::INFINITY
    }

    /// Rebuilds the heap from live members with freshly computed keys.
    pub fn rekey<F>(&mut self, mut key_of: F)
    where
        F: FnMut(Position) -> Key,
    {
        let members = &self.members;
        let live: Vec<QueueEntry> = self
            .heap
            .drain()
            .filter(|entry| members.get(&entry.pos) == Some(&entry.stamp))
            .map(|entry| QueueEntry {
                key: key_of(entry.pos),
                ..entry
            })
            .collect();
        self.heap = BinaryHeap::from(live);
    }

    fn is_live(&self, entry: &QueueEntry) -> bool {
        self.members.get(&entry.pos) == Some(&entry.stamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(x: usize, y: usize) -> Position {
        Position::new(x, y)
    }

    #[test]
    fn test_pops_in_key_order() {
        let mut frontier = Frontier::new();
        frontier.push(pos(0, 0), Key::new(5, 1));
        frontier.push(pos(1, 0), Key::new(3, 3));
        frontier.push(pos(2, 0), Key::new(3, 2));

        assert_eq!(frontier.pop(), Some((Key::new(3, 2), pos(2, 0))));
        assert_eq!(frontier.pop(), Some((Key::new(3, 3), pos(1, 0))));
        assert_eq!(frontier.pop(), Some((Key::new(5, 1), pos(0, 0))));
        assert_eq!(frontier.pop(), None);
    }

    #[test]
    fn test_equal_keys_break_ties_by_coordinate() {
        let mut frontier = Frontier::new();
        frontier.push(pos(2, 1), Key::new(4, 4));
        frontier.push(pos(0, 3), Key::new(4, 4));
        frontier.push(pos(2, 0), Key::new(4, 4));

        assert_eq!(frontier.pop().map(|(_, p)| p), Some(pos(0, 3)));
        assert_eq!(frontier.pop().map(|(_, p)| p), Some(pos(2, 0)));
        assert_eq!(frontier.pop().map(|(_, p)| p), Some(pos(2, 1)));
    }

    #[test]
    fn test_push_is_noop_for_members() {
        let mut frontier = Frontier::new();
        assert!(frontier.push(pos(0, 0), Key::new(7, 7)));
        assert!(!frontier.push(pos(0, 0), Key::new(1, 1)));
        assert_eq!(frontier.len(), 1);
        assert_eq!(frontier.physical_len(), 1);
        assert_eq!(frontier.peek_key(), Key::new(7, 7));
    }

    #[test]
    fn test_removed_entries_are_skipped() {
        let mut frontier = Frontier::new();
        frontier.push(pos(0, 0), Key::new(1, 1));
        frontier.push(pos(1, 1), Key::new(2, 2));
        assert!(frontier.remove(pos(0, 0)));
        assert!(!frontier.remove(pos(0, 0)));

        assert_eq!(frontier.len(), 1);
        assert_eq!(frontier.physical_len(), 2);
        assert_eq!(frontier.peek_key(), Key::new(2, 2));
        assert_eq!(frontier.pop(), Some((Key::new(2, 2), pos(1, 1))));
        assert!(frontier.is_empty());
        assert_eq!(frontier.pop(), None);
    }

    #[test]
    fn test_repush_after_remove_hides_old_key() {
        let mut frontier = Frontier::new();
        frontier.push(pos(3, 3), Key::new(1, 1));
        frontier.remove(pos(3, 3));
        frontier.push(pos(3, 3), Key::new(9, 9));
        frontier.push(pos(0, 0), Key::new(5, 5));

        assert_eq!(frontier.peek_key(), Key::new(5, 5));
        assert_eq!(frontier.pop(), Some((Key::new(5, 5), pos(0, 0))));
        assert_eq!(frontier.pop(), Some((Key::new(9, 9), pos(3, 3))));
        assert_eq!(frontier.pop(), None);
    }

    #[test]
    fn test_empty_peek_is_infinite() {
        let mut frontier = Frontier::new();
        assert_eq!(frontier.peek_key(), Key::INFINITY);
        frontier.push(pos(0, 0), Key::new(0, 0));
        frontier.remove(pos(0, 0));
        assert_eq!(frontier.peek_key(), Key::INFINITY);
        assert_eq!(frontier.physical_len(), 0);
    }

    #[test]
    fn test_rekey_drops_stale_entries() {
        let mut frontier = Frontier::new();
        frontier.push(pos(0, 0), Key::new(1, 0));
        frontier.push(pos(4, 0), Key::new(2, 0));
        frontier.remove(pos(0, 0));

        frontier.rekey(|p| Key::new(p.x as Cost * 10, 0));
        assert_eq!(frontier.physical_len(), 1);
        assert_eq!(frontier.pop(), Some((Key::new(40, 0), pos(4, 0))));
    }
}
