//! Sorted, insertion-stable bucket backed by an index arena.
//!
//! A bucket holds the entries of one physical calendar slot. Entries are kept
//! in ascending comparator order in a singly linked list whose cells live in
//! a `Vec` and link to each other by index. Freed cells go on a free list and
//! are reused by the next insert, so steady put/take traffic does not
//! allocate.
//!
//! ## Architecture
//!
//! ```text
//!   cells: Vec<Option<Cell<T>>>          free_list: [2]
//!   ┌─────┬──────────────────────────┐
//!   │ idx │ Cell { value, next }     │
//!   ├─────┼──────────────────────────┤
//!   │  0  │ { 1.0, next: Some(3) }   │
//!   │  1  │ { 4.0, next: None }      │◄── tail
//!   │  2  │ (vacant)                 │
//!   │  3  │ { 2.5, next: Some(1) }   │
//!   └─────┴──────────────────────────┘
//!
//!   head ─► [0] 1.0 ─► [3] 2.5 ─► [1] 4.0 ◄── tail
//! ```
//!
//! ## Insert placement
//!
//! - empty bucket: the entry becomes the only cell
//! - `entry >= tail`: append (O(1))
//! - `entry < head`: prepend (O(1))
//! - otherwise: splice before the first cell strictly greater than `entry`
//!
//! Equal entries therefore land after the ones already queued (FIFO ties).
//!
//! ## Performance
//! - `insert`: O(1) at either end, O(n) otherwise
//! - `take_first`: O(1)
//! - `remove_first_match` / `contains`: O(n)
//!
//! `debug_validate_invariants()` is available in debug/test builds.

use std::cmp::Ordering;

use crate::traits::CqComparator;

#[derive(Debug)]
struct Cell<T> {
    value: T,
    next: Option<usize>,
}

/// Sorted multiset of entries, FIFO among entries that compare equal.
#[derive(Debug)]
pub struct Bucket<T> {
    cells: Vec<Option<Cell<T>>>,
    free_list: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
}

impl<T> Bucket<T> {
    /// Creates an empty bucket.
    pub fn new() -> Self {
        Self {
            cells: Vec::new(),
            free_list: Vec::new(),
            head: None,
            tail: None,
            len: 0,
        }
    }

    /// Returns the number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the bucket holds no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Returns the smallest entry.
    #[inline]
    pub fn front(&self) -> Option<&T> {
        self.head.and_then(|idx| self.value_of(idx))
    }

    /// Returns the largest entry (the most recently queued among equals).
    #[inline]
    pub fn back(&self) -> Option<&T> {
        self.tail.and_then(|idx| self.value_of(idx))
    }

    /// Inserts `value` in sorted position, after any entries equal to it.
    pub fn insert<C>(&mut self, value: T, cmp: &C)
    where
        C: CqComparator<T> + ?Sized,
    {
        let (head, tail) = match (self.head, self.tail) {
            (Some(head), Some(tail)) => (head, tail),
            _ => {
                let idx = self.alloc(value, None);
                self.head = Some(idx);
                self.tail = Some(idx);
                return;
            },
        };

        let at_or_after_tail = self
            .value_of(tail)
            .is_none_or(|last| cmp.compare(&value, last) != Ordering::Less);
        if at_or_after_tail {
            self.push_back(value);
            return;
        }

        let before_head = self
            .value_of(head)
            .is_some_and(|first| cmp.compare(first, &value) == Ordering::Greater);
        if before_head {
            let idx = self.alloc(value, Some(head));
            self.head = Some(idx);
            return;
        }

        // The tail is strictly greater than `value`, so the scan always
        // finds a splice point.
        let mut prev = head;
        let mut current = self.next_of(head);
        while let Some(idx) = current {
            let greater = self
                .value_of(idx)
                .is_some_and(|v| cmp.compare(v, &value) == Ordering::Greater);
            if greater {
                let new_idx = self.alloc(value, Some(idx));
                self.set_next(prev, Some(new_idx));
                return;
            }
            prev = idx;
            current = self.next_of(idx);
        }
        self.push_back(value);
    }

    /// Removes and returns the smallest entry; `None` if the bucket is empty.
    pub fn take_first(&mut self) -> Option<T> {
        let idx = self.head?;
        let cell = self.release(idx)?;
        self.head = cell.next;
        if self.head.is_none() {
            self.tail = None;
        }
        self.reset_if_empty();
        Some(cell.value)
    }

    /// Removes the first entry equal (by `PartialEq`) to `value`.
    ///
    /// Returns the stored entry, which may be a distinct value that merely
    /// compares equal.
    pub fn remove_first_match(&mut self, value: &T) -> Option<T>
    where
        T: PartialEq,
    {
        let mut prev: Option<usize> = None;
        let mut current = self.head;
        while let Some(idx) = current {
            let next = self.next_of(idx);
            if self.value_of(idx).is_some_and(|v| v == value) {
                match prev {
                    Some(prev_idx) => self.set_next(prev_idx, next),
                    None => self.head = next,
                }
                if self.tail == Some(idx) {
                    self.tail = prev;
                }
                let cell = self.release(idx)?;
                self.reset_if_empty();
                return Some(cell.value);
            }
            prev = Some(idx);
            current = next;
        }
        None
    }

    /// Returns `true` if an entry equal (by `PartialEq`) to `value` is present.
    pub fn contains(&self, value: &T) -> bool
    where
        T: PartialEq,
    {
        self.iter().any(|v| v == value)
    }

    /// Iterates entries from smallest to largest.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            bucket: self,
            current: self.head,
            remaining: self.len,
        }
    }

    /// Returns `true` if consecutive entries never decrease under `cmp`.
    pub fn is_sorted_by<C>(&self, cmp: &C) -> bool
    where
        C: CqComparator<T> + ?Sized,
    {
        let mut iter = self.iter();
        let Some(mut prev) = iter.next() else {
            return true;
        };
        for value in iter {
            if cmp.compare(prev, value) == Ordering::Greater {
                return false;
            }
            prev = value;
        }
        true
    }

    /// Returns an approximate memory footprint in bytes.
    pub fn approx_bytes(&self) -> usize {
        std::mem::size_of::<Self>()
            + self.cells.capacity() * std::mem::size_of::<Option<Cell<T>>>()
            + self.free_list.capacity() * std::mem::size_of::<usize>()
    }

    fn push_back(&mut self, value: T) {
        let idx = self.alloc(value, None);
        match self.tail {
            Some(tail) => self.set_next(tail, Some(idx)),
            None => self.head = Some(idx),
        }
        self.tail = Some(idx);
    }

    fn alloc(&mut self, value: T, next: Option<usize>) -> usize {
        let cell = Some(Cell { value, next });
        let idx = if let Some(idx) = self.free_list.pop() {
            self.cells[idx] = cell;
            idx
        } else {
            self.cells.push(cell);
            self.cells.len() - 1
        };
        self.len += 1;
        idx
    }

    fn release(&mut self, idx: usize) -> Option<Cell<T>> {
        let cell = self.cells.get_mut(idx)?.take()?;
        self.free_list.push(idx);
        self.len -= 1;
        Some(cell)
    }

    // Keeps the arena from accumulating vacant slots across busy periods.
    fn reset_if_empty(&mut self) {
        if self.len == 0 {
            self.cells.clear();
            self.free_list.clear();
            self.head = None;
            self.tail = None;
        }
    }

    #[inline]
    fn value_of(&self, idx: usize) -> Option<&T> {
        self.cells
            .get(idx)
            .and_then(|slot| slot.as_ref())
            .map(|cell| &cell.value)
    }

    #[inline]
    fn next_of(&self, idx: usize) -> Option<usize> {
        self.cells
            .get(idx)
            .and_then(|slot| slot.as_ref())
            .and_then(|cell| cell.next)
    }

    #[inline]
    fn set_next(&mut self, idx: usize, next: Option<usize>) {
        if let Some(Some(cell)) = self.cells.get_mut(idx) {
            cell.next = next;
        }
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        if self.head.is_none() || self.tail.is_none() {
            assert!(self.head.is_none());
            assert!(self.tail.is_none());
            assert_eq!(self.len, 0);
            return;
        }

        let mut count = 0usize;
        let mut current = self.head;
        let mut last = None;
        while let Some(idx) = current {
            assert!(self.cells[idx].is_some(), "linked cell is vacant");
            last = Some(idx);
            current = self.next_of(idx);
            count += 1;
            assert!(count <= self.len, "cycle in bucket list");
        }
        assert_eq!(count, self.len);
        assert_eq!(last, self.tail);

        let occupied = self.cells.iter().filter(|slot| slot.is_some()).count();
        assert_eq!(occupied, self.len);
        assert_eq!(occupied + self.free_list.len(), self.cells.len());
    }
}

impl<T> Default for Bucket<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Borrowed iterator over a [`Bucket`], smallest entry first.
///
/// Created by [`Bucket::iter`].
#[derive(Debug)]
pub struct Iter<'a, T> {
    bucket: &'a Bucket<T>,
    current: Option<usize>,
    remaining: usize,
}

impl<T> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        Self {
            bucket: self.bucket,
            current: self.current,
            remaining: self.remaining,
        }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.current?;
        let cell = self.bucket.cells.get(idx)?.as_ref()?;
        self.current = cell.next;
        self.remaining = self.remaining.saturating_sub(1);
        Some(&cell.value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<'a, T> IntoIterator for &'a Bucket<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Orders `(key, tag)` pairs by key only, so tags expose tie order.
    struct ByKey;

    impl CqComparator<(u32, u32)> for ByKey {
        fn compare(&self, a: &(u32, u32), b: &(u32, u32)) -> Ordering {
            a.0.cmp(&b.0)
        }

        fn virtual_bin_number(&self, entry: &(u32, u32)) -> i64 {
            i64::from(entry.0)
        }

        fn set_zero_reference(&mut self, _entry: &(u32, u32)) {}

        fn set_bin_width(&mut self, _sample: Option<&[(u32, u32)]>) {}
    }

    fn filled(entries: &[(u32, u32)]) -> Bucket<(u32, u32)> {
        let mut bucket = Bucket::new();
        for &entry in entries {
            bucket.insert(entry, &ByKey);
        }
        bucket
    }

    fn contents(bucket: &Bucket<(u32, u32)>) -> Vec<(u32, u32)> {
        bucket.iter().copied().collect()
    }

    #[test]
    fn bucket_insert_sorts_and_keeps_fifo_ties() {
        let bucket = filled(&[(5, 0), (1, 1), (3, 2), (1, 3), (9, 4), (3, 5)]);
        assert_eq!(
            contents(&bucket),
            vec![(1, 1), (1, 3), (3, 2), (3, 5), (5, 0), (9, 4)]
        );
        assert_eq!(bucket.len(), 6);
        bucket.debug_validate_invariants();
    }

    #[test]
    fn bucket_insert_fast_paths_update_ends() {
        let mut bucket = filled(&[(5, 0)]);
        bucket.insert((7, 1), &ByKey);
        assert_eq!(bucket.back(), Some(&(7, 1)));
        bucket.insert((2, 2), &ByKey);
        assert_eq!(bucket.front(), Some(&(2, 2)));
        bucket.insert((7, 3), &ByKey);
        assert_eq!(bucket.back(), Some(&(7, 3)));
        // Equal to head goes after the head, not before it.
        bucket.insert((2, 4), &ByKey);
        assert_eq!(bucket.front(), Some(&(2, 2)));
        assert_eq!(contents(&bucket)[1], (2, 4));
        bucket.debug_validate_invariants();
    }

    #[test]
    fn bucket_take_first_drains_in_order() {
        let mut bucket = filled(&[(4, 0), (2, 1), (8, 2)]);
        assert_eq!(bucket.take_first(), Some((2, 1)));
        assert_eq!(bucket.take_first(), Some((4, 0)));
        assert_eq!(bucket.take_first(), Some((8, 2)));
        assert_eq!(bucket.take_first(), None);
        assert!(bucket.is_empty());
        bucket.debug_validate_invariants();
    }

    #[test]
    fn bucket_remove_head_middle_tail() {
        let mut bucket = filled(&[(1, 0), (2, 1), (3, 2), (4, 3)]);

        assert_eq!(bucket.remove_first_match(&(2, 1)), Some((2, 1)));
        assert_eq!(bucket.remove_first_match(&(1, 0)), Some((1, 0)));
        assert_eq!(bucket.remove_first_match(&(4, 3)), Some((4, 3)));
        assert_eq!(contents(&bucket), vec![(3, 2)]);
        assert_eq!(bucket.back(), Some(&(3, 2)));
        bucket.debug_validate_invariants();

        // Tail was repaired, so appending still links correctly.
        bucket.insert((6, 4), &ByKey);
        assert_eq!(contents(&bucket), vec![(3, 2), (6, 4)]);
        bucket.debug_validate_invariants();
    }

    #[test]
    fn bucket_remove_uses_value_equality_not_order() {
        let mut bucket = filled(&[(1, 0), (1, 1)]);
        assert_eq!(bucket.remove_first_match(&(1, 7)), None);
        assert_eq!(bucket.remove_first_match(&(1, 1)), Some((1, 1)));
        assert_eq!(contents(&bucket), vec![(1, 0)]);
    }

    #[test]
    fn bucket_remove_only_first_duplicate() {
        let mut bucket = filled(&[(3, 3), (3, 3), (3, 3)]);
        assert_eq!(bucket.remove_first_match(&(3, 3)), Some((3, 3)));
        assert_eq!(bucket.len(), 2);
        bucket.debug_validate_invariants();
    }

    #[test]
    fn bucket_contains_and_empty() {
        let bucket = filled(&[(1, 0), (3, 1)]);
        assert!(bucket.contains(&(3, 1)));
        assert!(!bucket.contains(&(3, 2)));

        let empty: Bucket<(u32, u32)> = Bucket::default();
        assert!(!empty.contains(&(1, 0)));
        assert_eq!(empty.front(), None);
        assert_eq!(empty.iter().len(), 0);
    }

    #[test]
    fn bucket_reuses_freed_cells() {
        let mut bucket = filled(&[(1, 0), (2, 1), (3, 2)]);
        let cells_before = bucket.cells.len();
        bucket.remove_first_match(&(2, 1));
        bucket.insert((2, 9), &ByKey);
        assert_eq!(bucket.cells.len(), cells_before);
        bucket.debug_validate_invariants();
    }

    #[test]
    fn bucket_resets_arena_when_emptied() {
        let mut bucket = filled(&[(1, 0), (2, 1)]);
        bucket.take_first();
        bucket.take_first();
        assert!(bucket.cells.is_empty());
        assert!(bucket.free_list.is_empty());
        bucket.debug_validate_invariants();
    }

    #[test]
    fn bucket_sortedness_check() {
        let bucket = filled(&[(3, 0), (1, 1), (2, 2)]);
        assert!(bucket.is_sorted_by(&ByKey));
        assert!(Bucket::<(u32, u32)>::new().is_sorted_by(&ByKey));
    }

    proptest! {
        /// Property: iteration order equals a stable sort of insertion order
        #[cfg_attr(miri, ignore)]
        #[test]
        fn prop_insert_matches_stable_sort(keys in prop::collection::vec(0u32..16, 0..64)) {
            let entries: Vec<(u32, u32)> = keys
                .iter()
                .enumerate()
                .map(|(tag, &key)| (key, tag as u32))
                .collect();
            let bucket = filled(&entries);

            let mut expected = entries.clone();
            expected.sort_by_key(|e| e.0);
            prop_assert_eq!(contents(&bucket), expected);
            bucket.debug_validate_invariants();
        }

        /// Property: invariants hold across mixed insert/take/remove
        #[cfg_attr(miri, ignore)]
        #[test]
        fn prop_invariants_always_hold(
            ops in prop::collection::vec((0u8..3, 0u32..8), 0..100)
        ) {
            let mut bucket: Bucket<(u32, u32)> = Bucket::new();
            let mut model: Vec<(u32, u32)> = Vec::new();

            for (tag, (op, key)) in ops.into_iter().enumerate() {
                match op {
                    0 => {
                        let entry = (key, tag as u32);
                        bucket.insert(entry, &ByKey);
                        let pos = model.partition_point(|e| e.0 <= key);
                        model.insert(pos, entry);
                    }
                    1 => {
                        let taken = bucket.take_first();
                        let expected = if model.is_empty() { None } else { Some(model.remove(0)) };
                        prop_assert_eq!(taken, expected);
                    }
                    2 => {
                        if let Some(&target) = model.iter().find(|e| e.0 == key) {
                            prop_assert_eq!(bucket.remove_first_match(&target), Some(target));
                            let pos = model.iter().position(|e| *e == target).unwrap();
                            model.remove(pos);
                        }
                    }
                    _ => unreachable!(),
                }

                bucket.debug_validate_invariants();
                prop_assert_eq!(bucket.len(), model.len());
            }
            prop_assert_eq!(contents(&bucket), model);
        }
    }
}
