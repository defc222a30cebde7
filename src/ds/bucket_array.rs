//! Power-of-two bucket array with minimum tracking.
//!
//! Maps an infinite virtual timeline of bins onto `2^k` physical buckets by
//! masking the virtual bin number, and remembers where the smallest entry
//! was last seen so the next dequeue can start its scan there.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────────┐
//! │                        BucketArray<T> (k = 2)                               │
//! │                                                                             │
//! │   virtual bin:   ...  4   5   6   7   8   9  10  11 ...                     │
//! │                       │   │   │   │   │   │   │   │                         │
//! │   vbin & mask:        0   1   2   3   0   1   2   3                         │
//! │                                                                             │
//! │   buckets: Vec<Bucket<T>>                                                   │
//! │   ┌────────────┬────────────┬────────────┬────────────┐                     │
//! │   │ 0: [4, 8]  │ 1: [5]     │ 2: []      │ 3: [7, 11] │                     │
//! │   └────────────┴────────────┴────────────┴────────────┘                     │
//! │         ▲                                                                   │
//! │         min_bucket = 0, min_virtual_bucket = 4, minimum_entry = 4           │
//! │                                                                             │
//! │   Year scan from min_bucket: bucket j is "in the current year" when its     │
//! │   head's virtual bin == min_virtual_bucket + (j - min_bucket).              │
//! └─────────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Operations
//!
//! | Operation               | Description                             | Complexity       |
//! |-------------------------|-----------------------------------------|------------------|
//! | [`physical_index`]      | Fold a virtual bin onto a bucket        | O(1)             |
//! | [`insert`]              | Sorted insert, updating the minimum     | O(bucket len)    |
//! | [`take_from`]           | Pop a bucket head, updating the minimum | O(1)             |
//! | [`find_minimum_bucket`] | Year scan with comparator fallback      | O(1) amortized   |
//! | [`collect_ordered`]     | Ascending walk without mutation         | O(n + buckets)   |
//! | [`into_parts`]          | Hand buckets over for rebucketing       | O(1)             |
//!
//! [`physical_index`]: BucketArray::physical_index
//! [`insert`]: BucketArray::insert
//! [`take_from`]: BucketArray::take_from
//! [`find_minimum_bucket`]: BucketArray::find_minimum_bucket
//! [`collect_ordered`]: BucketArray::collect_ordered
//! [`into_parts`]: BucketArray::into_parts
//!
//! The array does not know the queue size. Callers tell [`insert`] whether
//! the queue was empty, and only search for a minimum when it is not.
//!
//! [`insert`]: BucketArray::insert

use std::cmp::Ordering;
use std::iter::Peekable;

use crate::ds::bucket::{Bucket, Iter};
use crate::error::InvariantError;
use crate::traits::CqComparator;

/// Where a minimum search landed and how much it cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinimumBucket {
    /// Physical index of the bucket holding the smallest entry.
    pub index: usize,
    /// Buckets inspected.
    pub steps: usize,
    /// `true` when the head matched the expected virtual bin; `false` when
    /// the comparator fallback picked it after a full lap.
    pub exact: bool,
}

/// `2^k` buckets plus the minimum tracking triple.
#[derive(Debug)]
pub struct BucketArray<T> {
    buckets: Vec<Bucket<T>>,
    log_len: u32,
    mask: u64,
    min_bucket: usize,
    min_virtual_bucket: i64,
    minimum_entry: T,
}

impl<T> BucketArray<T> {
    /// Creates `2^log_len` empty buckets with the minimum anchored at
    /// `anchor`.
    pub fn new<C>(log_len: u32, anchor: T, cmp: &C) -> Self
    where
        C: CqComparator<T> + ?Sized,
    {
        let len = 1usize << log_len;
        let mask = (len as u64) - 1;
        let min_virtual_bucket = cmp.virtual_bin_number(&anchor);
        let mut buckets = Vec::with_capacity(len);
        buckets.resize_with(len, Bucket::new);
        Self {
            buckets,
            log_len,
            mask,
            min_bucket: (min_virtual_bucket as u64 & mask) as usize,
            min_virtual_bucket,
            minimum_entry: anchor,
        }
    }

    /// Number of physical buckets.
    #[inline]
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Always `false`; an array has at least one bucket.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// `log2` of the bucket count.
    #[inline]
    pub fn log_len(&self) -> u32 {
        self.log_len
    }

    /// Folds a virtual bin number onto a physical bucket.
    #[inline]
    pub fn physical_index(&self, virtual_bin: i64) -> usize {
        (virtual_bin as u64 & self.mask) as usize
    }

    /// Physical bucket `entry` belongs to under `cmp`.
    #[inline]
    pub fn index_of<C>(&self, entry: &T, cmp: &C) -> usize
    where
        C: CqComparator<T> + ?Sized,
    {
        self.physical_index(cmp.virtual_bin_number(entry))
    }

    /// Physical index of the last recorded minimum.
    #[inline]
    pub fn min_bucket(&self) -> usize {
        self.min_bucket
    }

    /// Virtual bin of the last recorded minimum.
    #[inline]
    pub fn min_virtual_bucket(&self) -> i64 {
        self.min_virtual_bucket
    }

    fn record_minimum(&mut self, entry: T, virtual_bin: i64, index: usize) {
        self.minimum_entry = entry;
        self.min_virtual_bucket = virtual_bin;
        self.min_bucket = index;
    }

    /// Removes the first entry structurally equal to `entry` from the bucket
    /// its own virtual bin maps to. Other buckets are not searched.
    pub fn remove<C>(&mut self, entry: &T, cmp: &C) -> Option<T>
    where
        T: PartialEq,
        C: CqComparator<T> + ?Sized,
    {
        let index = self.index_of(entry, cmp);
        self.buckets[index].remove_first_match(entry)
    }

    /// Searches only the bucket `entry` maps to.
    pub fn contains<C>(&self, entry: &T, cmp: &C) -> bool
    where
        T: PartialEq,
        C: CqComparator<T> + ?Sized,
    {
        self.buckets[self.index_of(entry, cmp)].contains(entry)
    }

    /// Finds the bucket whose head is the smallest queued entry.
    ///
    /// Walks one lap starting at `min_bucket`. The first bucket whose head
    /// falls in the expected virtual bin wins outright. Failing that, the
    /// smallest head seen under `cmp` wins; ties go to the bucket met first.
    ///
    /// # Errors
    ///
    /// Returns [`InvariantError`] when every bucket is empty. Callers only
    /// search a non-empty queue, so that means the bookkeeping is broken.
    pub fn find_minimum_bucket<C>(&self, cmp: &C) -> Result<MinimumBucket, InvariantError>
    where
        C: CqComparator<T> + ?Sized,
    {
        let len = self.buckets.len();
        let mut fallback: Option<(usize, &T)> = None;
        for offset in 0..len {
            let index = (self.min_bucket + offset) & (len - 1);
            let Some(head) = self.buckets[index].front() else {
                continue;
            };
            let expected = self.min_virtual_bucket.wrapping_add(offset as i64);
            if cmp.virtual_bin_number(head) == expected {
                return Ok(MinimumBucket {
                    index,
                    steps: offset + 1,
                    exact: true,
                });
            }
            match fallback {
                Some((_, best)) if cmp.compare(head, best) != Ordering::Less => {},
                _ => fallback = Some((index, head)),
            }
        }
        fallback
            .map(|(index, _)| MinimumBucket {
                index,
                steps: len,
                exact: false,
            })
            .ok_or_else(|| {
                InvariantError::new(format!(
                    "minimum search found all {} buckets empty in a non-empty queue",
                    len
                ))
            })
    }

    /// Returns the head of bucket `index`.
    #[inline]
    pub fn head(&self, index: usize) -> Option<&T> {
        self.buckets.get(index).and_then(Bucket::front)
    }

    /// Returns up to `limit` entries in ascending order without mutating
    /// anything.
    ///
    /// Walks buckets year by year from the recorded minimum, taking each
    /// bucket's entries while they fall in the current virtual bin. When a
    /// full lap completes, jumps straight to the smallest virtual bin seen at
    /// a bucket head.
    ///
    /// `limit` must not exceed the number of queued entries.
    ///
    /// # Errors
    ///
    /// Returns [`InvariantError`] if a lap finds no remaining entry before
    /// `limit` is reached, or if two laps in a row make no progress (an
    /// entry sits in a bucket its virtual bin does not map to).
    pub fn collect_ordered<C>(&self, limit: usize, cmp: &C) -> Result<Vec<&T>, InvariantError>
    where
        C: CqComparator<T> + ?Sized,
    {
        let mut out = Vec::with_capacity(limit);
        if limit == 0 {
            return Ok(out);
        }

        let len = self.buckets.len();
        let mut cursors: Vec<Peekable<Iter<'_, T>>> =
            self.buckets.iter().map(|b| b.iter().peekable()).collect();

        let mut current = self.min_bucket;
        let mut virtual_bucket = self.min_virtual_bucket;
        let mut next_start = self.min_bucket;
        let mut min_next = i64::MAX;
        let mut found = false;
        let mut collected_at_lap = 0usize;
        let mut stalled_laps = 0u32;

        loop {
            let cursor = &mut cursors[current];
            while let Some(entry) =
                cursor.next_if(|e| cmp.virtual_bin_number(e) == virtual_bucket)
            {
                out.push(entry);
                if out.len() == limit {
                    return Ok(out);
                }
            }
            if let Some(next) = cursor.peek() {
                let next_virtual = cmp.virtual_bin_number(next);
                if !found || next_virtual < min_next {
                    found = true;
                    min_next = next_virtual;
                    next_start = current;
                }
            }

            current = (current + 1) & (len - 1);
            virtual_bucket = virtual_bucket.wrapping_add(1);

            if current == next_start {
                if !found {
                    return Err(InvariantError::new(format!(
                        "ordered walk ran out of entries after {} of {}",
                        out.len(),
                        limit
                    )));
                }
                if out.len() == collected_at_lap {
                    stalled_laps += 1;
                    if stalled_laps > 1 {
                        return Err(InvariantError::new(format!(
                            "ordered walk stalled at virtual bin {}",
                            min_next
                        )));
                    }
                } else {
                    stalled_laps = 0;
                }
                collected_at_lap = out.len();
                virtual_bucket = min_next;
                found = false;
                min_next = i64::MAX;
            }
        }
    }

    /// Checks placement and ordering; returns the total entry count.
    pub fn check<C>(&self, cmp: &C) -> Result<usize, InvariantError>
    where
        C: CqComparator<T> + ?Sized,
    {
        let mut total = 0usize;
        for (index, bucket) in self.buckets.iter().enumerate() {
            if !bucket.is_sorted_by(cmp) {
                return Err(InvariantError::new(format!("bucket {} is out of order", index)));
            }
            if let Some(stray) = bucket.iter().position(|e| self.index_of(e, cmp) != index) {
                return Err(InvariantError::new(format!(
                    "entry {} of bucket {} maps to another bucket",
                    stray, index
                )));
            }
            total += bucket.len();
        }
        Ok(total)
    }

    /// Total entries across all buckets.
    pub fn entry_count(&self) -> usize {
        self.buckets.iter().map(Bucket::len).sum()
    }

    /// Approximate heap footprint in bytes.
    pub fn approx_bytes(&self) -> usize {
        std::mem::size_of::<Self>()
            + self.buckets.capacity() * std::mem::size_of::<Bucket<T>>()
            + self.buckets.iter().map(Bucket::approx_bytes).sum::<usize>()
    }

    /// Consumes the array, yielding its buckets and the recorded minimum.
    pub fn into_parts(self) -> (Vec<Bucket<T>>, T) {
        (self.buckets, self.minimum_entry)
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        assert_eq!(self.buckets.len(), 1usize << self.log_len);
        assert_eq!(self.mask, (self.buckets.len() as u64) - 1);
        assert!(self.min_bucket < self.buckets.len());
        assert_eq!(self.physical_index(self.min_virtual_bucket), self.min_bucket);
        for bucket in &self.buckets {
            bucket.debug_validate_invariants();
        }
    }
}

impl<T: Clone> BucketArray<T> {
    /// Inserts `entry` into its bucket.
    ///
    /// The minimum triple moves to `entry` when the queue was empty before
    /// this insert or `entry` orders strictly before the recorded minimum.
    pub fn insert<C>(&mut self, entry: T, queue_was_empty: bool, cmp: &C)
    where
        C: CqComparator<T> + ?Sized,
    {
        let virtual_bin = cmp.virtual_bin_number(&entry);
        let index = self.physical_index(virtual_bin);
        if queue_was_empty || cmp.compare(&entry, &self.minimum_entry) == Ordering::Less {
            self.record_minimum(entry.clone(), virtual_bin, index);
        }
        self.buckets[index].insert(entry, cmp);
    }

    /// Pops the head of bucket `index` and records it as the minimum.
    pub fn take_from<C>(&mut self, index: usize, cmp: &C) -> Option<T>
    where
        C: CqComparator<T> + ?Sized,
    {
        let entry = self.buckets.get_mut(index)?.take_first()?;
        let virtual_bin = cmp.virtual_bin_number(&entry);
        self.record_minimum(entry.clone(), virtual_bin, index);
        Some(entry)
    }
}
