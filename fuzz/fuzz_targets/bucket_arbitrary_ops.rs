#![no_main]

use std::cmp::Ordering;

use calqueue::ds::Bucket;
use calqueue::traits::CqComparator;
use libfuzzer_sys::fuzz_target;

struct ByKey;

impl CqComparator<(u8, u32)> for ByKey {
    fn compare(&self, a: &(u8, u32), b: &(u8, u32)) -> Ordering {
        a.0.cmp(&b.0)
    }

    fn virtual_bin_number(&self, entry: &(u8, u32)) -> i64 {
        entry.0 as i64
    }

    fn set_zero_reference(&mut self, _entry: &(u8, u32)) {}

    fn set_bin_width(&mut self, _sample: Option<&[(u8, u32)]>) {}
}

// Fuzz arbitrary operation sequences on Bucket
//
// Tests random sequences of insert, take_first, remove_first_match and
// contains, checking sortedness and FIFO order among equal keys.
fuzz_target!(|data: &[u8]| {
    let mut bucket = Bucket::new();
    let mut seq = 0u32;

    let mut idx = 0;
    while idx + 1 < data.len() {
        let op = data[idx] % 4;
        let key = data[idx + 1] % 32;

        match op {
            0 | 1 => {
                bucket.insert((key, seq), &ByKey);
                seq += 1;
            },
            2 => {
                let front = bucket.front().copied();
                assert_eq!(bucket.take_first(), front);
            },
            3 => {
                let target = bucket.iter().find(|e| e.0 == key).copied();
                if let Some(entry) = target {
                    assert!(bucket.contains(&entry));
                    assert_eq!(bucket.remove_first_match(&entry), Some(entry));
                }
            },
            _ => unreachable!(),
        }

        assert!(bucket.is_sorted_by(&ByKey));
        idx += 2;
    }

    let entries: Vec<_> = bucket.iter().copied().collect();
    for pair in entries.windows(2) {
        if pair[0].0 == pair[1].0 {
            assert!(pair[0].1 < pair[1].1, "equal keys out of insertion order");
        }
    }
    bucket.debug_validate_invariants();
});
