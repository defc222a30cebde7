#![no_main]

use calqueue::comparator::KeyedComparator;
use calqueue::queue::CalendarQueue;
use libfuzzer_sys::fuzz_target;

// Fuzz arbitrary operation sequences on CalendarQueue
//
// Tests random sequences of put, take, get, remove, contains, snapshot and
// clear against a sorted reference vector.
fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }

    let min_buckets = (data[0] as usize % 16).max(1);
    let factor = (data[1] as usize % 4).max(1);
    let mut queue = CalendarQueue::with_buckets(
        KeyedComparator::new(|e: &(i64, u32)| e.0),
        min_buckets,
        factor,
    );
    let mut model: Vec<(i64, u32)> = Vec::new();
    let mut seq = 0u32;

    let mut idx = 2;
    while idx + 1 < data.len() {
        let op = data[idx] % 7;
        let key = (data[idx + 1] as i8 as i64) * 3;

        match op {
            0 | 1 => {
                let entry = (key, seq);
                seq += 1;
                queue.put(entry);
                let at = model.partition_point(|e| e.0 <= key);
                model.insert(at, entry);
            },
            2 => {
                let expected = if model.is_empty() {
                    None
                } else {
                    Some(model.remove(0))
                };
                assert_eq!(queue.take().ok(), expected);
            },
            3 => {
                assert_eq!(queue.get().ok().copied(), model.first().copied());
            },
            4 => {
                let target = model.iter().find(|e| e.0 == key).copied();
                if let Some(entry) = target {
                    assert_eq!(queue.remove(&entry), Some(entry));
                    model.retain(|e| *e != entry);
                } else {
                    assert_eq!(queue.remove(&(key, u32::MAX)), None);
                }
            },
            5 => {
                let limit = data[idx + 1] as usize % 8;
                let expected: Vec<_> = model.iter().take(limit).copied().collect();
                assert_eq!(queue.to_vec_limit(limit).ok(), Some(expected));
            },
            6 => {
                if data[idx + 1] % 16 == 0 {
                    queue.clear();
                    model.clear();
                }
            },
            _ => unreachable!(),
        }

        assert_eq!(queue.len(), model.len());
        idx += 2;
    }

    queue.debug_validate_invariants();
});
