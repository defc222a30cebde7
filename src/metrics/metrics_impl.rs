use crate::metrics::counter::ReadCounter;
use crate::metrics::snapshot::CalendarQueueMetricsSnapshot;
use crate::metrics::traits::{CalendarMetricsReadRecorder, CalendarMetricsRecorder};

#[derive(Debug, Default)]
pub struct CalendarQueueMetrics {
    pub put_calls: u64,
    pub take_calls: u64,
    pub take_empty: u64,
    pub get_calls: u64,
    pub get_cache_hits: u64,
    pub remove_calls: u64,
    pub remove_found: u64,
    pub contains_calls: ReadCounter,
    pub contains_found: ReadCounter,
    pub to_vec_calls: ReadCounter,
    pub min_searches: u64,
    pub min_search_steps: u64,
    pub min_search_exact: u64,
    pub min_search_fallback: u64,
    pub grow_events: u64,
    pub shrink_events: u64,
    pub rebucketed_entries: u64,
    pub bin_width_updates: u64,
    pub clear_calls: u64,
}

impl CalendarQueueMetrics {
    /// Copies every counter; gauges are filled in by the caller.
    pub fn snapshot(&self, len: usize, bucket_count: usize) -> CalendarQueueMetricsSnapshot {
        CalendarQueueMetricsSnapshot {
            put_calls: self.put_calls,
            take_calls: self.take_calls,
            take_empty: self.take_empty,
            get_calls: self.get_calls,
            get_cache_hits: self.get_cache_hits,
            remove_calls: self.remove_calls,
            remove_found: self.remove_found,
            contains_calls: self.contains_calls.get(),
            contains_found: self.contains_found.get(),
            to_vec_calls: self.to_vec_calls.get(),
            min_searches: self.min_searches,
            min_search_steps: self.min_search_steps,
            min_search_exact: self.min_search_exact,
            min_search_fallback: self.min_search_fallback,
            grow_events: self.grow_events,
            shrink_events: self.shrink_events,
            rebucketed_entries: self.rebucketed_entries,
            bin_width_updates: self.bin_width_updates,
            clear_calls: self.clear_calls,
            len,
            bucket_count,
        }
    }

    /// Zeroes every counter.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl CalendarMetricsRecorder for CalendarQueueMetrics {
    fn record_put_call(&mut self) {
        self.put_calls += 1;
    }

    fn record_take_call(&mut self) {
        self.take_calls += 1;
    }

    fn record_take_empty(&mut self) {
        self.take_empty += 1;
    }

    fn record_get_call(&mut self) {
        self.get_calls += 1;
    }

    fn record_get_cache_hit(&mut self) {
        self.get_cache_hits += 1;
    }

    fn record_remove_call(&mut self) {
        self.remove_calls += 1;
    }

    fn record_remove_found(&mut self) {
        self.remove_found += 1;
    }

    fn record_min_search(&mut self, steps: usize, exact: bool) {
        self.min_searches += 1;
        self.min_search_steps += steps as u64;
        if exact {
            self.min_search_exact += 1;
        } else {
            self.min_search_fallback += 1;
        }
    }

    fn record_grow(&mut self) {
        self.grow_events += 1;
    }

    fn record_shrink(&mut self) {
        self.shrink_events += 1;
    }

    fn record_rebucketed_entries(&mut self, count: usize) {
        self.rebucketed_entries += count as u64;
    }

    fn record_bin_width_update(&mut self) {
        self.bin_width_updates += 1;
    }

    fn record_clear(&mut self) {
        self.clear_calls += 1;
    }
}

impl CalendarMetricsReadRecorder for &CalendarQueueMetrics {
    fn record_contains_call(&self) {
        self.contains_calls.incr();
    }

    fn record_contains_found(&self) {
        self.contains_found.incr();
    }

    fn record_to_vec_call(&self) {
        self.to_vec_calls.incr();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn min_search_splits_exact_and_fallback() {
        let mut metrics = CalendarQueueMetrics::default();
        metrics.record_min_search(1, true);
        metrics.record_min_search(8, false);
        let snapshot = metrics.snapshot(3, 8);
        assert_eq!(snapshot.min_searches, 2);
        assert_eq!(snapshot.min_search_steps, 9);
        assert_eq!(snapshot.min_search_exact, 1);
        assert_eq!(snapshot.min_search_fallback, 1);
        assert_eq!(snapshot.len, 3);
        assert_eq!(snapshot.bucket_count, 8);
    }

    #[test]
    fn read_recorder_counts_through_shared_ref() {
        let metrics = CalendarQueueMetrics::default();
        (&metrics).record_contains_call();
        (&metrics).record_contains_found();
        (&metrics).record_to_vec_call();
        let snapshot = metrics.snapshot(0, 1);
        assert_eq!(snapshot.contains_calls, 1);
        assert_eq!(snapshot.contains_found, 1);
        assert_eq!(snapshot.to_vec_calls, 1);
    }

    #[test]
    fn reset_zeroes_all_counters() {
        let mut metrics = CalendarQueueMetrics::default();
        metrics.record_put_call();
        metrics.record_grow();
        metrics.record_rebucketed_entries(40);
        (&metrics).record_contains_call();
        metrics.reset();
        assert_eq!(metrics.snapshot(0, 2), CalendarQueueMetricsSnapshot {
            bucket_count: 2,
            ..Default::default()
        });
    }
}
