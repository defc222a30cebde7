/// Point-in-time copy of a queue's counters plus gauges.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CalendarQueueMetricsSnapshot {
    pub put_calls: u64,

    pub take_calls: u64,
    pub take_empty: u64,

    pub get_calls: u64,
    pub get_cache_hits: u64,

    pub remove_calls: u64,
    pub remove_found: u64,

    pub contains_calls: u64,
    pub contains_found: u64,
    pub to_vec_calls: u64,

    pub min_searches: u64,
    pub min_search_steps: u64, // buckets inspected across all searches
    pub min_search_exact: u64,
    pub min_search_fallback: u64,

    pub grow_events: u64,
    pub shrink_events: u64,
    pub rebucketed_entries: u64,
    pub bin_width_updates: u64,

    pub clear_calls: u64,

    // gauges captured at snapshot time
    pub len: usize,
    pub bucket_count: usize,
}

impl CalendarQueueMetricsSnapshot {
    /// Average buckets inspected per minimum search.
    pub fn avg_search_steps(&self) -> f64 {
        if self.min_searches == 0 {
            return 0.0;
        }
        self.min_search_steps as f64 / self.min_searches as f64
    }

    /// Fraction of minimum searches resolved inside the current year.
    pub fn exact_hit_ratio(&self) -> f64 {
        if self.min_searches == 0 {
            return 0.0;
        }
        self.min_search_exact as f64 / self.min_searches as f64
    }
}
