use std::io::Write;
use std::sync::{Mutex, MutexGuard};

use crate::metrics::snapshot::CalendarQueueMetricsSnapshot;
use crate::metrics::traits::MetricsExporter;

/// Prometheus text exporter for queue metrics snapshots.
///
/// Writes the Prometheus text exposition format so the output can be scraped
/// by Prometheus or forwarded to an OpenTelemetry collector.
///
/// ```
/// use calqueue::metrics::exporter::PrometheusTextExporter;
/// use calqueue::metrics::snapshot::CalendarQueueMetricsSnapshot;
/// use calqueue::metrics::traits::MetricsExporter;
///
/// let exporter = PrometheusTextExporter::new("sched", Vec::new());
/// exporter.export(&CalendarQueueMetricsSnapshot { put_calls: 3, ..Default::default() });
/// let text = String::from_utf8(exporter.into_inner()).unwrap();
/// assert!(text.contains("sched_put_calls_total 3"));
/// ```
#[derive(Debug)]
pub struct PrometheusTextExporter<W: Write + Send + Sync> {
    prefix: String,
    writer: Mutex<W>,
}

impl<W: Write + Send + Sync> PrometheusTextExporter<W> {
    pub fn new(prefix: impl Into<String>, writer: W) -> Self {
        Self {
            prefix: prefix.into(),
            writer: Mutex::new(writer),
        }
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        match self.writer.into_inner() {
            Ok(writer) => writer,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn writer(&self) -> MutexGuard<'_, W> {
        match self.writer.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write_counter(&self, name: &str, value: u64) {
        let mut writer = self.writer();
        let _ = writeln!(writer, "# TYPE {} counter", name);
        let _ = writeln!(writer, "{} {}", name, value);
    }

    fn write_gauge(&self, name: &str, value: u64) {
        let mut writer = self.writer();
        let _ = writeln!(writer, "# TYPE {} gauge", name);
        let _ = writeln!(writer, "{} {}", name, value);
    }

    fn metric_name(&self, suffix: &str) -> String {
        if self.prefix.is_empty() {
            suffix.to_string()
        } else {
            format!("{}_{}", self.prefix, suffix)
        }
    }
}

impl<W: Write + Send + Sync> MetricsExporter<CalendarQueueMetricsSnapshot>
    for PrometheusTextExporter<W>
{
    fn export(&self, snapshot: &CalendarQueueMetricsSnapshot) {
        let counters = [
            ("put_calls_total", snapshot.put_calls),
            ("take_calls_total", snapshot.take_calls),
            ("take_empty_total", snapshot.take_empty),
            ("get_calls_total", snapshot.get_calls),
            ("get_cache_hits_total", snapshot.get_cache_hits),
            ("remove_calls_total", snapshot.remove_calls),
            ("remove_found_total", snapshot.remove_found),
            ("contains_calls_total", snapshot.contains_calls),
            ("contains_found_total", snapshot.contains_found),
            ("to_vec_calls_total", snapshot.to_vec_calls),
            ("min_searches_total", snapshot.min_searches),
            ("min_search_steps_total", snapshot.min_search_steps),
            ("min_search_exact_total", snapshot.min_search_exact),
            ("min_search_fallback_total", snapshot.min_search_fallback),
            ("grow_events_total", snapshot.grow_events),
            ("shrink_events_total", snapshot.shrink_events),
            ("rebucketed_entries_total", snapshot.rebucketed_entries),
            ("bin_width_updates_total", snapshot.bin_width_updates),
            ("clear_calls_total", snapshot.clear_calls),
        ];
        for (suffix, value) in counters {
            self.write_counter(&self.metric_name(suffix), value);
        }
        self.write_gauge(&self.metric_name("len"), snapshot.len as u64);
        self.write_gauge(
            &self.metric_name("bucket_count"),
            snapshot.bucket_count as u64,
        );
    }
}
