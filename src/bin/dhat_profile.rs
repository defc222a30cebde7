//! DHAT heap profiler for calqueue.
//!
//! Run with: cargo run --bin dhat_profile --release --features dhat-heap
//! View results: Open dhat-heap.json in <https://nnethercote.github.io/dh_view/dh_view.html>

#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use calqueue::comparator::{F64Comparator, KeyedComparator};
use calqueue::queue::CalendarQueue;
use calqueue::traits::CqComparator;

/// Simple XorShift64 RNG for deterministic workloads.
struct XorShift64 {
    state: u64,
}

impl XorShift64 {
    fn new(seed: u64) -> Self {
        Self { state: seed.max(1) }
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    fn next_f64(&mut self) -> f64 {
        const SCALE: f64 = 1.0 / (u64::MAX as f64);
        (self.next_u64() as f64) * SCALE
    }

    /// Exponential increment with mean 1.
    fn next_exp(&mut self) -> f64 {
        -(1.0 - self.next_f64()).max(f64::MIN_POSITIVE).ln()
    }
}

/// Classic hold model: take the minimum, reschedule it a random step later.
fn hold_workload<C: CqComparator<f64>>(queue: &mut CalendarQueue<f64, C>, operations: usize, seed: u64) {
    let mut rng = XorShift64::new(seed);
    for _ in 0..operations {
        let now = queue.take().unwrap_or(0.0);
        queue.put(now + rng.next_exp());
    }
}

/// Fill to `peak`, drain to empty; exercises grow and shrink rebuilds.
fn surge_workload<C: CqComparator<f64>>(queue: &mut CalendarQueue<f64, C>, peak: usize, seed: u64) {
    let mut rng = XorShift64::new(seed);
    let mut now = 0.0;
    for _ in 0..peak {
        now += rng.next_exp();
        queue.put(now);
    }
    while queue.take().is_ok() {}
}

fn profile_f64_hold() {
    println!("=== Profiling f64 hold model ===");
    let population = 4096;
    let operations = 200_000;

    let mut queue = CalendarQueue::new(F64Comparator::new());
    let mut rng = XorShift64::new(7);
    for _ in 0..population {
        queue.put(rng.next_exp() * population as f64);
    }

    hold_workload(&mut queue, operations, 42);

    println!("  Final size: {}", queue.len());
    println!("  Buckets: {}", queue.bucket_count());
}

fn profile_f64_surge() {
    println!("=== Profiling f64 surge ===");
    let mut queue = CalendarQueue::new(F64Comparator::new());

    for round in 0..4 {
        surge_workload(&mut queue, 50_000, 100 + round);
    }

    println!("  Final size: {}", queue.len());
    println!("  Buckets: {}", queue.bucket_count());
}

fn profile_keyed_churn() {
    println!("=== Profiling keyed churn ===");
    let operations = 100_000;

    let mut queue = CalendarQueue::new(KeyedComparator::new(|e: &(i64, u64)| e.0));
    let mut rng = XorShift64::new(99);
    for seq in 0..operations as u64 {
        let key = (rng.next_u64() % 10_000) as i64;
        queue.put((key, seq));
        if seq % 3 == 0 {
            let _ = queue.take();
        }
        if seq % 5 == 0 {
            queue.remove(&(key, seq));
        }
    }

    println!("  Final size: {}", queue.len());
    println!("  Approx bytes: {}", queue.approx_bytes());
}

fn main() {
    let _profiler = dhat::Profiler::new_heap();

    println!("calqueue DHAT Heap Profiling");
    println!("============================\n");

    profile_f64_hold();
    profile_f64_surge();
    profile_keyed_churn();

    println!("\n============================");
    println!("Profiling complete. Output written to dhat-heap.json");
}
