use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Counters for range calculations and the reading cache.
#[derive(Default)]
pub struct Metrics {
    range_micros: AtomicU64,
    range_readings: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// One finished range run of `readings` readings.
    pub fn record_calculation(&self, duration: Duration, readings: u64) {
        let micros = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX);
        self.range_micros.fetch_add(micros, Ordering::Relaxed);
        self.range_readings.fetch_add(readings, Ordering::Relaxed);
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn cache_hits(&self) -> u64 {
        self.cache_hits.load(Ordering::Relaxed)
    }

    pub fn cache_misses(&self) -> u64 {
        self.cache_misses.load(Ordering::Relaxed)
    }

    /// Wall-clock µs per reading over all range runs, 0 before the first run.
    pub fn micros_per_reading(&self) -> f64 {
        match self.range_readings.load(Ordering::Relaxed) {
            0 => 0.0,
            n => self.range_micros.load(Ordering::Relaxed) as f64 / n as f64,
        }
    }

    pub fn cache_hit_rate(&self) -> f64 {
        let hits = self.cache_hits();
        match hits + self.cache_misses() {
            0 => 0.0,
            lookups => hits as f64 / lookups as f64,
        }
    }

    pub fn report(&self) -> String {
        format!(
            "Range readings: {} in {}µs ({:.1}µs per reading)\n\
             Reading cache: {} hits / {} misses ({:.2}% hit rate)",
            self.range_readings.load(Ordering::Relaxed),
            self.range_micros.load(Ordering::Relaxed),
            self.micros_per_reading(),
            self.cache_hits(),
            self.cache_misses(),
            self.cache_hit_rate() * 100.0
        )
    }
}
