use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Duration, SubsecRound, Utc};
use parking_lot::RwLock;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::cache::ReadingCache;
use crate::engine::Ephemeris;
use crate::error::{EphemerisError, Result};
use crate::metrics::Metrics;
use crate::reading::PhaseReading;

/// Shared front door to the engine: memoizes readings and computes runs of
/// them across the rayon pool.
pub struct ParallelPhaseCalculator {
    ephemeris: Arc<Ephemeris>,
    cache: Arc<RwLock<ReadingCache>>,
    metrics: Arc<Metrics>,
}

impl ParallelPhaseCalculator {
    pub fn new(
        ephemeris: Arc<Ephemeris>,
        cache: Arc<RwLock<ReadingCache>>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            ephemeris,
            cache,
            metrics,
        }
    }

    pub fn with_capacity(ephemeris: Arc<Ephemeris>, capacity: NonZeroUsize) -> Self {
        Self::new(
            ephemeris,
            Arc::new(RwLock::new(ReadingCache::new(capacity))),
            Arc::new(Metrics::new()),
        )
    }

    pub fn ephemeris(&self) -> &Ephemeris {
        &self.ephemeris
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Reading for the current second.
    pub fn now(&self) -> Result<PhaseReading> {
        self.reading_at(Utc::now().trunc_subsecs(0))
    }

    pub fn reading_at(&self, instant: DateTime<Utc>) -> Result<PhaseReading> {
        let key = instant.timestamp();
        // Only whole-second instants are cached.
        if instant.timestamp_subsec_nanos() == 0 {
            if let Some(reading) = self.cache.write().get_reading(key) {
                self.metrics.record_cache_hit();
                return Ok(reading);
            }
            self.metrics.record_cache_miss();
        }

        let reading = self.ephemeris.compute_phase(instant)?;
        if instant.timestamp_subsec_nanos() == 0 {
            debug!(target: "reading_cache", "caching reading for {}", instant);
            self.cache.write().put_reading(reading.clone());
        }
        Ok(reading)
    }

    /// `count` readings starting at `start`, `step` apart.
    pub fn calculate_range(
        &self,
        start: DateTime<Utc>,
        step: Duration,
        count: usize,
    ) -> Result<Vec<PhaseReading>> {
        let started = Instant::now();

        let results = (0..count)
            .into_par_iter()
            .map(|offset| self.reading_at(self.step_instant(start, step, offset)?))
            .collect::<Result<Vec<_>>>()?;

        let duration = started.elapsed();
        self.metrics.record_calculation(duration, count as u64);

        info!(
            target: "phase_calculation",
            "Calculated {} readings in {}µs",
            count,
            duration.as_micros()
        );

        Ok(results)
    }

    /// `start + step * offset`, or `OutOfRange` when that instant cannot be
    /// represented.
    fn step_instant(
        &self,
        start: DateTime<Utc>,
        step: Duration,
        offset: usize,
    ) -> Result<DateTime<Utc>> {
        i32::try_from(offset)
            .ok()
            .and_then(|n| step.checked_mul(n))
            .and_then(|delta| start.checked_add_signed(delta))
            .ok_or_else(|| {
                let coverage = self.ephemeris.coverage();
                EphemerisError::OutOfRange {
                    instant: start,
                    start: coverage.start,
                    end: coverage.end,
                }
            })
    }
}
