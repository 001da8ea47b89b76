//! Phase engine: interpolates a reading from the reference tables.

use chrono::{DateTime, Local, Utc};
use tracing::debug;

use crate::error::{EphemerisError, Result};
use crate::local_time::{to_display_instant, ZoneRules};
use crate::reading::{
    illuminated_fraction, julian_date, Eclipse, EventTime, MoonAge, PhaseReading, Terminator,
};
use crate::table::{EclipseTag, EphemerisTables, EventTable, ReferenceEvent};

/// Window of instants the tables can answer for: `start < t <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Coverage {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Coverage {
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start < instant && instant <= self.end
    }
}

/// Seconds from the previous and to the next anchor of each kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbours {
    pub since_new: f64,
    pub until_new: f64,
    pub since_full: f64,
    pub until_full: f64,
    pub since_quarter: f64,
    pub until_quarter: f64,
}

impl Neighbours {
    /// Position in the synodic cycle. Ties go to the earlier quarter of the
    /// cycle; exactly at a new moon the result wraps to 0.
    pub fn phase(&self) -> f64 {
        let phase = if self.until_full <= self.until_new {
            if self.until_quarter <= self.until_full {
                self.since_new / (self.since_new + self.until_quarter) * 0.25
            } else {
                self.since_quarter / (self.since_quarter + self.until_full) * 0.25 + 0.25
            }
        } else if self.until_quarter <= self.until_new {
            self.since_full / (self.since_full + self.until_quarter) * 0.25 + 0.5
        } else {
            self.since_quarter / (self.since_quarter + self.until_new) * 0.25 + 0.75
        };

        if phase >= 1.0 {
            phase - 1.0
        } else {
            phase
        }
    }
}

#[derive(Debug, Clone)]
pub struct Ephemeris {
    tables: EphemerisTables,
    coverage: Coverage,
}

impl Ephemeris {
    pub fn new(tables: EphemerisTables) -> Self {
        let starts = [
            tables.new_moons().first().at,
            tables.full_moons().first().at,
            tables.first_quarters().first().at,
            tables.last_quarters().first().at,
        ];
        let ends = [
            tables.new_moons().last().at,
            tables.full_moons().last().at,
            tables.first_quarters().last().at,
            tables.last_quarters().last().at,
        ];
        let coverage = Coverage {
            start: starts.into_iter().max().unwrap_or(starts[0]),
            end: ends.into_iter().min().unwrap_or(ends[0]),
        };

        Self { tables, coverage }
    }

    pub fn tables(&self) -> &EphemerisTables {
        &self.tables
    }

    pub fn coverage(&self) -> Coverage {
        self.coverage
    }

    /// Reading at `instant`, with event times shown in the system time zone.
    pub fn compute_phase(&self, instant: DateTime<Utc>) -> Result<PhaseReading> {
        self.compute_phase_in(instant, &Local)
    }

    pub fn compute_phase_in<Z: ZoneRules + ?Sized>(
        &self,
        instant: DateTime<Utc>,
        zone: &Z,
    ) -> Result<PhaseReading> {
        if !self.coverage.contains(instant) {
            return Err(self.out_of_range(instant));
        }

        let t = instant.timestamp();
        let tables = &self.tables;
        let new_moons = tables.new_moons();
        let full_moons = tables.full_moons();

        let previous_new = self.require(new_moons.previous_at(t), instant)?;
        let next_new = self.require(new_moons.next_at(t), instant)?;
        let previous_full = self.require(full_moons.previous_at(t), instant)?;
        let next_full = self.require(full_moons.next_at(t), instant)?;
        let previous_quarter = self.require(
            max_opt(
                tables.first_quarters().previous_at(t).map(ReferenceEvent::timestamp),
                tables.last_quarters().previous_at(t).map(ReferenceEvent::timestamp),
            ),
            instant,
        )?;
        let next_quarter = self.require(
            min_opt(
                tables.first_quarters().next_at(t).map(ReferenceEvent::timestamp),
                tables.last_quarters().next_at(t).map(ReferenceEvent::timestamp),
            ),
            instant,
        )?;

        let neighbours = Neighbours {
            since_new: (t - previous_new.timestamp()) as f64,
            until_new: (next_new.timestamp() - t) as f64,
            since_full: (t - previous_full.timestamp()) as f64,
            until_full: (next_full.timestamp() - t) as f64,
            since_quarter: (t - previous_quarter) as f64,
            until_quarter: (next_quarter - t) as f64,
        };
        let phase = neighbours.phase();

        debug!(
            target: "phase_calculation",
            "phase {:.4} at {} ({:?})",
            phase,
            instant,
            neighbours
        );

        Ok(PhaseReading {
            instant,
            phase,
            illuminated: illuminated_fraction(phase),
            age: MoonAge::from_seconds(t - previous_new.timestamp()),
            lunation: tables.first_lunation() - 1 + new_moons.count_before(t) as i64,
            julian_date: julian_date(instant),
            terminator: Terminator::from_phase(phase),
            next_new_moon: event_time(next_new.at, t, zone),
            next_full_moon: event_time(next_full.at, t, zone),
            next_lunar_eclipse: next_eclipse(full_moons, t, zone),
            next_solar_eclipse: next_eclipse(new_moons, t, zone),
            previous_lunar_eclipse: previous_eclipse(full_moons, t, zone),
            previous_solar_eclipse: previous_eclipse(new_moons, t, zone),
        })
    }

    fn require<T>(&self, found: Option<T>, instant: DateTime<Utc>) -> Result<T> {
        found.ok_or_else(|| self.out_of_range(instant))
    }

    fn out_of_range(&self, instant: DateTime<Utc>) -> EphemerisError {
        EphemerisError::OutOfRange {
            instant,
            start: self.coverage.start,
            end: self.coverage.end,
        }
    }
}

fn event_time<Z: ZoneRules + ?Sized>(at: DateTime<Utc>, now: i64, zone: &Z) -> EventTime {
    EventTime {
        utc: at,
        local: to_display_instant(at, zone),
        seconds_until: at.timestamp() - now,
    }
}

fn next_eclipse<T: EclipseTag, Z: ZoneRules + ?Sized>(
    table: &EventTable<T>,
    now: i64,
    zone: &Z,
) -> Option<Eclipse<T>> {
    table.next_eclipse(now).map(|(event, kind)| Eclipse {
        kind,
        time: event_time(event.at, now, zone),
    })
}

fn previous_eclipse<T: EclipseTag, Z: ZoneRules + ?Sized>(
    table: &EventTable<T>,
    now: i64,
    zone: &Z,
) -> Option<Eclipse<T>> {
    table.previous_eclipse(now).map(|(event, kind)| Eclipse {
        kind,
        time: event_time(event.at, now, zone),
    })
}

fn min_opt(a: Option<i64>, b: Option<i64>) -> Option<i64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

fn max_opt(a: Option<i64>, b: Option<i64>) -> Option<i64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use chrono::{FixedOffset, NaiveDateTime};

    const TABLE: &str = "\
lunation 1206

[new]
2020-06-21 06:41 A
2020-07-20 17:33
2020-08-19 02:41

[full]
2020-06-05 19:12 n
2020-07-05 04:44 n
2020-08-03 15:59

[first_quarter]
2020-05-30 03:30
2020-06-28 08:16
2020-07-27 12:32

[last_quarter]
2020-06-13 06:24
2020-07-12 23:29
2020-08-11 16:45
";

    fn engine() -> Ephemeris {
        Ephemeris::new(EphemerisTables::parse(TABLE).unwrap())
    }

    fn at(s: &str) -> DateTime<Utc> {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
            .unwrap()
            .and_utc()
    }

    fn utc_zone() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[test]
    fn coverage_is_the_overlap_of_all_tables() {
        let coverage = engine().coverage();
        assert_eq!(coverage.start, at("2020-06-21 06:41:00"));
        assert_eq!(coverage.end, at("2020-07-27 12:32:00"));
        assert!(!coverage.contains(coverage.start));
        assert!(coverage.contains(coverage.end));
    }

    #[test]
    fn phase_hits_each_quarter_exactly() {
        let e = engine();
        let zone = utc_zone();
        let cases = [
            ("2020-06-28 08:16:00", 0.25),
            ("2020-07-05 04:44:00", 0.5),
            ("2020-07-12 23:29:00", 0.75),
            ("2020-07-20 17:33:00", 0.0),
        ];
        for (instant, expected) in cases {
            let reading = e.compute_phase_in(at(instant), &zone).unwrap();
            assert_abs_diff_eq!(reading.phase, expected, epsilon = 1e-12);
        }
    }

    #[test]
    fn phase_interpolates_between_anchors() {
        let e = engine();
        // Halfway between new moon 06-21 06:41 and first quarter 06-28 08:16.
        let new = at("2020-06-21 06:41:00").timestamp();
        let quarter = at("2020-06-28 08:16:00").timestamp();
        let mid = DateTime::from_timestamp((new + quarter) / 2, 0).unwrap();
        let reading = e.compute_phase_in(mid, &utc_zone()).unwrap();
        assert_abs_diff_eq!(reading.phase, 0.125, epsilon = 1e-6);
    }

    #[test]
    fn tie_breaks_toward_the_waxing_branch() {
        let n = Neighbours {
            since_new: 10.0,
            until_new: 5.0,
            since_full: 10.0,
            until_full: 5.0,
            since_quarter: 10.0,
            until_quarter: 5.0,
        };
        // All three equal: new -> first quarter branch.
        assert_abs_diff_eq!(n.phase(), 10.0 / 15.0 * 0.25, epsilon = 1e-12);

        let n = Neighbours {
            until_quarter: 6.0,
            ..n
        };
        // Full and new tie, quarter later: first quarter -> full branch.
        assert_abs_diff_eq!(n.phase(), 10.0 / 15.0 * 0.25 + 0.25, epsilon = 1e-12);
    }

    #[test]
    fn out_of_range_at_and_beyond_edges() {
        let e = engine();
        let zone = utc_zone();
        assert!(matches!(
            e.compute_phase_in(at("2020-06-21 06:41:00"), &zone),
            Err(EphemerisError::OutOfRange { .. })
        ));
        assert!(matches!(
            e.compute_phase_in(at("2020-07-27 12:32:01"), &zone),
            Err(EphemerisError::OutOfRange { .. })
        ));
        assert!(e.compute_phase_in(at("2020-06-21 06:41:01"), &zone).is_ok());
    }

    #[test]
    fn eclipses_forward_and_backward() {
        let e = engine();
        let reading = e
            .compute_phase_in(at("2020-07-01 00:00:00"), &utc_zone())
            .unwrap();

        let next = reading.next_lunar_eclipse.unwrap();
        assert_eq!(next.time.utc, at("2020-07-05 04:44:00"));
        assert!(next.time.seconds_until > 0);

        let previous = reading.previous_lunar_eclipse.unwrap();
        assert_eq!(previous.time.utc, at("2020-06-05 19:12:00"));
        assert!(previous.time.seconds_until < 0);

        let solar = reading.previous_solar_eclipse.unwrap();
        assert_eq!(solar.time.utc, at("2020-06-21 06:41:00"));
        assert!(reading.next_solar_eclipse.is_none());
    }

    #[test]
    fn lunation_counts_new_moons_passed() {
        let e = engine();
        let zone = utc_zone();
        let before = e.compute_phase_in(at("2020-07-20 17:33:00"), &zone).unwrap();
        let after = e.compute_phase_in(at("2020-07-20 17:33:01"), &zone).unwrap();
        assert_eq!(before.lunation, 1206);
        assert_eq!(after.lunation, 1207);
    }

    #[test]
    fn event_times_use_the_given_zone() {
        let e = engine();
        let zone = FixedOffset::east_opt(9 * 3600).unwrap();
        let reading = e.compute_phase_in(at("2020-07-01 00:00:00"), &zone).unwrap();
        let full = reading.next_full_moon;
        assert_eq!(full.local.offset().local_minus_utc(), 9 * 3600);
        assert_eq!(full.local.timestamp(), full.utc.timestamp());
        assert_eq!(full.seconds_until, 4 * 86_400 + 4 * 3600 + 44 * 60);
    }
}
