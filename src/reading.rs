//! Result values of a phase query.

use std::f64::consts::PI;
use std::fmt;

use chrono::{DateTime, FixedOffset, Utc};

use crate::table::{LunarEclipse, SolarEclipse, SECONDS_PER_DAY};

/// Seconds either side of a lunar eclipse during which the disk is drawn
/// reddened.
pub const ECLIPSE_WINDOW_SECS: i64 = 7_200;

/// Julian date of the Unix epoch.
pub const UNIX_EPOCH_JD: f64 = 2_440_587.5;

/// Everything known about the Moon at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseReading {
    pub instant: DateTime<Utc>,
    /// Position in the synodic cycle, `0.0 <= phase < 1.0`, 0 at new moon.
    pub phase: f64,
    /// Estimated lit fraction of the visible disk.
    pub illuminated: f64,
    pub age: MoonAge,
    pub lunation: i64,
    pub julian_date: f64,
    pub terminator: Terminator,
    pub next_new_moon: EventTime,
    pub next_full_moon: EventTime,
    pub next_lunar_eclipse: Option<Eclipse<LunarEclipse>>,
    pub next_solar_eclipse: Option<Eclipse<SolarEclipse>>,
    pub previous_lunar_eclipse: Option<Eclipse<LunarEclipse>>,
    pub previous_solar_eclipse: Option<Eclipse<SolarEclipse>>,
}

impl PhaseReading {
    pub fn phase_name(&self) -> PhaseName {
        PhaseName::from_phase(self.phase)
    }

    /// Distance in seconds to the closest lunar eclipse on either side.
    pub fn nearest_lunar_eclipse_secs(&self) -> Option<i64> {
        [&self.next_lunar_eclipse, &self.previous_lunar_eclipse]
            .into_iter()
            .flatten()
            .map(|e| e.time.seconds_until.abs())
            .min()
    }

    pub fn in_lunar_eclipse_window(&self) -> bool {
        self.nearest_lunar_eclipse_secs()
            .is_some_and(|secs| secs <= ECLIPSE_WINDOW_SECS)
    }
}

/// A tabulated event placed relative to the query instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventTime {
    pub utc: DateTime<Utc>,
    /// Wall-clock rendering using the offset in force at `utc`.
    pub local: DateTime<FixedOffset>,
    /// Negative for events already past.
    pub seconds_until: i64,
}

impl EventTime {
    pub fn days_until(&self) -> f64 {
        self.seconds_until as f64 / SECONDS_PER_DAY as f64
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Eclipse<T> {
    pub kind: T,
    pub time: EventTime,
}

/// Time since the last new moon, each unit truncated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoonAge {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
}

impl MoonAge {
    pub fn from_seconds(elapsed: i64) -> Self {
        let days = elapsed.div_euclid(SECONDS_PER_DAY);
        let rest = elapsed.rem_euclid(SECONDS_PER_DAY);
        Self {
            days,
            hours: rest / 3_600,
            minutes: (rest % 3_600) / 60,
        }
    }

    pub fn as_seconds(&self) -> i64 {
        self.days * SECONDS_PER_DAY + self.hours * 3_600 + self.minutes * 60
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hemisphere {
    East,
    West,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolarLighting {
    Sunrise,
    Sunset,
}

/// Selenographic longitude of the terminator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Terminator {
    pub degrees: f64,
    pub hemisphere: Hemisphere,
    pub lighting: SolarLighting,
}

impl Terminator {
    pub fn from_phase(phase: f64) -> Self {
        // Fold order matters near 90 and 270 degrees.
        let mut longitude = 270.0 + phase * 360.0;
        if longitude >= 360.0 {
            longitude -= 360.0;
        }
        if longitude >= 270.0 {
            longitude -= 360.0;
        } else if longitude >= 180.0 {
            longitude -= 180.0;
        } else if longitude >= 90.0 {
            longitude -= 180.0;
        }
        longitude = -longitude;

        Self {
            degrees: longitude.abs(),
            hemisphere: if longitude < 0.0 {
                Hemisphere::West
            } else {
                Hemisphere::East
            },
            lighting: if phase >= 0.5 {
                SolarLighting::Sunset
            } else {
                SolarLighting::Sunrise
            },
        }
    }

    /// Longitude with east positive.
    pub fn signed_degrees(&self) -> f64 {
        match self.hemisphere {
            Hemisphere::East => self.degrees,
            Hemisphere::West => -self.degrees,
        }
    }
}

impl fmt::Display for Terminator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let side = match self.hemisphere {
            Hemisphere::East => "east",
            Hemisphere::West => "west",
        };
        let light = match self.lighting {
            SolarLighting::Sunrise => "Sunrise",
            SolarLighting::Sunset => "Sunset",
        };
        write!(f, "{:.1}\u{b0}{} ({})", self.degrees, side, light)
    }
}

/// Cosine estimate of the lit disk fraction; 0 at new moon, 1 at full.
pub fn illuminated_fraction(phase: f64) -> f64 {
    (((phase + 0.5) / 0.5 * PI).cos() + 1.0) * 0.5
}

pub fn julian_date(instant: DateTime<Utc>) -> f64 {
    UNIX_EPOCH_JD + instant.timestamp() as f64 / SECONDS_PER_DAY as f64
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhaseName {
    NewMoon,
    WaxingCrescent,
    FirstQuarter,
    WaxingGibbous,
    FullMoon,
    WaningGibbous,
    LastQuarter,
    WaningCrescent,
}

impl PhaseName {
    pub fn from_phase(phase: f64) -> Self {
        match phase {
            p if (0.0..0.025).contains(&p) => PhaseName::NewMoon,
            p if (0.025..0.225).contains(&p) => PhaseName::WaxingCrescent,
            p if (0.225..0.275).contains(&p) => PhaseName::FirstQuarter,
            p if (0.275..0.475).contains(&p) => PhaseName::WaxingGibbous,
            p if (0.475..0.525).contains(&p) => PhaseName::FullMoon,
            p if (0.525..0.735).contains(&p) => PhaseName::WaningGibbous,
            p if (0.735..0.775).contains(&p) => PhaseName::LastQuarter,
            p if (0.775..0.975).contains(&p) => PhaseName::WaningCrescent,
            _ => PhaseName::NewMoon,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PhaseName::NewMoon => "New Moon",
            PhaseName::WaxingCrescent => "Waxing Crescent",
            PhaseName::FirstQuarter => "First Quarter",
            PhaseName::WaxingGibbous => "Waxing Gibbous",
            PhaseName::FullMoon => "Full Moon",
            PhaseName::WaningGibbous => "Waning Gibbous",
            PhaseName::LastQuarter => "Last Quarter",
            PhaseName::WaningCrescent => "Waning Crescent",
        }
    }
}

impl fmt::Display for PhaseName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn illumination_endpoints() {
        assert_abs_diff_eq!(illuminated_fraction(0.0), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(illuminated_fraction(0.5), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(illuminated_fraction(0.25), 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(illuminated_fraction(0.75), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn age_truncates_each_unit() {
        // 1 day 23 h 59 min 59 s
        let age = MoonAge::from_seconds(2 * SECONDS_PER_DAY - 1);
        assert_eq!(
            age,
            MoonAge {
                days: 1,
                hours: 23,
                minutes: 59
            }
        );
        assert_eq!(age.as_seconds(), 2 * SECONDS_PER_DAY - 60);
        assert_eq!(MoonAge::from_seconds(59).as_seconds(), 0);
    }

    #[test]
    fn terminator_at_last_quarter() {
        // 270 + 270 = 540 -> 180 -> 0 -> -0
        let t = Terminator::from_phase(0.75);
        assert_abs_diff_eq!(t.degrees, 0.0, epsilon = 1e-12);
        assert_eq!(t.hemisphere, Hemisphere::East);
        assert_eq!(t.lighting, SolarLighting::Sunset);
    }

    #[test]
    fn terminator_folds() {
        // 270 -> -90 -> 90 east, morning terminator at new moon
        let t = Terminator::from_phase(0.0);
        assert_abs_diff_eq!(t.degrees, 90.0, epsilon = 1e-12);
        assert_eq!(t.hemisphere, Hemisphere::East);
        assert_eq!(t.lighting, SolarLighting::Sunrise);

        // 360 -> 0
        let t = Terminator::from_phase(0.25);
        assert_abs_diff_eq!(t.degrees, 0.0, epsilon = 1e-12);
        assert_eq!(t.lighting, SolarLighting::Sunrise);

        // 450 -> 90 -> -90 -> 90 east
        let t = Terminator::from_phase(0.5);
        assert_abs_diff_eq!(t.signed_degrees(), 90.0, epsilon = 1e-12);
        assert_eq!(t.lighting, SolarLighting::Sunset);

        // 306 -> 306 - 360 = -54 -> 54 east
        let t = Terminator::from_phase(0.1);
        assert_abs_diff_eq!(t.signed_degrees(), 54.0, epsilon = 1e-9);

        // 396 -> 36 -> -36 west
        let t = Terminator::from_phase(0.35);
        assert_eq!(t.hemisphere, Hemisphere::West);
        assert_abs_diff_eq!(t.degrees, 36.0, epsilon = 1e-9);

        // 522 -> 162 -> -18 -> 18 east
        let t = Terminator::from_phase(0.7);
        assert_abs_diff_eq!(t.signed_degrees(), 18.0, epsilon = 1e-9);

        // 558 -> 198 -> 18 -> -18 west
        let t = Terminator::from_phase(0.8);
        assert_abs_diff_eq!(t.signed_degrees(), -18.0, epsilon = 1e-9);
        assert_eq!(t.to_string(), "18.0\u{b0}west (Sunset)");
    }

    #[test]
    fn phase_names_cover_the_cycle() {
        assert_eq!(PhaseName::from_phase(0.0), PhaseName::NewMoon);
        assert_eq!(PhaseName::from_phase(0.1), PhaseName::WaxingCrescent);
        assert_eq!(PhaseName::from_phase(0.25), PhaseName::FirstQuarter);
        assert_eq!(PhaseName::from_phase(0.4), PhaseName::WaxingGibbous);
        assert_eq!(PhaseName::from_phase(0.5), PhaseName::FullMoon);
        assert_eq!(PhaseName::from_phase(0.6), PhaseName::WaningGibbous);
        assert_eq!(PhaseName::from_phase(0.75), PhaseName::LastQuarter);
        assert_eq!(PhaseName::from_phase(0.9), PhaseName::WaningCrescent);
        assert_eq!(PhaseName::from_phase(0.99), PhaseName::NewMoon);
        assert_eq!(PhaseName::WaningGibbous.to_string(), "Waning Gibbous");
    }

    #[test]
    fn waning_gibbous_runs_to_0_735() {
        assert_eq!(PhaseName::from_phase(0.525), PhaseName::WaningGibbous);
        assert_eq!(PhaseName::from_phase(0.73), PhaseName::WaningGibbous);
        assert_eq!(PhaseName::from_phase(0.7349), PhaseName::WaningGibbous);
        assert_eq!(PhaseName::from_phase(0.735), PhaseName::LastQuarter);
        assert_eq!(PhaseName::from_phase(0.7749), PhaseName::LastQuarter);
        assert_eq!(PhaseName::from_phase(0.775), PhaseName::WaningCrescent);
    }

    #[test]
    fn julian_date_of_known_instants() {
        assert_abs_diff_eq!(
            julian_date(DateTime::from_timestamp(0, 0).unwrap()),
            2_440_587.5,
            epsilon = 1e-9
        );
        // J2000.0 = 2000-01-01 12:00 TT, close enough in UTC for this check
        assert_abs_diff_eq!(
            julian_date(DateTime::from_timestamp(946_728_000, 0).unwrap()),
            2_451_545.0,
            epsilon = 1e-9
        );
    }
}
