//! Table-driven lunar phase and eclipse almanac.
//!
//! Phase, illumination, age and upcoming events are interpolated from
//! tabulated new, full and quarter moon instants. See [`Ephemeris`] for the
//! single query entry point.

pub mod cache;
pub mod calculator;
pub mod config;
pub mod engine;
pub mod error;
pub mod loader;
pub mod local_time;
pub mod metrics;
pub mod prefs;
pub mod reading;
pub mod table;

pub use calculator::ParallelPhaseCalculator;
pub use config::AlmanacConfig;
pub use engine::{Coverage, Ephemeris};
pub use error::{EphemerisError, PrefsError, Result};
pub use local_time::{to_display_instant, to_local_display_instant, ZoneRules};
pub use prefs::{HemisphereView, ViewPreferences};
pub use reading::{
    Eclipse, EventTime, Hemisphere, MoonAge, PhaseName, PhaseReading, SolarLighting, Terminator,
};
pub use table::{EphemerisTables, EventKind, EventTable, LunarEclipse, ReferenceEvent, SolarEclipse};
