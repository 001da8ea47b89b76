use chrono::{DateTime, Utc};
use proptest::prelude::*;

use lunar_almanac::loader;

fn coverage_secs() -> (i64, i64) {
    let coverage = loader::bundled().unwrap().coverage();
    (coverage.start.timestamp() + 1, coverage.end.timestamp())
}

fn instant(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    #[test]
    fn phase_and_illumination_stay_in_range(offset in 0.0f64..1.0) {
        let (lo, hi) = coverage_secs();
        let t = lo + ((hi - lo) as f64 * offset) as i64;
        let reading = loader::bundled().unwrap().compute_phase_in(instant(t), &Utc).unwrap();

        prop_assert!((0.0..1.0).contains(&reading.phase), "phase {}", reading.phase);
        prop_assert!((0.0..=1.0).contains(&reading.illuminated));
        prop_assert!(reading.terminator.degrees >= 0.0 && reading.terminator.degrees <= 90.0);
    }

    #[test]
    fn age_truncates_time_since_new_moon(offset in 0.0f64..1.0) {
        let (lo, hi) = coverage_secs();
        let t = lo + ((hi - lo) as f64 * offset) as i64;
        let ephemeris = loader::bundled().unwrap();
        let reading = ephemeris.compute_phase_in(instant(t), &Utc).unwrap();

        let previous_new = ephemeris.tables().new_moons().previous_at(t).unwrap();
        let elapsed = t - previous_new.timestamp();
        prop_assert!(reading.age.as_seconds() <= elapsed);
        prop_assert!(elapsed - reading.age.as_seconds() < 60);
        prop_assert!(reading.age.hours < 24 && reading.age.minutes < 60);
    }

    #[test]
    fn phase_grows_within_a_lunation(offset in 0.0f64..1.0, gap in 1i64..(10 * 86_400)) {
        let (lo, hi) = coverage_secs();
        let t1 = lo + ((hi - lo) as f64 * offset) as i64;
        let t2 = (t1 + gap).min(hi);
        let ephemeris = loader::bundled().unwrap();
        let r1 = ephemeris.compute_phase_in(instant(t1), &Utc).unwrap();
        let r2 = ephemeris.compute_phase_in(instant(t2), &Utc).unwrap();

        // Both inside the same cycle and neither sitting on its closing new moon.
        prop_assume!(r1.lunation == r2.lunation && r2.phase > 0.0);
        prop_assert!(r1.phase <= r2.phase, "{} then {}", r1.phase, r2.phase);
    }
}
