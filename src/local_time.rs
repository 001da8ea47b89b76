//! Conversion of table instants to wall-clock display time.
//!
//! The offset applied is the one in force *at the converted instant*, so an
//! event months away is shown under whatever daylight-saving rule will hold
//! then, not the rule in effect when the query was made.

use chrono::{DateTime, FixedOffset, Local, Offset, TimeZone, Utc};

/// Civil time rules: which UTC offset is observed at a given instant.
pub trait ZoneRules {
    fn offset_at(&self, utc: &DateTime<Utc>) -> FixedOffset;
}

impl ZoneRules for Local {
    fn offset_at(&self, utc: &DateTime<Utc>) -> FixedOffset {
        self.offset_from_utc_datetime(&utc.naive_utc()).fix()
    }
}

impl ZoneRules for Utc {
    fn offset_at(&self, _utc: &DateTime<Utc>) -> FixedOffset {
        Utc.fix()
    }
}

impl ZoneRules for FixedOffset {
    fn offset_at(&self, _utc: &DateTime<Utc>) -> FixedOffset {
        *self
    }
}

pub fn to_display_instant<Z: ZoneRules + ?Sized>(
    utc: DateTime<Utc>,
    zone: &Z,
) -> DateTime<FixedOffset> {
    utc.with_timezone(&zone.offset_at(&utc))
}

/// Display instant in the system time zone.
pub fn to_local_display_instant(utc: DateTime<Utc>) -> DateTime<FixedOffset> {
    to_display_instant(utc, &Local)
}
