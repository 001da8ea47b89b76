//! Reference phase tables.
//!
//! A table set holds four chronologically sorted sequences of UTC instants
//! (new moons, full moons, first and last quarters). New and full moon rows
//! may carry an eclipse class. Tables are parsed from a small line-oriented
//! text format:
//!
//! ```text
//! version 2018.1
//! lunation 1176
//!
//! [new]
//! 2018-01-17 02:17
//! 2018-02-15 21:05 P
//!
//! [full]
//! 2018-01-31 13:27 t
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::error::{EphemerisError, Result};

pub const SECONDS_PER_DAY: i64 = 86_400;

/// Longest gap accepted between two consecutive new moons.
pub const MAX_LUNATION_SECS: i64 = 30 * SECONDS_PER_DAY;

/// `chrono` layout of a row timestamp (UTC, minute precision).
pub const ROW_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    NewMoon,
    FirstQuarter,
    FullMoon,
    LastQuarter,
}

impl EventKind {
    /// Section header naming this kind in a table file.
    pub fn section(&self) -> &'static str {
        match self {
            EventKind::NewMoon => "new",
            EventKind::FirstQuarter => "first_quarter",
            EventKind::FullMoon => "full",
            EventKind::LastQuarter => "last_quarter",
        }
    }

    pub fn from_section(name: &str) -> Option<Self> {
        match name {
            "new" => Some(EventKind::NewMoon),
            "first_quarter" => Some(EventKind::FirstQuarter),
            "full" => Some(EventKind::FullMoon),
            "last_quarter" => Some(EventKind::LastQuarter),
            _ => None,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventKind::NewMoon => "new moon",
            EventKind::FirstQuarter => "first quarter",
            EventKind::FullMoon => "full moon",
            EventKind::LastQuarter => "last quarter",
        };
        f.write_str(name)
    }
}

/// Eclipse class attached to a table row.
pub trait EclipseTag: Copy + fmt::Debug + PartialEq + Send + Sync + 'static {
    fn from_code(code: char) -> Option<Self>;
    fn code(self) -> char;
    fn label(self) -> &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SolarEclipse {
    Total,
    Annular,
    Hybrid,
    Partial,
}

impl EclipseTag for SolarEclipse {
    fn from_code(code: char) -> Option<Self> {
        match code {
            'T' => Some(SolarEclipse::Total),
            'A' => Some(SolarEclipse::Annular),
            'H' => Some(SolarEclipse::Hybrid),
            'P' => Some(SolarEclipse::Partial),
            _ => None,
        }
    }

    fn code(self) -> char {
        match self {
            SolarEclipse::Total => 'T',
            SolarEclipse::Annular => 'A',
            SolarEclipse::Hybrid => 'H',
            SolarEclipse::Partial => 'P',
        }
    }

    fn label(self) -> &'static str {
        match self {
            SolarEclipse::Total => "Total",
            SolarEclipse::Annular => "Annular",
            SolarEclipse::Hybrid => "Hybrid",
            SolarEclipse::Partial => "Partial",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LunarEclipse {
    Total,
    Partial,
    Penumbral,
}

impl EclipseTag for LunarEclipse {
    fn from_code(code: char) -> Option<Self> {
        match code {
            't' => Some(LunarEclipse::Total),
            'p' => Some(LunarEclipse::Partial),
            'n' => Some(LunarEclipse::Penumbral),
            _ => None,
        }
    }

    fn code(self) -> char {
        match self {
            LunarEclipse::Total => 't',
            LunarEclipse::Partial => 'p',
            LunarEclipse::Penumbral => 'n',
        }
    }

    fn label(self) -> &'static str {
        match self {
            LunarEclipse::Total => "Total",
            LunarEclipse::Partial => "Partial",
            LunarEclipse::Penumbral => "Penumbral",
        }
    }
}

/// Tag type for quarter rows, which never carry an eclipse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoEclipse {}

impl EclipseTag for NoEclipse {
    fn from_code(_code: char) -> Option<Self> {
        None
    }

    fn code(self) -> char {
        match self {}
    }

    fn label(self) -> &'static str {
        match self {}
    }
}

impl fmt::Display for SolarEclipse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl fmt::Display for LunarEclipse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferenceEvent<T> {
    pub at: DateTime<Utc>,
    pub eclipse: Option<T>,
}

impl<T> ReferenceEvent<T> {
    pub fn new(at: DateTime<Utc>, eclipse: Option<T>) -> Self {
        Self { at, eclipse }
    }

    pub fn timestamp(&self) -> i64 {
        self.at.timestamp()
    }
}

/// One sorted, non-empty sequence of reference events.
#[derive(Debug, Clone)]
pub struct EventTable<T> {
    kind: EventKind,
    events: Vec<ReferenceEvent<T>>,
}

impl<T: EclipseTag> EventTable<T> {
    pub fn new(kind: EventKind, events: Vec<ReferenceEvent<T>>) -> Result<Self> {
        if events.is_empty() {
            return Err(EphemerisError::MalformedTable {
                table: kind,
                reason: "table has no entries".to_string(),
            });
        }

        if let Some(pos) = events
            .windows(2)
            .position(|pair| pair[1].timestamp() <= pair[0].timestamp())
        {
            return Err(EphemerisError::MalformedTable {
                table: kind,
                reason: format!(
                    "entry {} ({}) does not follow {}",
                    pos + 1,
                    events[pos + 1].at,
                    events[pos].at
                ),
            });
        }

        Ok(Self { kind, events })
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn events(&self) -> &[ReferenceEvent<T>] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn first(&self) -> &ReferenceEvent<T> {
        &self.events[0]
    }

    pub fn last(&self) -> &ReferenceEvent<T> {
        &self.events[self.events.len() - 1]
    }

    /// Number of entries strictly before `t`, which is also the index of the
    /// first entry at or after `t`.
    pub fn count_before(&self, t: i64) -> usize {
        self.events.partition_point(|e| e.timestamp() < t)
    }

    /// First entry at or after `t`. An entry equal to `t` is "next".
    pub fn next_at(&self, t: i64) -> Option<&ReferenceEvent<T>> {
        self.events.get(self.count_before(t))
    }

    /// Last entry strictly before `t`.
    pub fn previous_at(&self, t: i64) -> Option<&ReferenceEvent<T>> {
        self.count_before(t)
            .checked_sub(1)
            .and_then(|idx| self.events.get(idx))
    }

    /// Nearest tagged entry at or after `t`.
    pub fn next_eclipse(&self, t: i64) -> Option<(&ReferenceEvent<T>, T)> {
        self.events[self.count_before(t)..]
            .iter()
            .find_map(|e| e.eclipse.map(|tag| (e, tag)))
    }

    /// Nearest tagged entry strictly before `t`.
    pub fn previous_eclipse(&self, t: i64) -> Option<(&ReferenceEvent<T>, T)> {
        self.events[..self.count_before(t)]
            .iter()
            .rev()
            .find_map(|e| e.eclipse.map(|tag| (e, tag)))
    }
}

/// The four reference tables plus the lunation anchor, validated together.
#[derive(Debug, Clone)]
pub struct EphemerisTables {
    version: Option<String>,
    first_lunation: i64,
    new_moons: EventTable<SolarEclipse>,
    full_moons: EventTable<LunarEclipse>,
    first_quarters: EventTable<NoEclipse>,
    last_quarters: EventTable<NoEclipse>,
}

impl EphemerisTables {
    /// `first_lunation` is the lunation number of the first new moon row.
    pub fn new(
        version: Option<String>,
        first_lunation: i64,
        new_moons: EventTable<SolarEclipse>,
        full_moons: EventTable<LunarEclipse>,
        first_quarters: EventTable<NoEclipse>,
        last_quarters: EventTable<NoEclipse>,
    ) -> Result<Self> {
        check_lunation_spans(&new_moons)?;
        check_quarters_alternate(&first_quarters, &last_quarters)?;

        Ok(Self {
            version,
            first_lunation,
            new_moons,
            full_moons,
            first_quarters,
            last_quarters,
        })
    }

    pub fn parse(text: &str) -> Result<Self> {
        let mut version = None;
        let mut first_lunation = None;
        let mut section: Option<EventKind> = None;
        let mut new_moons = Vec::new();
        let mut full_moons = Vec::new();
        let mut first_quarters = Vec::new();
        let mut last_quarters = Vec::new();
        let mut line_count = 0;

        for (idx, raw) in text.lines().enumerate() {
            let line_no = idx + 1;
            line_count = line_no;
            let line = raw.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }

            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                section = Some(EventKind::from_section(name.trim()).ok_or_else(|| {
                    EphemerisError::Parse {
                        line: line_no,
                        reason: format!("unknown section `{}`", name.trim()),
                    }
                })?);
                continue;
            }

            match section {
                None => parse_directive(line_no, line, &mut version, &mut first_lunation)?,
                Some(kind) => match kind {
                    EventKind::NewMoon => new_moons.push(parse_row(kind, line_no, line)?),
                    EventKind::FullMoon => full_moons.push(parse_row(kind, line_no, line)?),
                    EventKind::FirstQuarter => {
                        first_quarters.push(parse_row(kind, line_no, line)?)
                    }
                    EventKind::LastQuarter => last_quarters.push(parse_row(kind, line_no, line)?),
                },
            }
        }

        let first_lunation = first_lunation.ok_or_else(|| EphemerisError::Parse {
            line: line_count,
            reason: "reached end of table without a `lunation` directive".to_string(),
        })?;

        Self::new(
            version,
            first_lunation,
            EventTable::new(EventKind::NewMoon, new_moons)?,
            EventTable::new(EventKind::FullMoon, full_moons)?,
            EventTable::new(EventKind::FirstQuarter, first_quarters)?,
            EventTable::new(EventKind::LastQuarter, last_quarters)?,
        )
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn first_lunation(&self) -> i64 {
        self.first_lunation
    }

    pub fn new_moons(&self) -> &EventTable<SolarEclipse> {
        &self.new_moons
    }

    pub fn full_moons(&self) -> &EventTable<LunarEclipse> {
        &self.full_moons
    }

    pub fn first_quarters(&self) -> &EventTable<NoEclipse> {
        &self.first_quarters
    }

    pub fn last_quarters(&self) -> &EventTable<NoEclipse> {
        &self.last_quarters
    }

    pub fn entry_count(&self) -> usize {
        self.new_moons.len()
            + self.full_moons.len()
            + self.first_quarters.len()
            + self.last_quarters.len()
    }
}

impl FromStr for EphemerisTables {
    type Err = EphemerisError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

fn parse_directive(
    line_no: usize,
    line: &str,
    version: &mut Option<String>,
    first_lunation: &mut Option<i64>,
) -> Result<()> {
    let mut parts = line.split_whitespace();
    let (key, value) = match (parts.next(), parts.next(), parts.next()) {
        (Some(key), Some(value), None) => (key, value),
        _ => {
            return Err(EphemerisError::Parse {
                line: line_no,
                reason: format!("expected `key value`, found `{}`", line),
            })
        }
    };

    match key {
        "version" => *version = Some(value.to_string()),
        "lunation" => {
            let n = value.parse::<i64>().map_err(|e| EphemerisError::Parse {
                line: line_no,
                reason: format!("bad lunation number `{}`: {}", value, e),
            })?;
            *first_lunation = Some(n);
        }
        other => {
            return Err(EphemerisError::Parse {
                line: line_no,
                reason: format!("unknown directive `{}`", other),
            })
        }
    }
    Ok(())
}

fn parse_row<T: EclipseTag>(kind: EventKind, line_no: usize, line: &str) -> Result<ReferenceEvent<T>> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let (date, time, tag) = match parts.as_slice() {
        [date, time] => (*date, *time, None),
        [date, time, tag] => (*date, *time, Some(*tag)),
        _ => {
            return Err(EphemerisError::Parse {
                line: line_no,
                reason: format!("expected `YYYY-MM-DD HH:MM [tag]`, found `{}`", line),
            })
        }
    };

    let at = NaiveDateTime::parse_from_str(&format!("{} {}", date, time), ROW_FORMAT)
        .map_err(|e| EphemerisError::Parse {
            line: line_no,
            reason: format!("bad timestamp `{} {}`: {}", date, time, e),
        })?
        .and_utc();

    let eclipse = match tag {
        None => None,
        Some(code) => {
            let mut chars = code.chars();
            let tag = match (chars.next(), chars.next()) {
                (Some(c), None) => T::from_code(c),
                _ => None,
            };
            Some(tag.ok_or_else(|| EphemerisError::Parse {
                line: line_no,
                reason: format!("tag `{}` is not valid in [{}]", code, kind.section()),
            })?)
        }
    };

    Ok(ReferenceEvent::new(at, eclipse))
}

fn check_lunation_spans(new_moons: &EventTable<SolarEclipse>) -> Result<()> {
    for pair in new_moons.events().windows(2) {
        let span = pair[1].timestamp() - pair[0].timestamp();
        if span > MAX_LUNATION_SECS {
            return Err(EphemerisError::MalformedTable {
                table: new_moons.kind(),
                reason: format!(
                    "lunation from {} to {} spans {:.1} days",
                    pair[0].at,
                    pair[1].at,
                    span as f64 / SECONDS_PER_DAY as f64
                ),
            });
        }
    }
    Ok(())
}

fn check_quarters_alternate(
    first: &EventTable<NoEclipse>,
    last: &EventTable<NoEclipse>,
) -> Result<()> {
    let mut merged: Vec<(i64, EventKind)> = first
        .events()
        .iter()
        .map(|e| (e.timestamp(), first.kind()))
        .chain(
            last.events()
                .iter()
                .map(|e| (e.timestamp(), last.kind())),
        )
        .collect();
    merged.sort_by_key(|&(t, _)| t);

    for pair in merged.windows(2) {
        let ((t0, k0), (t1, k1)) = (pair[0], pair[1]);
        if t0 == t1 || k0 == k1 {
            return Err(EphemerisError::MalformedTable {
                table: k1,
                reason: format!(
                    "quarters at unix {} and {} do not alternate first/last",
                    t0, t1
                ),
            });
        }
    }
    Ok(())
}
