//! Getting an [`Ephemeris`] from the bundled table or a file on disk.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use lazy_static::lazy_static;
use memmap2::MmapOptions;
use tracing::info;

use crate::config::AlmanacConfig;
use crate::engine::Ephemeris;
use crate::error::{EphemerisError, Result};
use crate::table::EphemerisTables;

/// Reference events 2018-2024, shipped with the crate.
pub const BUNDLED_TABLE: &str = include_str!("../data/phases_2018_2024.txt");

lazy_static! {
    static ref BUNDLED: std::result::Result<Arc<Ephemeris>, String> = {
        let start = Instant::now();
        let parsed = EphemerisTables::parse(BUNDLED_TABLE).map(|tables| Arc::new(Ephemeris::new(tables)));
        if let Ok(ephemeris) = &parsed {
            info!(
                target: "table_loading",
                "Parsed bundled table ({} entries) in {}µs",
                ephemeris.tables().entry_count(),
                start.elapsed().as_micros()
            );
        }
        parsed.map_err(|e| e.to_string())
    };
}

/// The process-wide ephemeris built from [`BUNDLED_TABLE`], parsed on first use.
pub fn bundled() -> Result<Arc<Ephemeris>> {
    match &*BUNDLED {
        Ok(ephemeris) => Ok(Arc::clone(ephemeris)),
        Err(reason) => Err(EphemerisError::Bundled(reason.clone())),
    }
}

/// Parse a table file through a read-only memory map.
pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Ephemeris> {
    let path = path.as_ref();
    let start = Instant::now();
    let file = File::open(path)?;

    let mmap = unsafe { MmapOptions::new().map(&file).map_err(EphemerisError::Mmap)? };

    let text = std::str::from_utf8(&mmap).map_err(|e| EphemerisError::Parse {
        line: 1 + mmap[..e.valid_up_to()].iter().filter(|&&b| b == b'\n').count(),
        reason: "table is not valid UTF-8".to_string(),
    })?;
    let tables = EphemerisTables::parse(text)?;

    let duration = start.elapsed();
    info!(
        target: "table_loading",
        "Loaded table {} ({} entries) in {}µs using mmap",
        path.display(),
        tables.entry_count(),
        duration.as_micros()
    );

    Ok(Ephemeris::new(tables))
}

/// External table when one is configured, the bundled one otherwise.
pub fn from_config(config: &AlmanacConfig) -> Result<Arc<Ephemeris>> {
    match &config.table_path {
        Some(path) => load_file(path).map(Arc::new),
        None => bundled(),
    }
}
