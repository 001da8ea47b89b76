//! View preferences for the front end. The engine never reads these.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::PrefsError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HemisphereView {
    #[default]
    North,
    South,
}

impl HemisphereView {
    pub fn toggled(self) -> Self {
        match self {
            HemisphereView::North => HemisphereView::South,
            HemisphereView::South => HemisphereView::North,
        }
    }
}

/// Persisted as `{"hemisphereView": "north"|"south", "showGrid": bool}`.
/// Missing keys fall back to their defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewPreferences {
    #[serde(rename = "hemisphereView")]
    pub hemisphere_view: HemisphereView,
    #[serde(rename = "showGrid")]
    pub show_grid: bool,
}

impl ViewPreferences {
    pub fn load(path: &Path) -> Result<Self, PrefsError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Like [`load`](Self::load), but any failure yields the defaults.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(prefs) => prefs,
            Err(e) => {
                warn!("Using default view preferences ({}): {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), PrefsError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string(self)?)?;
        Ok(())
    }

    pub fn toggle_hemisphere(&mut self) {
        self.hemisphere_view = self.hemisphere_view.toggled();
    }

    pub fn toggle_grid(&mut self) {
        self.show_grid = !self.show_grid;
    }

    /// Grid compass letters, top/bottom/left/right. The southern view is
    /// the northern one turned upside down.
    pub fn compass_labels(&self) -> &'static str {
        match self.hemisphere_view {
            HemisphereView::North => "NSEW",
            HemisphereView::South => "SNWE",
        }
    }
}
