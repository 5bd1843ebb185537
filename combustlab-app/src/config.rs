use anyhow::{Context, Result};
use combustlab_core::{energy::LhvTable, settings::load_settings};
use combustlab_schemas::file_formats::{LabSettingsFile, MdotScope, PlotSettings};
use std::path::{Path, PathBuf};

const DEFAULT_SETTINGS_FILE: &str = "combustlab.yaml";
const DEFAULT_DATA_DIR: &str = "data";

/// Resolved settings for one invocation.
pub struct LabConfig {
    pub data_dir: PathBuf,
    pub lhv: LhvTable,
    pub mdot_scope: MdotScope,
    pub plot: PlotSettings,
}

impl LabConfig {
    /// Loads an explicit settings file, or `./combustlab.yaml` if it exists, or defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => Some(PathBuf::from(DEFAULT_SETTINGS_FILE)).filter(|p| p.is_file()),
        };
        let Some(path) = path else {
            return Ok(Self::default());
        };

        println!("Loading settings from '{}'...", path.display());
        let settings = load_settings(&path)
            .with_context(|| format!("Failed to load settings from {:?}", path))?;
        Self::from_settings(settings)
    }

    fn from_settings(settings: LabSettingsFile) -> Result<Self> {
        let lhv = LhvTable::with_overrides(&settings.lhv_overrides)
            .context("Invalid LHV overrides in settings")?;
        Ok(Self {
            data_dir: PathBuf::from(settings.data_dir.as_deref().unwrap_or(DEFAULT_DATA_DIR)),
            lhv,
            mdot_scope: settings.mdot_scope,
            plot: settings.plot,
        })
    }
}

impl Default for LabConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            lhv: LhvTable::default(),
            mdot_scope: MdotScope::default(),
            plot: PlotSettings::default(),
        }
    }
}
