use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How the fuel mass-loss rate is differenced when several runs are viewed together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MdotScope {
    /// Difference straight down the concatenated table, across file boundaries.
    #[default]
    Concatenated,
    /// Restart the difference at the first row of every source file.
    PerFile,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotSettings {
    pub width: u32,
    pub height: u32,
}

impl Default for PlotSettings {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 768,
        }
    }
}

/// The optional `combustlab.yaml` settings file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabSettingsFile {
    pub schema_version: String,
    #[serde(default)]
    pub data_dir: Option<String>,
    /// Replacement lower heating values in MJ/kg, keyed by fuel label.
    #[serde(default)]
    pub lhv_overrides: BTreeMap<String, f64>,
    #[serde(default)]
    pub mdot_scope: MdotScope,
    #[serde(default)]
    pub plot: PlotSettings,
}
