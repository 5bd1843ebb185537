use crate::error::LabError;
use combustlab_schemas::file_formats::LabSettingsFile;
use std::{fs, path::Path};

pub const SCHEMA_VERSION: &str = "1";

/// Reads a `combustlab.yaml` settings file.
pub fn load_settings(path: &Path) -> Result<LabSettingsFile, LabError> {
    let name = path.display().to_string();
    let content = fs::read_to_string(path).map_err(|e| LabError::FileIO(name.clone(), e))?;
    let settings: LabSettingsFile =
        serde_yaml::from_str(&content).map_err(|e| LabError::YamlParsing(name.clone(), e))?;
    if settings.schema_version != SCHEMA_VERSION {
        return Err(LabError::Validation(format!(
            "Unsupported schema_version '{}' in '{}'",
            settings.schema_version, name
        )));
    }
    Ok(settings)
}
