//! Deterministic, run-numbered names for saved result files.
//!
//! The run number starts at one more than the count of files already in the directory that
//! share the `{date}-{fuel}-{appliance}` prefix. The writer opens with create-new
//! semantics, so a name that is already taken (a gap left by a deleted run, or another
//! operator saving the same prefix at the same moment) moves on to the next number
//! instead of replacing the existing file.

use crate::error::LabError;
use chrono::NaiveDate;
use std::{
    fs, io,
    path::{Path, PathBuf},
};

pub const RESULT_EXTENSION: &str = "csv";

/// Run numbers tried past the first candidate before giving up.
pub const MAX_NAME_ATTEMPTS: usize = 100;

/// Lowercases and replaces spaces with underscores.
pub fn normalize_token(token: &str) -> String {
    token.replace(' ', "_").to_lowercase()
}

pub fn run_base_name(date: NaiveDate, fuel_label: &str, appliance: &str) -> String {
    format!(
        "{}-{}-{}",
        date.format("%d%m%Y"),
        normalize_token(fuel_label),
        normalize_token(appliance)
    )
}

/// Number of entries in `directory` that start with `base` and carry the result extension.
///
/// A directory that does not exist yet holds no runs.
pub fn count_existing_runs(directory: &Path, base: &str) -> Result<usize, LabError> {
    let entries = match fs::read_dir(directory) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(LabError::FileIO(directory.display().to_string(), e)),
    };
    let suffix = format!(".{}", RESULT_EXTENSION);
    let mut count = 0;
    for entry in entries {
        let entry = entry.map_err(|e| LabError::FileIO(directory.display().to_string(), e))?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with(base) && name.ends_with(&suffix) {
            count += 1;
        }
    }
    Ok(count)
}

pub fn run_filename(base: &str, run_index: usize) -> String {
    format!("{}-run{}.{}", base, run_index, RESULT_EXTENSION)
}

/// `{DDMMYYYY}-{fuel}-{appliance}-run{N}.csv` for the next run in `directory`.
pub fn next_filename(
    directory: &Path,
    date: NaiveDate,
    fuel_label: &str,
    appliance: &str,
) -> Result<String, LabError> {
    let base = run_base_name(date, fuel_label, appliance);
    let run_index = count_existing_runs(directory, &base)? + 1;
    Ok(run_filename(&base, run_index))
}

/// Writes a new run under the first free run number, starting from [`next_filename`].
///
/// `write` must create the file exclusively and fail with `LabError::FileIO` of kind
/// `AlreadyExists` when the name is taken; any other error is returned as-is.
pub fn write_next_run<F>(
    directory: &Path,
    date: NaiveDate,
    fuel_label: &str,
    appliance: &str,
    mut write: F,
) -> Result<(String, PathBuf), LabError>
where
    F: FnMut(&Path) -> Result<(), LabError>,
{
    let base = run_base_name(date, fuel_label, appliance);
    let first = count_existing_runs(directory, &base)? + 1;
    for run_index in first..=first + MAX_NAME_ATTEMPTS {
        let filename = run_filename(&base, run_index);
        let path = directory.join(&filename);
        match write(&path) {
            Ok(()) => return Ok((filename, path)),
            Err(LabError::FileIO(_, e)) if e.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e),
        }
    }
    Err(LabError::FileIO(
        directory.display().to_string(),
        io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("no free run number for '{}' after {} attempts", base, MAX_NAME_ATTEMPTS + 1),
        ),
    ))
}
