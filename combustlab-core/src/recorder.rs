//! One compute-and-save cycle for a run: energy, normalisation, naming and writing.

use crate::{
    energy::{self, LhvTable},
    error::{ComputationWarning, LabError},
    loader, naming,
    normalize::normalize,
    table::Table,
};
use combustlab_schemas::{
    columns,
    run::{EnergyResult, PmEmissionFactor, RunInput},
};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{info, warn};

const PREVIEW_ROWS: usize = 5;

/// What the operator sees after a run has been saved.
#[derive(Debug, Clone)]
pub struct SavedRunReport {
    pub filename: String,
    pub path: PathBuf,
    pub energy: EnergyResult,
    pub warnings: Vec<ComputationWarning>,
    pub preview: Table,
}

/// Validates the form, derives energy and emission factor, augments the raw export and
/// saves it under the next free run number in `data_dir`.
///
/// When total energy is zero the run is still saved, but the `PM EF (g/MJ)` cells are
/// blank and a warning is returned.
///
/// # Errors
///
/// Validation and parse failures abort before anything is written.
pub fn record_run(
    input: &RunInput,
    raw_file: Option<&Path>,
    data_dir: &Path,
    lhv: &LhvTable,
) -> Result<SavedRunReport, LabError> {
    let energy = energy::evaluate(lhv, input)?;
    let raw_file = raw_file
        .ok_or_else(|| LabError::Validation("Please upload a raw data file.".to_string()))?;
    let raw = loader::load_table(raw_file)?;

    let mut warnings = Vec::new();
    if energy.pm_emission_factor == PmEmissionFactor::ZeroEnergy {
        warn!("Total energy is zero, PM EF can't be computed");
        warnings.push(ComputationWarning::ZeroEnergy);
    }

    let augmented = augment(raw, input, &energy);
    let normalized = normalize(augmented);
    warnings.extend(normalized.warnings);

    fs::create_dir_all(data_dir)
        .map_err(|e| LabError::FileIO(data_dir.display().to_string(), e))?;
    let (filename, path) = naming::write_next_run(
        data_dir,
        input.date,
        &input.fuel_type.label(),
        &input.appliance.label(),
        |path| loader::write_csv(&normalized.table, path),
    )?;
    info!(file = %path.display(), rows = normalized.table.row_count(), "saved run");

    Ok(SavedRunReport {
        filename,
        path,
        energy,
        warnings,
        preview: normalized.table.head(PREVIEW_ROWS),
    })
}

/// Appends the form values and derived results as constant columns.
pub fn augment(mut table: Table, input: &RunInput, energy: &EnergyResult) -> Table {
    table.set_constant(columns::FUEL_MASS, Some(input.fuel_mass_kg));
    table.set_constant(columns::FIRELIGHTER_MASS, Some(input.firelighter_mass_kg));
    table.set_constant(columns::KINDLING_MASS, Some(input.kindling_mass_kg));
    table.set_constant(columns::PM_MASS, Some(input.pm_mass_g));
    table.set_constant(
        columns::TOTAL_ENERGY,
        Some(energy::round_to(energy.total_energy_mj, 3)),
    );
    table.set_constant(
        columns::PM_EF,
        energy
            .pm_emission_factor
            .value()
            .map(|ef| energy::round_to(ef, 6)),
    );
    table
}
