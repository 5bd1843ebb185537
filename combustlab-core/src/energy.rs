//! Lower heating values and the energy / emission factor arithmetic.

use crate::error::LabError;
use combustlab_schemas::{
    fuel::{FuelType, KnownFuel},
    run::{EnergyResult, PmEmissionFactor, RunInput},
};
use std::collections::{BTreeMap, HashMap};

/// Lower heating values in MJ/kg for the tabulated fuels.
#[derive(Debug, Clone, PartialEq)]
pub struct LhvTable {
    values: HashMap<KnownFuel, f64>,
}

impl Default for LhvTable {
    fn default() -> Self {
        let values = KnownFuel::ALL
            .iter()
            .map(|fuel| (*fuel, builtin_lhv(*fuel)))
            .collect();
        Self { values }
    }
}

fn builtin_lhv(fuel: KnownFuel) -> f64 {
    match fuel {
        KnownFuel::Briquettes => 21.716,
        KnownFuel::Wood => 18.401,
        KnownFuel::Bituminous => 33.176,
        KnownFuel::Smokeless => 33.096,
        KnownFuel::Sod => 20.918,
        KnownFuel::Firelighters => 33.891,
    }
}

impl LhvTable {
    /// Built-in table with recalibrated values from the settings file applied on top.
    ///
    /// # Errors
    ///
    /// Returns `LabError::Validation` for an unknown fuel label or a value that is not
    /// a positive, finite number.
    pub fn with_overrides(overrides: &BTreeMap<String, f64>) -> Result<Self, LabError> {
        let mut table = Self::default();
        for (label, value) in overrides {
            let fuel = KnownFuel::from_label(label).ok_or_else(|| {
                LabError::Validation(format!("Unknown fuel '{}' in LHV overrides", label))
            })?;
            if !value.is_finite() || *value <= 0.0 {
                return Err(LabError::Validation(format!(
                    "LHV override for '{}' must be a positive number, got {}",
                    label, value
                )));
            }
            table.values.insert(fuel, *value);
        }
        Ok(table)
    }

    pub fn lhv(&self, fuel: KnownFuel) -> f64 {
        self.values
            .get(&fuel)
            .copied()
            .unwrap_or_else(|| builtin_lhv(fuel))
    }

    /// LHV of the primary fuel; custom fuels carry their own value.
    pub fn fuel_lhv(&self, fuel_type: &FuelType) -> Result<f64, LabError> {
        match fuel_type {
            FuelType::Known(fuel) => Ok(self.lhv(*fuel)),
            FuelType::Other(custom) => {
                if custom.name.trim().is_empty() || custom.lhv_mj_per_kg == 0.0 {
                    return Err(LabError::Validation(
                        "Please enter both a fuel name and LHV value for custom fuel.".to_string(),
                    ));
                }
                Ok(custom.lhv_mj_per_kg)
            }
        }
    }
}

/// Checks the form values before anything is computed or written.
pub fn validate_input(input: &RunInput) -> Result<(), LabError> {
    let masses = [
        ("Fuel mass", input.fuel_mass_kg),
        ("Firelighter mass", input.firelighter_mass_kg),
        ("Kindling mass", input.kindling_mass_kg),
        ("Measured PM mass", input.pm_mass_g),
    ];
    for (name, value) in masses {
        if !value.is_finite() || value < 0.0 {
            return Err(LabError::Validation(format!(
                "{} must be a non-negative number, got {}",
                name, value
            )));
        }
    }
    if let FuelType::Other(custom) = &input.fuel_type {
        if custom.name.trim().is_empty() || !(custom.lhv_mj_per_kg > 0.0) {
            return Err(LabError::Validation(
                "Please enter both a fuel name and LHV value for custom fuel.".to_string(),
            ));
        }
    }
    Ok(())
}

/// Total energy loaded into the appliance, in MJ.
///
/// Firelighters are always charged at the firelighter LHV whatever the primary fuel is.
pub fn compute_energy(
    table: &LhvTable,
    fuel_type: &FuelType,
    fuel_mass_kg: f64,
    firelighter_mass_kg: f64,
) -> Result<f64, LabError> {
    let lhv_fuel = table.fuel_lhv(fuel_type)?;
    let lhv_firelighter = table.lhv(KnownFuel::Firelighters);
    Ok(lhv_fuel * fuel_mass_kg + lhv_firelighter * firelighter_mass_kg)
}

pub fn compute_pm_ef(pm_mass_g: f64, total_energy_mj: f64) -> PmEmissionFactor {
    if total_energy_mj == 0.0 {
        PmEmissionFactor::ZeroEnergy
    } else {
        PmEmissionFactor::Computed(pm_mass_g / total_energy_mj)
    }
}

/// Validates the input and derives both energy quantities for a run.
pub fn evaluate(table: &LhvTable, input: &RunInput) -> Result<EnergyResult, LabError> {
    validate_input(input)?;
    let total_energy_mj = compute_energy(
        table,
        &input.fuel_type,
        input.fuel_mass_kg,
        input.firelighter_mass_kg,
    )?;
    Ok(EnergyResult {
        total_energy_mj,
        pm_emission_factor: compute_pm_ef(input.pm_mass_g, total_energy_mj),
    })
}

/// Rounds half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
