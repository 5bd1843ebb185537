use crate::fuel::{Appliance, FuelType};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Everything the operator enters for one combustion run.
///
/// Built fresh for every action; nothing about a run is kept in process-wide state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunInput {
    pub fuel_mass_kg: f64,
    pub firelighter_mass_kg: f64,
    pub kindling_mass_kg: f64,
    pub pm_mass_g: f64,
    pub fuel_type: FuelType,
    pub appliance: Appliance,
    pub date: NaiveDate,
}

/// Outcome of the particulate emission factor calculation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum PmEmissionFactor {
    /// PM mass divided by total energy, in g/MJ.
    Computed(f64),
    /// Total energy was zero, so no factor exists.
    ZeroEnergy,
}

impl PmEmissionFactor {
    pub fn value(&self) -> Option<f64> {
        match self {
            PmEmissionFactor::Computed(value) => Some(*value),
            PmEmissionFactor::ZeroEnergy => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnergyResult {
    pub total_energy_mj: f64,
    pub pm_emission_factor: PmEmissionFactor,
}
