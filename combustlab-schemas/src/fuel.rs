//! Fuel and appliance catalogues used on the run input form.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Fuels with a tabulated lower heating value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KnownFuel {
    Wood,
    Briquettes,
    Bituminous,
    Smokeless,
    Sod,
    Firelighters,
}

impl KnownFuel {
    pub const ALL: [KnownFuel; 6] = [
        KnownFuel::Wood,
        KnownFuel::Briquettes,
        KnownFuel::Bituminous,
        KnownFuel::Smokeless,
        KnownFuel::Sod,
        KnownFuel::Firelighters,
    ];

    /// The lowercase label used in file names and configuration keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            KnownFuel::Wood => "wood",
            KnownFuel::Briquettes => "briquettes",
            KnownFuel::Bituminous => "bituminous",
            KnownFuel::Smokeless => "smokeless",
            KnownFuel::Sod => "sod",
            KnownFuel::Firelighters => "firelighters",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|fuel| fuel.as_str() == label.trim().to_lowercase())
    }
}

impl fmt::Display for KnownFuel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fuel that is not in the built-in table, entered by the operator together with its LHV.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomFuel {
    pub name: String,
    pub lhv_mj_per_kg: f64,
}

/// The primary fuel burned during a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FuelType {
    Known(KnownFuel),
    Other(CustomFuel),
}

impl FuelType {
    /// Label used in saved file names: lowercase, with spaces replaced by underscores.
    pub fn label(&self) -> String {
        match self {
            FuelType::Known(fuel) => fuel.as_str().to_string(),
            FuelType::Other(custom) => custom.name.trim().to_lowercase().replace(' ', "_"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Appliance {
    OpenFireplace,
    ClosedStove,
}

impl Appliance {
    pub const ALL: [Appliance; 2] = [Appliance::OpenFireplace, Appliance::ClosedStove];

    pub fn display_name(&self) -> &'static str {
        match self {
            Appliance::OpenFireplace => "open fireplace",
            Appliance::ClosedStove => "closed stove",
        }
    }

    pub fn label(&self) -> String {
        self.display_name().replace(' ', "_").to_lowercase()
    }
}

impl fmt::Display for Appliance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_fuel_label_is_trimmed_and_snake_cased() {
        let fuel = FuelType::Other(CustomFuel {
            name: "  Peat Logs ".to_string(),
            lhv_mj_per_kg: 15.0,
        });
        assert_eq!(fuel.label(), "peat_logs");
    }

    #[test]
    fn appliance_labels() {
        assert_eq!(Appliance::OpenFireplace.label(), "open_fireplace");
        assert_eq!(Appliance::ClosedStove.label(), "closed_stove");
    }

    #[test]
    fn known_fuel_lookup_ignores_case() {
        assert_eq!(KnownFuel::from_label("Smokeless"), Some(KnownFuel::Smokeless));
        assert_eq!(KnownFuel::from_label("peat"), None);
    }
}
