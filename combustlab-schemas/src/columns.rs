//! Column names shared by the normaliser, the run writer and the aggregator.

pub const ELAPSED_TIME: &str = "Elapsed Time (s)";
pub const LOAD_CELL: &str = "Load Cell (kg)";
pub const TIME: &str = "Time";
pub const MDOT_FUEL: &str = "mdot fuel (kg/s)";
pub const AVERAGE_MDOT_FUEL: &str = "Average mdot fuel (kg/s)";

pub const FUEL_MASS: &str = "Fuel mass";
pub const FIRELIGHTER_MASS: &str = "Firelighter mass";
pub const KINDLING_MASS: &str = "Kindling mass";
pub const PM_MASS: &str = "PM mass";
pub const TOTAL_ENERGY: &str = "Total Energy (MJ)";
pub const PM_EF: &str = "PM EF (g/MJ)";

pub const SOURCE_FILE: &str = "Source File";
pub const FUEL_TYPE: &str = "fuel_type";
pub const APPLIANCE: &str = "appliance";

/// Instrument export headers and the labels they are saved under.
///
/// Matching is exact, including case and punctuation.
pub const INSTRUMENT_RENAMES: [(&str, &str); 13] = [
    ("X_Value", ELAPSED_TIME),
    ("1-Load Cell (Formula Result)", LOAD_CELL),
    ("2-T_MFM (Formula Result)", "T_MFM"),
    ("3-T_bottom (Arith. Mean)", "T_Botton (°C)"),
    ("4-T_middle (Arith. Mean)", "T_Flue (°C)"),
    ("5-T_top (Arith. Mean)", "T_Top (°C)"),
    ("6-T_ambient (Arith. Mean)", "T_Ambient (°C)"),
    ("7-T_filter (Arith. Mean)", "T_Filter (°C)"),
    ("8-Flue Pressure (Formula Result)", "Flue_Pressure (Pa)"),
    ("11-Mass flowmeter_flue gas (Formula Result)", "Mass Flowmeter_Flue Gas (g/min)"),
    ("11-Mass flowmeter_flue gas (Formula Result) 1", "Suggested Mass FLow (g/min)"),
    ("12-MFC_mass flow (Formula Result)", "MFC_Mass Flow (g/min)"),
    ("Comment", TIME),
];

/// Canonical label for an instrument header, if it has one.
pub fn canonical_name(header: &str) -> Option<&'static str> {
    INSTRUMENT_RENAMES
        .iter()
        .find(|(raw, _)| *raw == header)
        .map(|(_, canonical)| *canonical)
}
