use chrono::NaiveDate;
use combustlab_core::{
    energy::LhvTable,
    error::{ComputationWarning, LabError},
    loader,
    naming::next_filename,
    recorder::record_run,
};
use combustlab_schemas::{
    columns,
    fuel::{Appliance, CustomFuel, FuelType, KnownFuel},
    run::{PmEmissionFactor, RunInput},
};
use std::{fs, path::Path};

const RAW_EXPORT: &str = "X_Value;1-Load Cell (Formula Result);4-T_middle (Arith. Mean);Comment\n\
0;10;20.5;2025-01-07 10:00:00\n\
60;9.5;180.2;2025-01-07 10:01:00\n\
120;9.0;240.9;2025-01-07 10:02:00\n";

fn input(fuel_type: FuelType, fuel_mass_kg: f64, firelighter_mass_kg: f64) -> RunInput {
    RunInput {
        fuel_mass_kg,
        firelighter_mass_kg,
        kindling_mass_kg: 0.4,
        pm_mass_g: 1.25,
        fuel_type,
        appliance: Appliance::OpenFireplace,
        date: NaiveDate::from_ymd_opt(2025, 1, 7).unwrap(),
    }
}

fn write_raw(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("raw_export.txt");
    fs::write(&path, RAW_EXPORT).unwrap();
    path
}

#[test]
fn three_saves_number_runs_one_to_three() {
    let dir = tempfile::tempdir().unwrap();
    let raw = write_raw(dir.path());
    let data_dir = dir.path().join("data");
    let run = input(FuelType::Known(KnownFuel::Wood), 2.0, 0.1);

    let names: Vec<String> = (0..3)
        .map(|_| {
            record_run(&run, Some(raw.as_path()), &data_dir, &LhvTable::default())
                .unwrap()
                .filename
        })
        .collect();
    assert_eq!(
        names,
        vec![
            "07012025-wood-open_fireplace-run1.csv",
            "07012025-wood-open_fireplace-run2.csv",
            "07012025-wood-open_fireplace-run3.csv",
        ]
    );
}

#[test]
fn deleted_run_leaves_a_gap_that_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let raw = write_raw(dir.path());
    let data_dir = dir.path().join("data");
    fs::create_dir_all(&data_dir).unwrap();
    let kept = data_dir.join("07012025-wood-open_fireplace-run2.csv");
    fs::write(&kept, "kept\n").unwrap();
    let run = input(FuelType::Known(KnownFuel::Wood), 2.0, 0.1);

    let first = record_run(&run, Some(raw.as_path()), &data_dir, &LhvTable::default()).unwrap();
    assert_eq!(first.filename, "07012025-wood-open_fireplace-run3.csv");
    let second = record_run(&run, Some(raw.as_path()), &data_dir, &LhvTable::default()).unwrap();
    assert_eq!(second.filename, "07012025-wood-open_fireplace-run4.csv");
    assert_eq!(fs::read_to_string(&kept).unwrap(), "kept\n");
}

#[test]
fn next_name_against_seeded_directories() {
    let date = NaiveDate::from_ymd_opt(2025, 1, 7).unwrap();
    for (seeded, expected) in [(0, "run1"), (1, "run2"), (2, "run3")] {
        let dir = tempfile::tempdir().unwrap();
        for i in 1..=seeded {
            fs::write(
                dir.path().join(format!("07012025-wood-open_fireplace-run{}.csv", i)),
                "",
            )
            .unwrap();
        }
        let name = next_filename(dir.path(), date, "wood", "open fireplace").unwrap();
        assert_eq!(name, format!("07012025-wood-open_fireplace-{}.csv", expected));
    }
}

#[test]
fn saved_run_carries_inputs_results_and_canonical_columns() {
    let dir = tempfile::tempdir().unwrap();
    let raw = write_raw(dir.path());
    let data_dir = dir.path().join("data");
    let run = input(FuelType::Known(KnownFuel::Wood), 2.0, 0.1);

    let report = record_run(&run, Some(raw.as_path()), &data_dir, &LhvTable::default()).unwrap();
    assert!(report.warnings.is_empty());
    let expected_energy = 18.401 * 2.0 + 33.891 * 0.1;
    assert!((report.energy.total_energy_mj - expected_energy).abs() < 1e-12);

    let saved = loader::load_table(&report.path).unwrap();
    assert_eq!(
        saved.column_names(),
        vec![
            columns::ELAPSED_TIME,
            columns::LOAD_CELL,
            "T_Flue (°C)",
            columns::TIME,
            columns::FUEL_MASS,
            columns::FIRELIGHTER_MASS,
            columns::KINDLING_MASS,
            columns::PM_MASS,
            columns::TOTAL_ENERGY,
            columns::PM_EF,
            columns::MDOT_FUEL,
            columns::AVERAGE_MDOT_FUEL,
        ]
    );
    assert_eq!(saved.numeric(columns::TOTAL_ENERGY).unwrap()[0], Some(40.191));
    assert_eq!(saved.numeric(columns::PM_EF).unwrap()[2], Some(0.031101));

    let mdot = saved.numeric(columns::MDOT_FUEL).unwrap();
    assert_eq!(mdot[0], None);
    assert!((mdot[1].unwrap() + 1.0 / 120.0).abs() < 1e-12);
    assert!((mdot[2].unwrap() + 1.0 / 120.0).abs() < 1e-12);
    assert_eq!(report.preview.row_count(), 3);
}

#[test]
fn zero_energy_leaves_emission_factor_blank() {
    let dir = tempfile::tempdir().unwrap();
    let raw = write_raw(dir.path());
    let data_dir = dir.path().join("data");
    let run = input(FuelType::Known(KnownFuel::Sod), 0.0, 0.0);

    let report = record_run(&run, Some(raw.as_path()), &data_dir, &LhvTable::default()).unwrap();
    assert_eq!(report.energy.pm_emission_factor, PmEmissionFactor::ZeroEnergy);
    assert!(report.warnings.contains(&ComputationWarning::ZeroEnergy));

    let text = fs::read_to_string(&report.path).unwrap();
    assert!(!text.contains("NaN"));
    let saved = loader::load_table(&report.path).unwrap();
    assert!(saved
        .numeric(columns::PM_EF)
        .unwrap()
        .iter()
        .all(Option::is_none));
    assert_eq!(saved.numeric(columns::TOTAL_ENERGY).unwrap()[0], Some(0.0));
}

#[test]
fn invalid_custom_fuel_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let raw = write_raw(dir.path());
    let data_dir = dir.path().join("data");
    let run = input(
        FuelType::Other(CustomFuel {
            name: String::new(),
            lhv_mj_per_kg: 19.0,
        }),
        2.0,
        0.1,
    );

    let result = record_run(&run, Some(raw.as_path()), &data_dir, &LhvTable::default());
    assert!(matches!(result, Err(LabError::Validation(_))));
    assert!(!data_dir.exists());
}

#[test]
fn custom_fuel_name_goes_into_the_file_name() {
    let dir = tempfile::tempdir().unwrap();
    let raw = write_raw(dir.path());
    let data_dir = dir.path().join("data");
    let run = input(
        FuelType::Other(CustomFuel {
            name: "Bog Oak".to_string(),
            lhv_mj_per_kg: 19.0,
        }),
        1.0,
        0.0,
    );

    let report = record_run(&run, Some(raw.as_path()), &data_dir, &LhvTable::default()).unwrap();
    assert_eq!(report.filename, "07012025-bog_oak-open_fireplace-run1.csv");
    assert_eq!(report.energy.total_energy_mj, 19.0);
}

#[test]
fn missing_raw_file_is_a_validation_error() {
    let dir = tempfile::tempdir().unwrap();
    let run = input(FuelType::Known(KnownFuel::Wood), 2.0, 0.1);
    let result = record_run(&run, None, &dir.path().join("data"), &LhvTable::default());
    assert!(matches!(result, Err(LabError::Validation(_))));
}

#[test]
fn export_without_load_cell_is_saved_with_a_warning() {
    let dir = tempfile::tempdir().unwrap();
    let raw = dir.path().join("partial.csv");
    fs::write(&raw, "X_Value,5-T_top (Arith. Mean)\n0,21\n60,95\n").unwrap();
    let run = input(FuelType::Known(KnownFuel::Smokeless), 1.0, 0.1);

    let report = record_run(&run, Some(raw.as_path()), &dir.path().join("data"), &LhvTable::default())
        .unwrap();
    assert!(matches!(
        report.warnings.as_slice(),
        [ComputationWarning::MdotUnavailable { .. }]
    ));
    let saved = loader::load_table(&report.path).unwrap();
    assert!(saved.has_column("T_Top (°C)"));
    assert!(!saved.has_column(columns::MDOT_FUEL));
}
