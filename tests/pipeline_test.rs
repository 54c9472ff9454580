//! End-to-end runs over files in a temporary directory

mod utils;

use visit_matcher::pipeline::DEFAULT_FIELD_STRENGTHS;
use visit_matcher::utils::io::{read_table, write_table};
use visit_matcher::{Error, MatcherConfig, PipelineConfig, TableFormat, run_loss_rates, run_merge};

use utils::{TableBuilder, cells, column_values, rid7_clinical, rid7_imaging, write_file, ymd};

fn config_for(dir: &std::path::Path, datasets: &[&str]) -> PipelineConfig {
    PipelineConfig {
        data_dir: dir.to_path_buf(),
        output_dir: dir.join("out"),
        run_date: ymd(2023, 8, 28),
        ..PipelineConfig::default()
    }
    .with_datasets(datasets.iter().copied())
}

#[test]
fn test_merge_writes_dated_output() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "df_clinical.csv", &rid7_clinical().to_csv());
    write_file(dir.path(), "df_GM.csv", &rid7_imaging().to_csv());

    let config = config_for(dir.path(), &["GM"]);
    let outputs = run_merge(&config, MatcherConfig::default()).unwrap();

    assert_eq!(outputs.len(), 1);
    let output = &outputs[0];
    assert_eq!(output.dataset, "GM");
    assert_eq!(output.rows, 3);
    assert_eq!(
        output.path,
        dir.path().join("out").join("merged_GM_2023-08-28.csv")
    );
    assert!(output.stats.is_some());

    let written = read_table(&output.path).unwrap();
    assert_eq!(written.num_rows(), 3);
    assert_eq!(column_values(&written, "VISCODE"), cells(&["bl", "m12", ""]));
    assert_eq!(column_values(&written, "AGE"), cells(&["70.1", "71.1", ""]));
    assert_eq!(
        column_values(&written, "SCAN_DATE"),
        cells(&["2020-01-10", "2021-02-01", "2020-05-05"])
    );
}

#[test]
fn test_failed_dataset_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "df_clinical.csv", &rid7_clinical().to_csv());
    let broken = TableBuilder::new("df_WM.csv", &utils::IMAGING_COLUMNS)
        .row(&["s1", "7", "2020/31/31", "3.0", "FALSE", "S1", "1"]);
    write_file(dir.path(), "df_WM.csv", &broken.to_csv());

    let config = config_for(dir.path(), &["WM"]);
    let err = run_merge(&config, MatcherConfig::default()).unwrap_err();
    assert!(matches!(err, Error::MalformedDate { ref table, .. } if table == "df_WM.csv"));

    let out = dir.path().join("out");
    assert!(!out.join("merged_WM_2023-08-28.csv").exists());
    assert!(!out.join("merged_WM_2023-08-28.csv.partial").exists());
}

#[test]
fn test_missing_input_file() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "df_clinical.csv", &rid7_clinical().to_csv());

    let config = config_for(dir.path(), &["CSF"]);
    let err = run_merge(&config, MatcherConfig::default()).unwrap_err();
    assert!(matches!(err, Error::Io { ref path, .. } if path.ends_with("df_CSF.csv")));
}

#[test]
fn test_parquet_output() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "df_clinical.csv", &rid7_clinical().to_csv());
    write_file(dir.path(), "df_GM.csv", &rid7_imaging().to_csv());

    let config = PipelineConfig {
        output_format: TableFormat::Parquet,
        ..config_for(dir.path(), &["GM"])
    };
    let outputs = run_merge(&config, MatcherConfig::default()).unwrap();
    assert_eq!(outputs[0].path.extension().unwrap(), "parquet");

    let written = read_table(&outputs[0].path).unwrap();
    assert_eq!(column_values(&written, "RID"), cells(&["7", "7", "12"]));
}

#[test]
fn test_parquet_dataset_input() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "df_clinical.csv", &rid7_clinical().to_csv());
    write_table(&rid7_imaging().build(), &dir.path().join("df_GM.parquet")).unwrap();

    let config = PipelineConfig {
        input_format: TableFormat::Parquet,
        ..config_for(dir.path(), &["GM"])
    };
    let outputs = run_merge(&config, MatcherConfig::default()).unwrap();
    assert_eq!(outputs[0].rows, 3);
    assert!(outputs[0].path.ends_with("merged_GM_2023-08-28.csv"));

    let written = read_table(&outputs[0].path).unwrap();
    assert_eq!(column_values(&written, "VISCODE"), cells(&["bl", "m12", ""]));

    // The csv name is not consulted once the input format is parquet
    let missing = PipelineConfig {
        input_format: TableFormat::Parquet,
        ..config_for(dir.path(), &["WM"])
    };
    write_file(dir.path(), "df_WM.csv", &rid7_imaging().to_csv());
    let err = run_merge(&missing, MatcherConfig::default()).unwrap_err();
    assert!(matches!(err, Error::Io { ref path, .. } if path.ends_with("df_WM.parquet")));
}

#[test]
fn test_loss_rate_run_writes_each_strength() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "ADNIMERGE_03Aug2023.csv", &rid7_clinical().to_csv());
    let thick = TableBuilder::new("df_Thick.csv", &["names", "RID", "DATE", "FIELD", "isAvg", "TBI", "L_Cortex"])
        .row(&["a", "7", "2020-01-10", "3.0", "FALSE", "1", "2.50"])
        .row(&["b", "7", "2021-02-01", "3.0", "FALSE", "1", "2.40"])
        .row(&["c", "7", "2021-02-01", "3.0", "TRUE", "1", "2.45"])
        .row(&["d", "9", "2020-03-01", "1.5", "FALSE", "0", "2.70"])
        .row(&["e", "9", "2022-03-01", "1.5", "FALSE", "0", "2.60"]);
    write_file(dir.path(), "df_Thick.csv", &thick.to_csv());

    let config = PipelineConfig {
        clinical_file: "ADNIMERGE_03Aug2023.csv".to_string(),
        ..config_for(dir.path(), &["Thick"])
    };
    let outputs = run_loss_rates(&config, &DEFAULT_FIELD_STRENGTHS).unwrap();
    assert_eq!(outputs.len(), 2);

    let low = &outputs[0];
    assert_eq!(low.field_strength, Some(1.5));
    assert!(low.path.ends_with("average_Thick_loss_1.5_with_timepoints.csv"));
    let table = read_table(&low.path).unwrap();
    assert_eq!(column_values(&table, "RID"), cells(&["9"]));
    assert_eq!(column_values(&table, "timepoint_1_VISCODE"), cells(&[""]));

    let high = &outputs[1];
    assert!(high.path.ends_with("average_Thick_loss_3.0_with_timepoints.csv"));
    let table = read_table(&high.path).unwrap();
    assert_eq!(column_values(&table, "RID"), cells(&["7"]));
    assert_eq!(column_values(&table, "TBI"), cells(&["1"]));
    assert_eq!(column_values(&table, "timepoint_1"), cells(&["2020-01-10"]));
    assert_eq!(column_values(&table, "timepoint_2"), cells(&["2021-02-01"]));
    assert_eq!(column_values(&table, "timepoint_1_VISCODE"), cells(&["bl"]));
    assert_eq!(column_values(&table, "timepoint_2_VISCODE"), cells(&["m12"]));

    let rate: f64 = column_values(&table, "L_Cortex")[0]
        .as_deref()
        .unwrap()
        .parse()
        .unwrap();
    let years = 388.0 / 365.25;
    approx::assert_relative_eq!(rate, 4.0 / years, epsilon = 1e-9);
}
