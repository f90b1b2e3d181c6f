//! Writing query results to CSV or JSON.

use anyhow::{Context, Result, bail};
use csv::WriterBuilder;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, info};

use crate::database::Approach;

const CSV_HEADER: [&str; 7] = [
    "datetime_utc",
    "distance_au",
    "velocity_km_s",
    "designation",
    "name",
    "diameter_km",
    "potentially_hazardous",
];

#[derive(Serialize)]
struct CsvRow<'a> {
    datetime_utc: String,
    distance_au: Option<f64>,
    velocity_km_s: Option<f64>,
    designation: &'a str,
    name: Option<&'a str>,
    diameter_km: Option<f64>,
    potentially_hazardous: bool,
}

#[derive(Serialize)]
struct JsonNeo<'a> {
    designation: &'a str,
    name: Option<&'a str>,
    diameter_km: Option<f64>,
    potentially_hazardous: bool,
}

#[derive(Serialize)]
struct JsonApproach<'a> {
    datetime_utc: String,
    distance_au: Option<f64>,
    velocity_km_s: Option<f64>,
    neo: JsonNeo<'a>,
}

impl<'a> From<Approach<'a>> for CsvRow<'a> {
    fn from(approach: Approach<'a>) -> Self {
        let ca = approach.record();
        let neo = approach.neo().record();
        CsvRow {
            datetime_utc: ca.time_str(),
            distance_au: known(ca.distance),
            velocity_km_s: known(ca.velocity),
            designation: &neo.designation,
            name: neo.name.as_deref(),
            diameter_km: neo.known_diameter(),
            potentially_hazardous: neo.hazardous,
        }
    }
}

impl<'a> From<Approach<'a>> for JsonApproach<'a> {
    fn from(approach: Approach<'a>) -> Self {
        let ca = approach.record();
        let neo = approach.neo().record();
        JsonApproach {
            datetime_utc: ca.time_str(),
            distance_au: known(ca.distance),
            velocity_km_s: known(ca.velocity),
            neo: JsonNeo {
                designation: &neo.designation,
                name: neo.name.as_deref(),
                diameter_km: neo.known_diameter(),
                potentially_hazardous: neo.hazardous,
            },
        }
    }
}

/// Unknown (`NaN`) measurements are written as missing values.
fn known(value: f64) -> Option<f64> {
    if value.is_nan() { None } else { Some(value) }
}

fn create(path: &Path) -> Result<File> {
    File::create(path).with_context(|| format!("failed to create {}", path.display()))
}

/// Writes approaches to a CSV file, one row each, after a fixed header.
///
/// An absent name or unknown measurement is written as an empty cell. Returns
/// the number of rows written.
pub fn write_to_csv<'a>(
    results: impl IntoIterator<Item = Approach<'a>>,
    path: impl AsRef<Path>,
) -> Result<usize> {
    let path = path.as_ref();
    let file = create(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(false) // header is written even when there are no rows
        .from_writer(file);

    writer
        .write_record(CSV_HEADER)
        .with_context(|| format!("failed to write header to {}", path.display()))?;

    let mut count = 0;
    for approach in results {
        writer
            .serialize(CsvRow::from(approach))
            .with_context(|| format!("failed to write row to {}", path.display()))?;
        count += 1;
    }
    writer
        .flush()
        .with_context(|| format!("failed to flush {}", path.display()))?;

    info!(path = %path.display(), rows = count, "Wrote CSV results");
    Ok(count)
}

/// Writes approaches to a pretty-printed JSON array, each entry carrying
/// its NEO under `neo`. Absent names and unknown measurements become `null`.
pub fn write_to_json<'a>(
    results: impl IntoIterator<Item = Approach<'a>>,
    path: impl AsRef<Path>,
) -> Result<usize> {
    let path = path.as_ref();
    let records: Vec<JsonApproach> = results.into_iter().map(JsonApproach::from).collect();

    let mut writer = BufWriter::new(create(path)?);
    serde_json::to_writer_pretty(&mut writer, &records)
        .with_context(|| format!("failed to write {}", path.display()))?;
    writer
        .write_all(b"\n")
        .and_then(|()| writer.flush())
        .with_context(|| format!("failed to write {}", path.display()))?;

    info!(path = %path.display(), records = records.len(), "Wrote JSON results");
    Ok(records.len())
}

/// Picks the writer from the file extension, `.csv` or `.json`.
pub fn write_results<'a>(
    results: impl IntoIterator<Item = Approach<'a>>,
    path: impl AsRef<Path>,
) -> Result<usize> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    debug!(path = %path.display(), ?extension, "Selecting output format");

    match extension.as_deref() {
        Some("csv") => write_to_csv(results, path),
        Some("json") => write_to_json(results, path),
        _ => bail!(
            "unsupported output format for {}, expected a .csv or .json file",
            path.display()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::NeoDatabase;
    use crate::models::{CloseApproach, NearEarthObject};
    use crate::time::cd_to_datetime;
    use std::env;
    use std::fs;

    fn temp_path(name: &str) -> String {
        format!("{}/{}", env::temp_dir().display(), name)
    }

    fn sample_db() -> NeoDatabase {
        NeoDatabase::new(
            vec![
                NearEarthObject::new("433", Some("Eros".into()), 16.84, false),
                NearEarthObject::new("2020 AB", None, f64::NAN, true),
            ],
            vec![
                CloseApproach::new("433", cd_to_datetime("1900-Jan-01 12:00").unwrap(), 0.15, 5.5),
                CloseApproach::new("2020 AB", cd_to_datetime("2020-Jan-02 03:04").unwrap(), 0.04, 12.0),
            ],
        )
    }

    #[test]
    fn test_write_to_csv() {
        let path = temp_path("neo_explorer_test_write.csv");
        let db = sample_db();

        let rows = write_to_csv(db.query(&[]), &path).unwrap();
        assert_eq!(rows, 2);

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(
            lines[0],
            "datetime_utc,distance_au,velocity_km_s,designation,name,diameter_km,potentially_hazardous"
        );
        assert_eq!(lines[1], "1900-01-01 12:00,0.15,5.5,433,Eros,16.84,false");
        assert_eq!(lines[2], "2020-01-02 03:04,0.04,12.0,2020 AB,,,true");
        assert_eq!(lines.len(), 3);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_to_csv_empty_still_has_header() {
        let path = temp_path("neo_explorer_test_write_empty.csv");
        let db = sample_db();

        let rows = write_to_csv(db.query(&[]).take(0), &path).unwrap();
        assert_eq!(rows, 0);
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 1);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_to_json() {
        let path = temp_path("neo_explorer_test_write.json");
        let db = sample_db();

        let written = write_to_json(db.query(&[]), &path).unwrap();
        assert_eq!(written, 2);

        let content = fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        let records = value.as_array().unwrap();
        assert_eq!(records.len(), 2);

        assert_eq!(records[0]["datetime_utc"], "1900-01-01 12:00");
        assert_eq!(records[0]["distance_au"], 0.15);
        assert_eq!(records[0]["velocity_km_s"], 5.5);
        assert_eq!(records[0]["neo"]["designation"], "433");
        assert_eq!(records[0]["neo"]["name"], "Eros");
        assert_eq!(records[0]["neo"]["diameter_km"], 16.84);
        assert_eq!(records[0]["neo"]["potentially_hazardous"], false);

        assert!(records[1]["neo"]["name"].is_null());
        assert!(records[1]["neo"]["diameter_km"].is_null());

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_unknown_measurements_are_missing_in_both_formats() {
        let db = NeoDatabase::new(
            vec![NearEarthObject::new("2020 AB", None, f64::NAN, true)],
            vec![CloseApproach::new(
                "2020 AB",
                cd_to_datetime("2020-Jan-02 03:04").unwrap(),
                f64::NAN,
                f64::NAN,
            )],
        );
        let csv_path = temp_path("neo_explorer_test_write_nan.csv");
        let json_path = temp_path("neo_explorer_test_write_nan.json");

        write_to_csv(db.query(&[]), &csv_path).unwrap();
        write_to_json(db.query(&[]), &json_path).unwrap();

        let content = fs::read_to_string(&csv_path).unwrap();
        assert_eq!(content.lines().nth(1), Some("2020-01-02 03:04,,,2020 AB,,,true"));

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
        assert!(value[0]["distance_au"].is_null());
        assert!(value[0]["velocity_km_s"].is_null());

        fs::remove_file(&csv_path).unwrap();
        fs::remove_file(&json_path).unwrap();
    }

    #[test]
    fn test_write_results_dispatches_on_extension() {
        let db = sample_db();

        let csv_path = temp_path("neo_explorer_test_dispatch.CSV");
        write_results(db.query(&[]), &csv_path).unwrap();
        assert!(fs::read_to_string(&csv_path).unwrap().starts_with("datetime_utc,"));
        fs::remove_file(&csv_path).unwrap();

        let json_path = temp_path("neo_explorer_test_dispatch.json");
        write_results(db.query(&[]), &json_path).unwrap();
        assert!(fs::read_to_string(&json_path).unwrap().starts_with('['));
        fs::remove_file(&json_path).unwrap();
    }

    #[test]
    fn test_write_results_rejects_unknown_extension() {
        let db = sample_db();
        let path = temp_path("neo_explorer_test_dispatch.txt");
        let err = write_results(db.query(&[]), &path).unwrap_err();
        assert!(err.to_string().contains("unsupported output format"));
        assert!(!Path::new(&path).exists());
    }

    #[test]
    fn test_write_failure_is_reported() {
        let db = sample_db();
        let path = temp_path("neo_explorer_missing_dir/out.csv");
        let err = write_to_csv(db.query(&[]), &path).unwrap_err();
        assert!(err.to_string().contains("failed to create"));
    }
}
