//! Loaders for the NEO catalog (CSV) and close approach data (JSON).
//!
//! A bad row is skipped and reported in [`Loaded::skipped`]; only problems
//! with the file as a whole (unreadable, missing columns) fail the load.
//! Paths ending in `.gz` are decompressed on the fly.

use flate2::read::GzDecoder;
use serde::Deserialize;
use serde_json::Value;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::errors::{LoadError, RowError, SkippedRow};
use crate::models::{CloseApproach, NearEarthObject};
use crate::time::cd_to_datetime;

const NEO_COLUMNS: [&str; 4] = ["pdes", "name", "diameter", "pha"];

/// Records read from a data file plus the rows that were dropped.
#[derive(Debug)]
pub struct Loaded<T> {
    pub records: Vec<T>,
    pub skipped: Vec<SkippedRow>,
}

impl<T> Loaded<T> {
    fn new() -> Self {
        Loaded {
            records: Vec::new(),
            skipped: Vec::new(),
        }
    }

    fn skip(&mut self, row: usize, reason: RowError) {
        warn!(row, reason = %reason, "Skipping row");
        self.skipped.push(SkippedRow { row, reason });
    }
}

#[derive(Debug, Deserialize)]
struct NeoRow {
    pdes: String,
    name: Option<String>,
    diameter: String,
    pha: String,
}

#[derive(Debug, Deserialize)]
struct CadDocument {
    fields: Vec<String>,
    #[serde(default)]
    data: Vec<Value>,
}

fn open(path: &Path) -> Result<Box<dyn Read>, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = BufReader::new(file);

    if path.extension().is_some_and(|ext| ext == "gz") {
        debug!(path = %path.display(), "Reading gzip-compressed input");
        Ok(Box::new(GzDecoder::new(reader)))
    } else {
        Ok(Box::new(reader))
    }
}

/// Parses a float, falling back to `NaN` for blank or malformed input.
fn parse_float(raw: &str) -> f64 {
    raw.trim().parse().unwrap_or(f64::NAN)
}

/// Reads NEOs from a CSV file with a header row.
///
/// The `pdes`, `name`, `diameter` and `pha` columns must be present; any
/// others are ignored. `pha` of `Y` marks the object hazardous.
#[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn load_neos(path: impl AsRef<Path>) -> Result<Loaded<NearEarthObject>, LoadError> {
    let path = path.as_ref();
    let csv_err = |source: csv::Error| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut rdr = csv::Reader::from_reader(open(path)?);

    let headers = rdr.headers().map_err(csv_err)?.clone();
    for column in NEO_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(LoadError::MissingColumn {
                path: path.to_path_buf(),
                column,
            });
        }
    }

    let mut loaded = Loaded::new();

    for (i, result) in rdr.deserialize::<NeoRow>().enumerate() {
        let row_number = i + 1;
        let row = match result {
            Ok(row) => row,
            Err(e) if e.is_io_error() => return Err(csv_err(e)),
            Err(e) => {
                loaded.skip(row_number, RowError::Unreadable(e.to_string()));
                continue;
            }
        };

        let designation = row.pdes.trim();
        if designation.is_empty() {
            loaded.skip(row_number, RowError::MissingDesignation);
            continue;
        }

        loaded.records.push(NearEarthObject::new(
            designation,
            row.name,
            parse_float(&row.diameter),
            row.pha.trim().eq_ignore_ascii_case("y"),
        ));
    }

    info!(
        records = loaded.records.len(),
        skipped = loaded.skipped.len(),
        "Loaded near-Earth objects"
    );

    Ok(loaded)
}

/// Column positions of the values we use from a close approach row.
struct CadColumns {
    designation: usize,
    calendar_date: usize,
    distance: usize,
    velocity: usize,
}

impl CadColumns {
    fn resolve(fields: &[String], path: &Path) -> Result<Self, LoadError> {
        let position = |field: &'static str| {
            fields
                .iter()
                .position(|f| f == field)
                .ok_or_else(|| LoadError::MissingField {
                    path: path.to_path_buf(),
                    field,
                })
        };

        Ok(CadColumns {
            designation: position("des")?,
            calendar_date: position("cd")?,
            distance: position("dist")?,
            velocity: position("v_rel")?,
        })
    }

    fn width(&self) -> usize {
        [self.designation, self.calendar_date, self.distance, self.velocity]
            .into_iter()
            .max()
            .unwrap_or(0)
            + 1
    }
}

/// Renders a JSON scalar as text. Close approach data sends everything as
/// strings, but numbers are accepted too.
fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

fn parse_approach(row: &Value, columns: &CadColumns) -> Result<CloseApproach, RowError> {
    let values = row
        .as_array()
        .ok_or_else(|| RowError::Unreadable(format!("expected an array, found {row}")))?;

    if values.len() < columns.width() {
        return Err(RowError::TooShort {
            expected: columns.width(),
            found: values.len(),
        });
    }

    let designation = text(&values[columns.designation]);
    let designation = designation.trim();
    if designation.is_empty() {
        return Err(RowError::MissingDesignation);
    }

    let calendar_date = text(&values[columns.calendar_date]);
    let time = cd_to_datetime(&calendar_date).map_err(|source| RowError::BadDate {
        value: calendar_date.clone(),
        source,
    })?;

    Ok(CloseApproach::new(
        designation,
        time,
        parse_float(&text(&values[columns.distance])),
        parse_float(&text(&values[columns.velocity])),
    ))
}

/// Reads close approaches from a JSON document of the form
/// `{"fields": [...], "data": [[...], ...]}`.
///
/// Values are located by name through `fields`, which must list `des`,
/// `cd`, `dist` and `v_rel`.
#[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn load_approaches(path: impl AsRef<Path>) -> Result<Loaded<CloseApproach>, LoadError> {
    let path = path.as_ref();

    let document: CadDocument =
        serde_json::from_reader(open(path)?).map_err(|source| LoadError::Json {
            path: path.to_path_buf(),
            source,
        })?;

    let columns = CadColumns::resolve(&document.fields, path)?;
    let mut loaded = Loaded::new();

    for (i, row) in document.data.iter().enumerate() {
        match parse_approach(row, &columns) {
            Ok(approach) => loaded.records.push(approach),
            Err(reason) => loaded.skip(i + 1, reason),
        }
    }

    info!(
        records = loaded.records.len(),
        skipped = loaded.skipped.len(),
        "Loaded close approaches"
    );

    Ok(loaded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::env;
    use std::fs;
    use std::io::Write;

    fn temp_path(name: &str) -> String {
        format!("{}/{}", env::temp_dir().display(), name)
    }

    fn write_temp(name: &str, contents: &str) -> String {
        let path = temp_path(name);
        fs::write(&path, contents).unwrap();
        path
    }

    const NEO_CSV: &str = "\
id,pdes,name,pha,diameter,albedo
a0000433,433,Eros,N,16.84,0.25
a0099942,99942,Apophis,Y,0.37,
bK20A00B,2020 AB,,Y,,
bad,2021 XY,,N,not-a-number,
";

    const CAD_JSON: &str = r#"{
        "signature": {"source": "NASA/JPL SBDB Close Approach Data API", "version": "1.1"},
        "count": "3",
        "fields": ["des", "orbit_id", "jd", "cd", "dist", "dist_min", "dist_max", "v_rel", "v_inf", "t_sigma_f", "h"],
        "data": [
            ["433", "659", "2415020.507669610", "1900-Jan-01 00:11", "0.0921795123769547", "0.0912006569517418", "0.0931589328621254", "16.7523040362574", "16.7505784933163", "01:00", "10.3"],
            ["99942", "199", "2462240.407091470", "2029-Apr-13 21:46", "0.000254099", "0.000254", "0.000254", "7.42", "5.84", "< 00:01", "19.7"],
            ["2020 AB", "1", "2458850.5", "2020-Jan-02 03:04", "bogus", "0.01", "0.02", "", "1.0", "00:02", "27.0"]
        ]
    }"#;

    #[test]
    fn test_load_neos_coerces_fields() {
        let path = write_temp("neo_explorer_test_neos.csv", NEO_CSV);
        let loaded = load_neos(&path).unwrap();

        assert_eq!(loaded.records.len(), 4);
        assert!(loaded.skipped.is_empty());

        let eros = &loaded.records[0];
        assert_eq!(eros.designation, "433");
        assert_eq!(eros.name.as_deref(), Some("Eros"));
        assert_eq!(eros.diameter, 16.84);
        assert!(!eros.hazardous);

        assert!(loaded.records[1].hazardous);

        let unnamed = &loaded.records[2];
        assert_eq!(unnamed.name, None);
        assert!(unnamed.diameter.is_nan());

        assert!(loaded.records[3].diameter.is_nan());

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_load_neos_skips_bad_rows() {
        let csv = "pdes,name,diameter,pha\n433,Eros,16.84,N\n,Nameless,1.0,N\n1,2,3\n";
        let path = write_temp("neo_explorer_test_neos_bad.csv", csv);
        let loaded = load_neos(&path).unwrap();

        assert_eq!(loaded.records.len(), 1);
        assert_eq!(loaded.skipped.len(), 2);
        assert_eq!(loaded.skipped[0].row, 2);
        assert!(matches!(loaded.skipped[0].reason, RowError::MissingDesignation));
        assert!(matches!(loaded.skipped[1].reason, RowError::Unreadable(_)));

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_load_neos_missing_column_is_fatal() {
        let path = write_temp("neo_explorer_test_neos_nocol.csv", "pdes,name,pha\n433,Eros,N\n");
        let err = load_neos(&path).unwrap_err();
        assert!(matches!(err, LoadError::MissingColumn { column: "diameter", .. }));
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_load_neos_missing_file() {
        let err = load_neos(temp_path("neo_explorer_does_not_exist.csv")).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }

    #[test]
    fn test_load_neos_gzip() {
        let path = temp_path("neo_explorer_test_neos.csv.gz");
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(NEO_CSV.as_bytes()).unwrap();
        fs::write(&path, encoder.finish().unwrap()).unwrap();

        let loaded = load_neos(&path).unwrap();
        assert_eq!(loaded.records.len(), 4);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_load_approaches_by_field_name() {
        let path = write_temp("neo_explorer_test_cad.json", CAD_JSON);
        let loaded = load_approaches(&path).unwrap();

        assert_eq!(loaded.records.len(), 3);
        let first = &loaded.records[0];
        assert_eq!(first.designation, "433");
        assert_eq!(first.time_str(), "1900-01-01 00:11");
        assert_eq!(first.distance, 0.0921795123769547);
        assert_eq!(first.velocity, 16.7523040362574);
        assert!(!first.is_linked());

        let malformed = &loaded.records[2];
        assert!(malformed.distance.is_nan());
        assert!(malformed.velocity.is_nan());

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_load_approaches_skips_bad_rows() {
        let json = r#"{
            "fields": ["des", "cd", "dist", "v_rel"],
            "data": [
                ["433", "1900-Jan-01 12:00", "0.15", "5.5"],
                ["433", "yesterday", "0.15", "5.5"],
                ["", "1900-Jan-01 12:00", "0.15", "5.5"],
                ["433", "1900-Jan-01 12:00"],
                "not a row",
                ["433", "1900-Jan-02 12:00", 0.2, 6.0]
            ]
        }"#;
        let path = write_temp("neo_explorer_test_cad_bad.json", json);
        let loaded = load_approaches(&path).unwrap();

        assert_eq!(loaded.records.len(), 2);
        assert_eq!(loaded.records[1].distance, 0.2);
        let rows: Vec<_> = loaded.skipped.iter().map(|s| s.row).collect();
        assert_eq!(rows, vec![2, 3, 4, 5]);
        assert!(matches!(loaded.skipped[0].reason, RowError::BadDate { .. }));
        assert!(matches!(loaded.skipped[2].reason, RowError::TooShort { expected: 4, found: 2 }));

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_load_approaches_missing_field_is_fatal() {
        let json = r#"{"fields": ["des", "cd", "dist"], "data": []}"#;
        let path = write_temp("neo_explorer_test_cad_nofield.json", json);
        let err = load_approaches(&path).unwrap_err();
        assert!(matches!(err, LoadError::MissingField { field: "v_rel", .. }));
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_load_approaches_invalid_json_is_fatal() {
        let path = write_temp("neo_explorer_test_cad_invalid.json", "{\"fields\": [");
        let err = load_approaches(&path).unwrap_err();
        assert!(matches!(err, LoadError::Json { .. }));
        fs::remove_file(&path).unwrap();
    }
}
