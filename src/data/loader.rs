use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use arrow::array::Array;
use arrow::util::display::array_value_to_string;
use log::{debug, info};
use once_cell::sync::OnceCell;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::file::reader::ChunkReader;
use serde_json::Value as JsonValue;

use super::error::DataUnavailableError;
use super::model::{CanonicalTable, Record, VehicleType};

/// Public Washington State electric vehicle population export.
pub const DEFAULT_SOURCE: &str = "https://raw.githubusercontent.com/ginamalia/dataset/refs/heads/main/Electric_Vehicle_Population_Data.csv";

/// Columns no downstream view reads. Absent ones are ignored.
const DROPPED_COLUMNS: &[&str] = &[
    "Base MSRP",
    "Electric Range",
    "Legislative District",
    "VIN (1-10)",
    "DOL Vehicle ID",
    "2020 Census Tract",
    "Vehicle Location",
];

const COL_MODEL_YEAR: &str = "Model Year";
const COL_MAKE: &str = "Make";
const COL_MODEL: &str = "Model";
const COL_VEHICLE_TYPE: &str = "Electric Vehicle Type";
const COL_COUNTY: &str = "County";
const COL_CITY: &str = "City";
const COL_UTILITY: &str = "Electric Utility";
const COL_POSTAL_CODE: &str = "Postal Code";

const REQUIRED_COLUMNS: &[&str] = &[
    COL_MODEL_YEAR,
    COL_MAKE,
    COL_MODEL,
    COL_VEHICLE_TYPE,
    COL_COUNTY,
    COL_CITY,
    COL_UTILITY,
];

/// Cell texts treated as missing, in addition to the empty string.
const NA_MARKERS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

// ---------------------------------------------------------------------------
// Source
// ---------------------------------------------------------------------------

/// Where the registration data comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Url(String),
    Path(PathBuf),
}

impl Source {
    /// `http://` and `https://` identifiers are fetched, anything else is a path.
    pub fn parse(identifier: &str) -> Self {
        let lower = identifier.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Source::Url(identifier.to_string())
        } else {
            Source::Path(PathBuf::from(identifier))
        }
    }

    fn format(&self) -> Result<Format> {
        match self {
            Source::Path(path) => Format::from_path(path),
            Source::Url(url) => {
                // Only the path carries an extension; host, query and fragment don't.
                let parsed =
                    reqwest::Url::parse(url).with_context(|| format!("Invalid URL: {url}"))?;
                Format::from_path(Path::new(parsed.path()))
            }
        }
    }
}

impl Default for Source {
    fn default() -> Self {
        Source::parse(DEFAULT_SOURCE)
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Url(url) => write!(f, "{url}"),
            Source::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Csv,
    Json,
    Parquet,
}

impl Format {
    /// Dispatch by extension. No extension means CSV.
    fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        match ext.as_str() {
            "" | "csv" => Ok(Format::Csv),
            "json" => Ok(Format::Json),
            "parquet" | "pq" => Ok(Format::Parquet),
            other => bail!("Unsupported file extension: .{other}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Fetch, parse and clean the registration data.
///
/// This is the only place the dashboard touches the network or disk; the
/// file or response is dropped before the table is returned.
pub fn load(source: &Source) -> Result<CanonicalTable, DataUnavailableError> {
    let location = source.to_string();
    info!("loading registration data from {location}");

    let malformed = |err: anyhow::Error| DataUnavailableError::Malformed {
        location: location.clone(),
        reason: format!("{err:#}"),
    };
    let unreachable = |err: anyhow::Error| DataUnavailableError::Unreachable {
        location: location.clone(),
        reason: format!("{err:#}"),
    };

    let format = source.format().map_err(malformed)?;

    let raw = match source {
        Source::Path(path) => {
            let file = File::open(path)
                .with_context(|| format!("opening {}", path.display()))
                .map_err(unreachable)?;
            match format {
                Format::Csv => read_csv(BufReader::new(file)),
                Format::Json => read_json(BufReader::new(file)),
                Format::Parquet => read_parquet(file),
            }
        }
        Source::Url(url) => {
            let body = reqwest::blocking::get(url.as_str())
                .and_then(|response| response.error_for_status())
                .and_then(|response| response.bytes())
                .with_context(|| format!("GET {url}"))
                .map_err(unreachable)?;
            debug!("fetched {} bytes from {url}", body.len());
            match format {
                Format::Csv => read_csv(&body[..]),
                Format::Json => read_json(&body[..]),
                Format::Parquet => read_parquet(body),
            }
        }
    }
    .map_err(malformed)?;

    clean(raw, &location)
}

/// One-shot memoized accessor for the canonical table.
///
/// The first successful [`TableCache::get`] loads the table; every later call
/// returns the same reference. A failed load leaves the cache empty.
#[derive(Debug)]
pub struct TableCache {
    source: Source,
    table: OnceCell<CanonicalTable>,
}

impl TableCache {
    pub fn new(source: Source) -> Self {
        Self {
            source,
            table: OnceCell::new(),
        }
    }

    pub fn get(&self) -> Result<&CanonicalTable, DataUnavailableError> {
        self.table.get_or_try_init(|| load(&self.source))
    }

    pub fn is_loaded(&self) -> bool {
        self.table.get().is_some()
    }
}

// ---------------------------------------------------------------------------
// Raw table: every format is lifted into string cells first
// ---------------------------------------------------------------------------

/// Headers plus rows of optional text cells; `None` marks a missing value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

fn cell(text: &str) -> Option<String> {
    if text.is_empty() || NA_MARKERS.contains(&text) {
        None
    } else {
        Some(text.to_string())
    }
}

/// CSV with a header row.
fn read_csv<R: Read>(reader: R) -> Result<RawTable> {
    let mut reader = csv::Reader::from_reader(reader);
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {}", row_no + 1))?;
        rows.push(record.iter().map(cell).collect());
    }

    Ok(RawTable { headers, rows })
}

/// Records-oriented JSON, the default `df.to_json(orient='records')`:
///
/// ```json
/// [
///   { "Model Year": 2019, "Make": "TESLA", "County": "King", ... },
///   ...
/// ]
/// ```
fn read_json<R: Read>(reader: R) -> Result<RawTable> {
    let root: JsonValue = serde_json::from_reader(reader).context("parsing JSON")?;
    let records = root.as_array().context("Expected top-level JSON array")?;

    let mut headers: Vec<String> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {} is not a JSON object", i + 1))?;
        for key in obj.keys() {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }
    }

    let rows = records
        .iter()
        .filter_map(|rec| rec.as_object())
        .map(|obj| {
            headers
                .iter()
                .map(|h| obj.get(h).and_then(json_to_cell))
                .collect()
        })
        .collect();

    Ok(RawTable { headers, rows })
}

fn json_to_cell(val: &JsonValue) -> Option<String> {
    match val {
        JsonValue::Null => None,
        JsonValue::String(s) => cell(s),
        other => cell(&other.to_string()),
    }
}

/// Parquet as written by Pandas or Polars; any column type with a text
/// rendering is accepted.
fn read_parquet<T: ChunkReader + 'static>(input: T) -> Result<RawTable> {
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(input).context("reading parquet metadata")?;
    let headers: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        for row in 0..batch.num_rows() {
            let mut cells = Vec::with_capacity(batch.num_columns());
            for (col_idx, col) in batch.columns().iter().enumerate() {
                if col.is_null(row) {
                    cells.push(None);
                    continue;
                }
                let text = array_value_to_string(col.as_ref(), row).with_context(|| {
                    format!("Row {row}: failed to read '{}'", headers[col_idx])
                })?;
                cells.push(cell(&text));
            }
            rows.push(cells);
        }
    }

    Ok(RawTable { headers, rows })
}

// ---------------------------------------------------------------------------
// Cleaning
// ---------------------------------------------------------------------------

/// Column positions resolved once from the header row.
#[derive(Debug)]
struct Schema {
    /// Every column that survives the deny-list; a row must be complete in all of them.
    kept: Vec<usize>,
    model_year: usize,
    make: usize,
    model: usize,
    vehicle_type: usize,
    county: usize,
    city: usize,
    utility: usize,
    postal_code: Option<usize>,
    passthrough: Vec<(usize, String)>,
}

impl Schema {
    /// Fails with the full list of absent required columns.
    fn resolve(headers: &[String]) -> Result<Self, Vec<String>> {
        let kept: Vec<usize> = headers
            .iter()
            .enumerate()
            .filter(|(_, h)| !DROPPED_COLUMNS.contains(&h.as_str()))
            .map(|(i, _)| i)
            .collect();
        let position = |name: &str| kept.iter().copied().find(|&i| headers[i] == name);

        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|&&name| position(name).is_none())
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(missing);
        }

        let known = |i: usize| {
            REQUIRED_COLUMNS.contains(&headers[i].as_str()) || headers[i] == COL_POSTAL_CODE
        };
        let passthrough = kept
            .iter()
            .copied()
            .filter(|&i| !known(i))
            .map(|i| (i, headers[i].clone()))
            .collect();

        // Every required column was found above.
        let required = |name: &str| position(name).unwrap_or_default();
        Ok(Schema {
            model_year: required(COL_MODEL_YEAR),
            make: required(COL_MAKE),
            model: required(COL_MODEL),
            vehicle_type: required(COL_VEHICLE_TYPE),
            county: required(COL_COUNTY),
            city: required(COL_CITY),
            utility: required(COL_UTILITY),
            postal_code: position(COL_POSTAL_CODE),
            passthrough,
            kept,
        })
    }
}

/// Drop deny-listed columns and incomplete rows, then type the survivors.
pub fn clean(raw: RawTable, location: &str) -> Result<CanonicalTable, DataUnavailableError> {
    let schema = Schema::resolve(&raw.headers).map_err(|columns| {
        DataUnavailableError::MissingColumns {
            location: location.to_string(),
            columns,
        }
    })?;
    debug!(
        "dropping {} column(s), keeping {}",
        raw.headers.len() - schema.kept.len(),
        schema.kept.len()
    );

    let total = raw.rows.len();
    let mut records = Vec::with_capacity(total);

    for (row_no, row) in raw.rows.iter().enumerate() {
        let value = |i: usize| row.get(i).and_then(|c| c.as_deref());
        if schema.kept.iter().any(|&i| value(i).is_none()) {
            continue;
        }
        let text = |i: usize| value(i).unwrap_or_default().to_string();
        let malformed = |column: &str, reason: String| DataUnavailableError::Malformed {
            location: location.to_string(),
            reason: format!("row {}, column '{column}': {reason}", row_no + 1),
        };

        let year_text = text(schema.model_year);
        let model_year = parse_model_year(&year_text)
            .ok_or_else(|| malformed(COL_MODEL_YEAR, format!("'{year_text}' is not a year")))?;
        let vehicle_type = text(schema.vehicle_type)
            .parse::<VehicleType>()
            .map_err(|err| malformed(COL_VEHICLE_TYPE, format!("{err}")))?;
        let postal_code = match schema.postal_code {
            Some(i) => {
                let raw_code = text(i);
                Some(normalize_postal_code(&raw_code).ok_or_else(|| {
                    malformed(COL_POSTAL_CODE, format!("'{raw_code}' is not numeric"))
                })?)
            }
            None => None,
        };

        records.push(Record {
            model_year,
            make: text(schema.make),
            model: text(schema.model),
            vehicle_type,
            county: text(schema.county),
            city: text(schema.city),
            electric_utility: text(schema.utility),
            postal_code,
            passthrough: schema.passthrough.iter().map(|(i, _)| text(*i)).collect(),
        });
    }

    if records.is_empty() {
        return Err(DataUnavailableError::Empty {
            location: location.to_string(),
        });
    }

    info!(
        "loaded {} records from {location} ({} incomplete rows dropped)",
        records.len(),
        total - records.len()
    );

    let passthrough_columns = schema.passthrough.into_iter().map(|(_, name)| name).collect();
    Ok(CanonicalTable::from_records(records, passthrough_columns))
}

/// Integer years, tolerating a float rendering such as `2019.0`.
fn parse_model_year(s: &str) -> Option<i32> {
    let s = s.trim();
    if let Ok(year) = s.parse::<i32>() {
        return Some(year);
    }
    let f = s.parse::<f64>().ok()?;
    (f.is_finite() && f.fract() == 0.0 && f.abs() <= i32::MAX as f64).then_some(f as i32)
}

/// `98101.0` → `"98101"`: parse as float, truncate, render as integer text.
fn normalize_postal_code(s: &str) -> Option<String> {
    let f = s.trim().parse::<f64>().ok()?;
    if !f.is_finite() {
        return None;
    }
    Some(format!("{}", f.trunc() as i64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Arc;

    use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
    use arrow::datatypes::{DataType, Field, Schema as ArrowSchema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;

    const HEADER: &str = "VIN (1-10),County,City,State,Postal Code,Model Year,Make,Model,Electric Vehicle Type,Clean Alternative Fuel Vehicle (CAFV) Eligibility,Electric Range,Base MSRP,Legislative District,DOL Vehicle ID,Vehicle Location,Electric Utility,2020 Census Tract";

    fn init_logs() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn sample_csv() -> String {
        [
            HEADER,
            "5YJ3E1EB4L,King,Seattle,WA,98122.0,2020,TESLA,MODEL 3,Battery Electric Vehicle (BEV),Eligible,266,0,37,125701579,POINT (-122.3 47.6),CITY OF SEATTLE - (WA),53033007800",
            "1N4AZ0CP8D,Pierce,Tacoma,WA,98407,2013,NISSAN,LEAF,Battery Electric Vehicle (BEV),Eligible,75,0,27,2757204,,BONNEVILLE POWER ADMINISTRATION,53053060700",
            "JTMAB3FV7P,King,Bellevue,WA,98004.0,2023,TOYOTA,RAV4 PRIME,Plug-in Hybrid Electric Vehicle (PHEV),Eligible,42,0,48,249905295,POINT (-122.2 47.6),,53033023801",
            "WBY8P6C05L,Kitsap,Bremerton,WA,98310.0,NaN,BMW,I3,Plug-in Hybrid Electric Vehicle (PHEV),Eligible,126,0,23,107934412,,PUGET SOUND ENERGY INC,53035080700",
        ]
        .join("\n")
    }

    fn clean_csv(text: &str) -> Result<CanonicalTable, DataUnavailableError> {
        let raw = read_csv(text.as_bytes()).expect("valid csv");
        clean(raw, "test")
    }

    #[test]
    fn drops_incomplete_rows_and_normalizes_postal_codes() {
        init_logs();
        let table = clean_csv(&sample_csv()).unwrap();

        // Third row has no utility, fourth has a NaN model year. The second row
        // has a blank Vehicle Location, which is deny-listed and so irrelevant.
        assert_eq!(table.len(), 2);
        let makes: Vec<&str> = table.records().iter().map(|r| r.make.as_str()).collect();
        assert_eq!(makes, vec!["TESLA", "NISSAN"]);

        let first = &table.records()[0];
        assert_eq!(first.postal_code.as_deref(), Some("98122"));
        assert_eq!(first.vehicle_type, VehicleType::Bev);
        assert_eq!(first.model_year, 2020);
        assert_eq!(first.model, "MODEL 3");
        assert_eq!(first.county, "King");
        assert_eq!(first.city, "Seattle");
        assert_eq!(first.electric_utility, "CITY OF SEATTLE - (WA)");

        let second = &table.records()[1];
        assert_eq!(second.postal_code.as_deref(), Some("98407"));
        assert_eq!((second.county.as_str(), second.city.as_str()), ("Pierce", "Tacoma"));
        assert_eq!(second.electric_utility, "BONNEVILLE POWER ADMINISTRATION");
    }

    #[test]
    fn deny_listed_columns_do_not_pass_through() {
        let table = clean_csv(&sample_csv()).unwrap();
        assert_eq!(
            table.passthrough_columns(),
            &[
                "State".to_string(),
                "Clean Alternative Fuel Vehicle (CAFV) Eligibility".to_string()
            ]
        );
        let first = &table.records()[0];
        assert_eq!(table.passthrough_value(first, "State"), Some("WA"));
    }

    #[test]
    fn missing_required_columns_fail_fast() {
        let text = "County,City,Model Year,Make\nKing,Seattle,2020,TESLA\n";
        match clean_csv(text) {
            Err(DataUnavailableError::MissingColumns { columns, .. }) => assert_eq!(
                columns,
                vec!["Model", "Electric Vehicle Type", "Electric Utility"]
            ),
            other => panic!("expected MissingColumns, got {other:?}"),
        }
    }

    #[test]
    fn postal_code_is_optional() {
        let text = "County,City,Model Year,Make,Model,Electric Vehicle Type,Electric Utility\n\
                    King,Seattle,2020,TESLA,MODEL Y,BEV,PUGET SOUND ENERGY INC\n";
        let table = clean_csv(text).unwrap();
        assert_eq!(table.records()[0].postal_code, None);
        assert!(table.passthrough_columns().is_empty());
    }

    #[test]
    fn unknown_vehicle_type_is_malformed() {
        let text = "County,City,Model Year,Make,Model,Electric Vehicle Type,Electric Utility\n\
                    King,Seattle,2020,TOYOTA,MIRAI,Fuel Cell Vehicle (FCV),PUGET SOUND ENERGY INC\n";
        match clean_csv(text) {
            Err(DataUnavailableError::Malformed { reason, .. }) => {
                assert!(reason.contains("row 1"), "{reason}");
                assert!(reason.contains("Fuel Cell Vehicle (FCV)"), "{reason}");
            }
            other => panic!("expected Malformed, got {other:?}"),
        }
    }

    #[test]
    fn all_rows_incomplete_is_empty() {
        let text = format!("{HEADER}\n,,,,,,,,,,,,,,,,\n");
        assert!(matches!(
            clean_csv(&text),
            Err(DataUnavailableError::Empty { .. })
        ));
    }

    #[test]
    fn year_and_postal_parsing() {
        assert_eq!(parse_model_year("2019"), Some(2019));
        assert_eq!(parse_model_year("2019.0"), Some(2019));
        assert_eq!(parse_model_year("2019.5"), None);
        assert_eq!(parse_model_year("soon"), None);
        assert_eq!(normalize_postal_code("98101.0").as_deref(), Some("98101"));
        assert_eq!(normalize_postal_code("98101").as_deref(), Some("98101"));
        assert_eq!(normalize_postal_code("inf"), None);
        assert_eq!(normalize_postal_code("WA"), None);
    }

    #[test]
    fn source_dispatch() {
        assert_eq!(
            Source::parse("https://example.org/ev.csv"),
            Source::Url("https://example.org/ev.csv".to_string())
        );
        assert_eq!(
            Source::parse("data/ev.parquet"),
            Source::Path(PathBuf::from("data/ev.parquet"))
        );
        assert_eq!(
            Source::parse("https://example.org/ev.json?raw=1").format().unwrap(),
            Format::Json
        );
        assert_eq!(Source::parse("data/ev").format().unwrap(), Format::Csv);
        assert!(Source::parse("data/ev.xlsx").format().is_err());
        assert_eq!(Source::parse("https://example.org").format().unwrap(), Format::Csv);
        assert_eq!(
            Source::parse("https://data.example.org/export#ev.parquet").format().unwrap(),
            Format::Csv
        );
        assert!(matches!(Source::default(), Source::Url(_)));
    }

    #[test]
    fn missing_file_is_unreachable() {
        let source = Source::parse("/definitely/not/here/ev.csv");
        assert!(matches!(
            load(&source),
            Err(DataUnavailableError::Unreachable { .. })
        ));
    }

    #[test]
    fn loads_json_records() {
        let json = r#"[
            {"County": "King", "City": "Seattle", "Postal Code": 98101.0, "Model Year": 2021,
             "Make": "TESLA", "Model": "MODEL Y", "Electric Vehicle Type": "Battery Electric Vehicle (BEV)",
             "Electric Utility": "CITY OF SEATTLE - (WA)", "Zeta": "z", "Alpha": "a"},
            {"County": "King", "City": "Seattle", "Postal Code": null, "Model Year": 2021,
             "Make": "TESLA", "Model": "MODEL Y", "Electric Vehicle Type": "Battery Electric Vehicle (BEV)",
             "Electric Utility": "CITY OF SEATTLE - (WA)", "Zeta": "z", "Alpha": "a"},
            {"County": "Clark", "City": "Vancouver", "Postal Code": 98661, "Model Year": 2018,
             "Make": "CHEVROLET", "Model": "VOLT", "Electric Vehicle Type": "Plug-in Hybrid Electric Vehicle (PHEV)",
             "Electric Utility": "BONNEVILLE POWER ADMINISTRATION", "Zeta": "z", "Alpha": "a"}
        ]"#;
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let table = load(&Source::Path(file.path().to_path_buf())).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.records()[0].postal_code.as_deref(), Some("98101"));
        assert_eq!(table.records()[1].vehicle_type, VehicleType::Phev);
        // Pass-through columns keep the order the keys were written in.
        assert_eq!(table.passthrough_columns(), &["Zeta".to_string(), "Alpha".to_string()]);
    }

    #[test]
    fn loads_parquet_with_nulls() {
        let schema = Arc::new(ArrowSchema::new(vec![
            Field::new("County", DataType::Utf8, true),
            Field::new("City", DataType::Utf8, false),
            Field::new("Postal Code", DataType::Float64, true),
            Field::new("Model Year", DataType::Int64, false),
            Field::new("Make", DataType::Utf8, false),
            Field::new("Model", DataType::Utf8, false),
            Field::new("Electric Vehicle Type", DataType::Utf8, false),
            Field::new("Electric Utility", DataType::Utf8, false),
        ]));
        let columns: Vec<ArrayRef> = vec![
            Arc::new(StringArray::from(vec![Some("King"), None, Some("Spokane")])),
            Arc::new(StringArray::from(vec!["Seattle", "Everett", "Spokane"])),
            Arc::new(Float64Array::from(vec![Some(98109.0), Some(98201.0), None])),
            Arc::new(Int64Array::from(vec![2022, 2017, 2016])),
            Arc::new(StringArray::from(vec!["KIA", "FORD", "BMW"])),
            Arc::new(StringArray::from(vec!["EV6", "FUSION", "X5"])),
            Arc::new(StringArray::from(vec![
                "Battery Electric Vehicle (BEV)",
                "Plug-in Hybrid Electric Vehicle (PHEV)",
                "Plug-in Hybrid Electric Vehicle (PHEV)",
            ])),
            Arc::new(StringArray::from(vec![
                "CITY OF SEATTLE - (WA)",
                "PUGET SOUND ENERGY INC",
                "AVISTA CORP",
            ])),
        ];
        let batch = RecordBatch::try_new(schema.clone(), columns).unwrap();

        let file = tempfile::Builder::new().suffix(".parquet").tempfile().unwrap();
        let mut writer = ArrowWriter::try_new(file.reopen().unwrap(), schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let table = load(&Source::Path(file.path().to_path_buf())).unwrap();
        assert_eq!(table.len(), 1);
        let rec = &table.records()[0];
        assert_eq!(rec.make, "KIA");
        assert_eq!(rec.model_year, 2022);
        assert_eq!(rec.postal_code.as_deref(), Some("98109"));
    }

    #[test]
    fn cache_loads_once() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(sample_csv().as_bytes()).unwrap();
        let path = file.path().to_path_buf();

        let cache = TableCache::new(Source::Path(path));
        assert!(!cache.is_loaded());
        let first = cache.get().unwrap() as *const CanonicalTable;

        // The source disappearing does not matter once the table is cached.
        drop(file);
        let second = cache.get().unwrap() as *const CanonicalTable;
        assert!(cache.is_loaded());
        assert_eq!(first, second);
    }

    #[test]
    fn failed_load_is_not_cached() {
        let cache = TableCache::new(Source::parse("/definitely/not/here/ev.csv"));
        assert!(cache.get().is_err());
        assert!(!cache.is_loaded());
    }
}
