use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use super::error::UnknownVehicleType;

// ---------------------------------------------------------------------------
// VehicleType – the closed category enum
// ---------------------------------------------------------------------------

/// Drivetrain category of a registered vehicle.
///
/// Declaration order is the fixed display order used by every view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum VehicleType {
    #[serde(rename = "BEV")]
    Bev,
    #[serde(rename = "PHEV")]
    Phev,
}

impl VehicleType {
    pub const ALL: [VehicleType; 2] = [VehicleType::Bev, VehicleType::Phev];

    /// Short label shown in charts.
    pub fn label(self) -> &'static str {
        match self {
            VehicleType::Bev => "BEV",
            VehicleType::Phev => "PHEV",
        }
    }

    /// Long form as it appears in the registration export.
    pub fn description(self) -> &'static str {
        match self {
            VehicleType::Bev => "Battery Electric Vehicle (BEV)",
            VehicleType::Phev => "Plug-in Hybrid Electric Vehicle (PHEV)",
        }
    }
}

impl FromStr for VehicleType {
    type Err = UnknownVehicleType;

    /// Accepts either the long description or the short label.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        VehicleType::ALL
            .into_iter()
            .find(|t| {
                trimmed.eq_ignore_ascii_case(t.label())
                    || trimmed.eq_ignore_ascii_case(t.description())
            })
            .ok_or_else(|| UnknownVehicleType(s.to_string()))
    }
}

impl fmt::Display for VehicleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Record – one row of the canonical table
// ---------------------------------------------------------------------------

/// A single cleaned registration record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub model_year: i32,
    pub make: String,
    pub model: String,
    pub vehicle_type: VehicleType,
    pub county: String,
    pub city: String,
    pub electric_utility: String,
    /// Normalized to integer text; `None` when the source has no such column.
    pub postal_code: Option<String>,
    /// Values of the untouched descriptive columns, aligned with
    /// [`CanonicalTable::passthrough_columns`].
    pub passthrough: Vec<String>,
}

// ---------------------------------------------------------------------------
// CanonicalTable – the complete cleaned dataset
// ---------------------------------------------------------------------------

/// The immutable, cleaned dataset with pre-computed indices.
#[derive(Debug, Clone)]
pub struct CanonicalTable {
    /// All records in source row order.
    records: Vec<Record>,
    /// Names of the descriptive columns carried through unchanged.
    passthrough_columns: Vec<String>,
    year_bounds: Option<(i32, i32)>,
    counties: BTreeSet<String>,
    vehicle_types: BTreeSet<VehicleType>,
}

impl CanonicalTable {
    /// Build the column indices from the cleaned records.
    pub fn from_records(records: Vec<Record>, passthrough_columns: Vec<String>) -> Self {
        let mut year_bounds: Option<(i32, i32)> = None;
        let mut counties = BTreeSet::new();
        let mut vehicle_types = BTreeSet::new();

        for rec in &records {
            year_bounds = Some(match year_bounds {
                None => (rec.model_year, rec.model_year),
                Some((lo, hi)) => (lo.min(rec.model_year), hi.max(rec.model_year)),
            });
            if !counties.contains(&rec.county) {
                counties.insert(rec.county.clone());
            }
            vehicle_types.insert(rec.vehicle_type);
        }

        CanonicalTable {
            records,
            passthrough_columns,
            year_bounds,
            counties,
            vehicle_types,
        }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn passthrough_columns(&self) -> &[String] {
        &self.passthrough_columns
    }

    /// Value of a pass-through column for one record.
    pub fn passthrough_value<'a>(&self, record: &'a Record, column: &str) -> Option<&'a str> {
        let idx = self.passthrough_columns.iter().position(|c| c == column)?;
        record.passthrough.get(idx).map(String::as_str)
    }

    /// `(minYearInTable, maxYearInTable)`, absent for an empty table.
    pub fn year_bounds(&self) -> Option<(i32, i32)> {
        self.year_bounds
    }

    /// Sorted distinct counties, the option list for the county selector.
    pub fn counties(&self) -> &BTreeSet<String> {
        &self.counties
    }

    /// Vehicle types that occur at least once.
    pub fn vehicle_types(&self) -> &BTreeSet<VehicleType> {
        &self.vehicle_types
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
