use std::collections::BTreeSet;

use log::{debug, warn};
use serde::Serialize;

use super::error::FilterError;
use super::model::{CanonicalTable, Record, VehicleType};

/// First model year selected when the dashboard opens.
pub const DEFAULT_FIRST_YEAR: i32 = 2015;

// ---------------------------------------------------------------------------
// Filter specification
// ---------------------------------------------------------------------------

/// Inclusive model-year bounds, `min <= max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct YearRange {
    min: i32,
    max: i32,
}

impl YearRange {
    pub fn new(min: i32, max: i32) -> Result<Self, FilterError> {
        if min > max {
            return Err(FilterError::InvertedYearRange { min, max });
        }
        Ok(Self { min, max })
    }

    /// Clamp each bound into the table's `(lo, hi)` years, then validate.
    ///
    /// A start year past the last model year therefore narrows to that year
    /// instead of failing against an end year that was already clamped.
    pub fn within(min: i32, max: i32, bounds: Option<(i32, i32)>) -> Result<Self, FilterError> {
        match bounds {
            Some((lo, hi)) => Self::new(min.clamp(lo, hi), max.clamp(lo, hi)),
            None => Self::new(min, max),
        }
    }

    pub fn min(self) -> i32 {
        self.min
    }

    pub fn max(self) -> i32 {
        self.max
    }

    pub fn contains(self, year: i32) -> bool {
        self.min <= year && year <= self.max
    }

    /// Clamp both ends into `(lo, hi)`, the table's year bounds.
    pub fn clamp_to(self, (lo, hi): (i32, i32)) -> Self {
        Self {
            min: self.min.clamp(lo, hi),
            max: self.max.clamp(lo, hi),
        }
    }
}

/// The analyst's selection for one render cycle.
///
/// `vehicle_types` is mandatory: an empty set selects nothing.
/// `counties` is advisory: an empty set means no county restriction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterSpec {
    pub year_range: YearRange,
    pub vehicle_types: BTreeSet<VehicleType>,
    pub counties: BTreeSet<String>,
}

impl FilterSpec {
    pub fn new(
        year_range: YearRange,
        vehicle_types: BTreeSet<VehicleType>,
        counties: BTreeSet<String>,
    ) -> Self {
        Self {
            year_range,
            vehicle_types,
            counties,
        }
    }

    /// Build a spec from the presentation's raw string inputs.
    pub fn from_labels<T, C>(min: i32, max: i32, types: T, counties: C) -> Result<Self, FilterError>
    where
        T: IntoIterator,
        T::Item: AsRef<str>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        let vehicle_types = types
            .into_iter()
            .map(|t| t.as_ref().parse::<VehicleType>())
            .collect::<Result<BTreeSet<_>, _>>()?;
        Ok(Self::new(
            YearRange::new(min, max)?,
            vehicle_types,
            counties.into_iter().map(Into::into).collect(),
        ))
    }

    /// Initial widget state: `DEFAULT_FIRST_YEAR..=max`, every type, any county.
    pub fn dashboard_default(table: &CanonicalTable) -> Self {
        let bounds = table.year_bounds().unwrap_or((DEFAULT_FIRST_YEAR, DEFAULT_FIRST_YEAR));
        let year_range = YearRange {
            min: DEFAULT_FIRST_YEAR,
            max: bounds.1.max(DEFAULT_FIRST_YEAR),
        }
        .clamp_to(bounds);
        Self::new(
            year_range,
            VehicleType::ALL.into_iter().collect(),
            BTreeSet::new(),
        )
    }
}

// ---------------------------------------------------------------------------
// Filtered view
// ---------------------------------------------------------------------------

/// Row positions of the canonical table that passed the filters, in source order.
#[derive(Debug, Clone)]
pub struct FilteredView<'a> {
    table: &'a CanonicalTable,
    indices: Vec<usize>,
}

impl<'a> FilteredView<'a> {
    /// The unfiltered table, used for the empty-result fallback.
    pub fn all(table: &'a CanonicalTable) -> Self {
        Self {
            table,
            indices: (0..table.len()).collect(),
        }
    }

    pub fn table(&self) -> &'a CanonicalTable {
        self.table
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn records(&self) -> impl Iterator<Item = &'a Record> + '_ {
        let records = self.table.records();
        self.indices.iter().map(move |&i| &records[i])
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

impl PartialEq for FilteredView<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.table, other.table) && self.indices == other.indices
    }
}

/// The two scalar signals presentation uses for banners and fallback.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FilterSignals {
    pub is_empty: bool,
    pub county_filter_was_dropped: bool,
}

/// Result of [`apply`]: the view plus its signals.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterOutcome<'a> {
    pub view: FilteredView<'a>,
    pub signals: FilterSignals,
}

// ---------------------------------------------------------------------------
// Filtering
// ---------------------------------------------------------------------------

/// Apply a filter specification to the canonical table.
///
/// A record is kept when its model year is inside `year_range` and its type is
/// in `vehicle_types`. A non-empty `counties` set then narrows the result,
/// unless that would leave nothing, in which case the county restriction is
/// skipped and `county_filter_was_dropped` is set. The engine never falls back
/// to the full table itself; it only reports `is_empty`.
pub fn apply<'a>(table: &'a CanonicalTable, spec: &FilterSpec) -> FilterOutcome<'a> {
    let records = table.records();

    let base: Vec<usize> = records
        .iter()
        .enumerate()
        .filter(|(_, rec)| {
            spec.year_range.contains(rec.model_year) && spec.vehicle_types.contains(&rec.vehicle_type)
        })
        .map(|(i, _)| i)
        .collect();

    let mut county_filter_was_dropped = false;
    let indices = if spec.counties.is_empty() {
        base
    } else {
        let narrowed: Vec<usize> = base
            .iter()
            .copied()
            .filter(|&i| spec.counties.contains(&records[i].county))
            .collect();
        if narrowed.is_empty() {
            warn!(
                "county filter {:?} leaves no rows; showing year/type selection only",
                spec.counties
            );
            county_filter_was_dropped = true;
            base
        } else {
            narrowed
        }
    };

    debug!("filter kept {} of {} records", indices.len(), table.len());

    FilterOutcome {
        signals: FilterSignals {
            is_empty: indices.is_empty(),
            county_filter_was_dropped,
        },
        view: FilteredView { table, indices },
    }
}
