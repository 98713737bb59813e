use std::collections::{HashMap, HashSet};
use std::fmt::Display;
use std::hash::Hash;

use serde::Serialize;

use super::filter::{FilterSignals, FilteredView};
use super::model::{Record, VehicleType};

pub const TOP_REGIONS: usize = 10;
pub const TOP_CITIES: usize = 10;
pub const TOP_MAKES: usize = 15;
pub const TOP_MODELS: usize = 15;
pub const TOP_UTILITIES: usize = 10;
pub const CROSS_TAB_COUNTIES: usize = 5;
pub const HEATMAP_MAKES: usize = 10;

// ---------------------------------------------------------------------------
// Aggregate table shapes
// ---------------------------------------------------------------------------

/// Ordered `(key, count)` entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CountTable<K> {
    entries: Vec<(K, usize)>,
}

impl<K> Default for CountTable<K> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<K> CountTable<K> {
    pub fn entries(&self) -> &[(K, usize)] {
        &self.entries
    }

    pub fn first(&self) -> Option<&(K, usize)> {
        self.entries.first()
    }

    pub fn total(&self) -> usize {
        self.entries.iter().map(|(_, n)| n).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Display> CountTable<K> {
    /// `(label, count)` pairs for presentation.
    pub fn pairs(&self) -> Vec<(String, usize)> {
        self.entries
            .iter()
            .map(|(k, n)| (k.to_string(), *n))
            .collect()
    }
}

/// Dense row × column count matrix. Absent combinations are zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrossTab<R, C> {
    rows: Vec<R>,
    columns: Vec<C>,
    cells: Vec<Vec<usize>>,
}

impl<R, C> Default for CrossTab<R, C> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            columns: Vec::new(),
            cells: Vec::new(),
        }
    }
}

impl<R, C> CrossTab<R, C> {
    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    pub fn columns(&self) -> &[C] {
        &self.columns
    }

    /// Count at `(row, column)` position.
    pub fn get(&self, row: usize, column: usize) -> usize {
        self.cells
            .get(row)
            .and_then(|r| r.get(column))
            .copied()
            .unwrap_or(0)
    }

    pub fn row_total(&self, row: usize) -> usize {
        self.cells.get(row).map(|r| r.iter().sum()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl<R: Display, C: Display> CrossTab<R, C> {
    /// `(row label, column label, count)` triples in row-major order.
    pub fn triples(&self) -> Vec<(String, String, usize)> {
        self.rows
            .iter()
            .enumerate()
            .flat_map(|(ri, r)| {
                self.columns
                    .iter()
                    .enumerate()
                    .map(move |(ci, c)| (r.to_string(), c.to_string(), self.get(ri, ci)))
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Grouping primitives
// ---------------------------------------------------------------------------

/// Count records per key, keys in first-encountered order.
fn count_by<'a, K, F>(view: &FilteredView<'a>, key: F) -> Vec<(K, usize)>
where
    K: Eq + Hash + Clone,
    F: Fn(&'a Record) -> K,
{
    let mut slots: HashMap<K, usize> = HashMap::new();
    let mut counts: Vec<(K, usize)> = Vec::new();
    for rec in view.records() {
        let k = key(rec);
        match slots.get(&k) {
            Some(&slot) => counts[slot].1 += 1,
            None => {
                slots.insert(k.clone(), counts.len());
                counts.push((k, 1));
            }
        }
    }
    counts
}

/// Largest `n` groups by descending count. Ties go to the key that appears
/// first in the canonical table, whether or not that row survived the filter.
fn top_n<'a, F>(view: &FilteredView<'a>, key: F, n: usize) -> Vec<(&'a str, usize)>
where
    F: Fn(&'a Record) -> &'a str,
{
    let mut counts = count_by(view, &key);

    let mut first_row: HashMap<&'a str, usize> = HashMap::with_capacity(counts.len());
    for (i, rec) in view.table().records().iter().enumerate() {
        first_row.entry(key(rec)).or_insert(i);
    }
    let rank = |k: &str| first_row.get(k).copied().unwrap_or(usize::MAX);

    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| rank(a.0).cmp(&rank(b.0))));
    counts.truncate(n);
    counts
}

fn owned(entries: Vec<(&str, usize)>) -> CountTable<String> {
    CountTable {
        entries: entries
            .into_iter()
            .map(|(k, n)| (k.to_string(), n))
            .collect(),
    }
}

/// Fill a dense matrix for the given row and column keys.
fn tally<'a, R, C, F>(view: &FilteredView<'a>, rows: &[R], columns: &[C], key: F) -> Vec<Vec<usize>>
where
    R: Eq + Hash,
    C: Eq + Hash,
    F: Fn(&'a Record) -> (R, C),
{
    let row_pos: HashMap<&R, usize> = rows.iter().enumerate().map(|(i, r)| (r, i)).collect();
    let col_pos: HashMap<&C, usize> = columns.iter().enumerate().map(|(i, c)| (c, i)).collect();

    let mut cells = vec![vec![0usize; columns.len()]; rows.len()];
    for rec in view.records() {
        let (r, c) = key(rec);
        if let (Some(&ri), Some(&ci)) = (row_pos.get(&r), col_pos.get(&c)) {
            cells[ri][ci] += 1;
        }
    }
    cells
}

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

pub fn top_regions(view: &FilteredView<'_>) -> CountTable<String> {
    owned(top_n(view, |r| r.county.as_str(), TOP_REGIONS))
}

pub fn top_cities(view: &FilteredView<'_>) -> CountTable<String> {
    owned(top_n(view, |r| r.city.as_str(), TOP_CITIES))
}

pub fn top_makes(view: &FilteredView<'_>) -> CountTable<String> {
    owned(top_n(view, |r| r.make.as_str(), TOP_MAKES))
}

pub fn top_models(view: &FilteredView<'_>) -> CountTable<String> {
    owned(top_n(view, |r| r.model.as_str(), TOP_MODELS))
}

pub fn top_utilities(view: &FilteredView<'_>) -> CountTable<String> {
    owned(top_n(view, |r| r.electric_utility.as_str(), TOP_UTILITIES))
}

/// Registrations per model year, ascending, every year present.
pub fn year_trend(view: &FilteredView<'_>) -> CountTable<i32> {
    let mut entries = count_by(view, |r| r.model_year);
    entries.sort_by_key(|(year, _)| *year);
    CountTable { entries }
}

/// Year with the highest count; the earliest year wins a tie.
pub fn peak_year(trend: &CountTable<i32>) -> Option<(i32, usize)> {
    let mut best: Option<(i32, usize)> = None;
    for &(year, n) in trend.entries() {
        if best.map_or(true, |(_, top)| n > top) {
            best = Some((year, n));
        }
    }
    best
}

/// Counts per vehicle type in enum order; types with no records are omitted.
pub fn type_totals(view: &FilteredView<'_>) -> CountTable<VehicleType> {
    let counts = count_by(view, |r| r.vehicle_type);
    let entries = VehicleType::ALL
        .into_iter()
        .filter_map(|t| counts.iter().find(|(k, _)| *k == t).map(|&(_, n)| (t, n)))
        .collect();
    CountTable { entries }
}

/// Top counties by total (descending) × every vehicle type.
pub fn type_by_region(view: &FilteredView<'_>) -> CrossTab<String, VehicleType> {
    if view.is_empty() {
        return CrossTab::default();
    }
    let counties: Vec<&str> = top_n(view, |r| r.county.as_str(), CROSS_TAB_COUNTIES)
        .into_iter()
        .map(|(county, _)| county)
        .collect();
    let columns = VehicleType::ALL.to_vec();
    let cells = tally(view, &counties, &columns, |r| (r.county.as_str(), r.vehicle_type));

    CrossTab {
        rows: counties.into_iter().map(str::to_string).collect(),
        columns,
        cells,
    }
}

/// Top makes by total (descending) × the ascending model years those makes span.
pub fn make_year_heatmap(view: &FilteredView<'_>) -> CrossTab<String, i32> {
    if view.is_empty() {
        return CrossTab::default();
    }
    let makes: Vec<&str> = top_n(view, |r| r.make.as_str(), HEATMAP_MAKES)
        .into_iter()
        .map(|(make, _)| make)
        .collect();
    let selected: HashSet<&str> = makes.iter().copied().collect();

    let mut years: Vec<i32> = view
        .records()
        .filter(|r| selected.contains(r.make.as_str()))
        .map(|r| r.model_year)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    years.sort_unstable();

    let cells = tally(view, &makes, &years, |r| (r.make.as_str(), r.model_year));

    CrossTab {
        rows: makes.into_iter().map(str::to_string).collect(),
        columns: years,
        cells,
    }
}

// ---------------------------------------------------------------------------
// Summary metrics and the full dashboard
// ---------------------------------------------------------------------------

/// Headline figures shown above the charts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub canonical_total: usize,
    /// Share of the canonical table, `None` when that table is empty.
    pub share_of_canonical_pct: Option<f64>,
    pub bev: usize,
    pub phev: usize,
    pub bev_share_pct: f64,
    pub phev_share_pct: f64,
    pub distinct_makes: usize,
    pub distinct_models: usize,
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

pub fn summary(view: &FilteredView<'_>) -> Summary {
    let total = view.len();
    let canonical_total = view.table().len();
    let of_type = |t: VehicleType| view.records().filter(|r| r.vehicle_type == t).count();
    let bev = of_type(VehicleType::Bev);
    let phev = of_type(VehicleType::Phev);

    Summary {
        total,
        canonical_total,
        share_of_canonical_pct: (canonical_total > 0).then(|| percent(total, canonical_total)),
        bev,
        phev,
        bev_share_pct: percent(bev, total),
        phev_share_pct: percent(phev, total),
        distinct_makes: view.records().map(|r| r.make.as_str()).collect::<HashSet<_>>().len(),
        distinct_models: view.records().map(|r| r.model.as_str()).collect::<HashSet<_>>().len(),
    }
}

/// Every aggregate the dashboard renders for one filter state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub signals: FilterSignals,
    pub summary: Summary,
    pub top_regions: CountTable<String>,
    pub top_cities: CountTable<String>,
    pub year_trend: CountTable<i32>,
    pub peak_year: Option<(i32, usize)>,
    pub top_makes: CountTable<String>,
    pub top_models: CountTable<String>,
    pub type_totals: CountTable<VehicleType>,
    pub type_by_region: CrossTab<String, VehicleType>,
    pub top_utilities: CountTable<String>,
    pub make_year_heatmap: CrossTab<String, i32>,
}

impl Dashboard {
    pub fn compute(view: &FilteredView<'_>, signals: FilterSignals) -> Self {
        let year_trend = year_trend(view);
        Dashboard {
            signals,
            summary: summary(view),
            top_regions: top_regions(view),
            top_cities: top_cities(view),
            peak_year: peak_year(&year_trend),
            year_trend,
            top_makes: top_makes(view),
            top_models: top_models(view),
            type_totals: type_totals(view),
            type_by_region: type_by_region(view),
            top_utilities: top_utilities(view),
            make_year_heatmap: make_year_heatmap(view),
        }
    }
}
