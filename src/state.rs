use log::{info, warn};

use crate::data::aggregate::Dashboard;
use crate::data::error::FilterError;
use crate::data::filter::{FilterSignals, FilterSpec, FilteredView, YearRange, apply};
use crate::data::model::{CanonicalTable, VehicleType};

// ---------------------------------------------------------------------------
// Dashboard state
// ---------------------------------------------------------------------------

/// Severity of the banner shown above the charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Warning,
    Error,
}

/// The full dashboard state, independent of rendering.
pub struct DashboardState<'a> {
    /// Loaded canonical table (immutable for the session).
    pub table: &'a CanonicalTable,

    /// Current filter selections.
    pub filters: FilterSpec,

    /// Aggregates for the current selections (recomputed on every change).
    pub dashboard: Dashboard,

    /// Banners shown in the UI for this render cycle, warnings first.
    pub status_messages: Vec<(StatusLevel, String)>,
}

impl<'a> DashboardState<'a> {
    /// Open the dashboard with the default filter state.
    pub fn new(table: &'a CanonicalTable) -> Self {
        Self::with_filters(table, FilterSpec::dashboard_default(table))
    }

    pub fn with_filters(table: &'a CanonicalTable, filters: FilterSpec) -> Self {
        let (dashboard, status_messages) = render(table, &filters);
        Self {
            table,
            filters,
            dashboard,
            status_messages,
        }
    }

    pub fn signals(&self) -> FilterSignals {
        self.dashboard.signals
    }

    /// Recompute every aggregate after a filter change.
    pub fn refilter(&mut self) {
        let (dashboard, status_messages) = render(self.table, &self.filters);
        self.dashboard = dashboard;
        self.status_messages = status_messages;
    }

    /// Set the model-year range; bounds are clamped into the table's years.
    pub fn set_year_range(&mut self, min: i32, max: i32) -> Result<(), FilterError> {
        self.filters.year_range = YearRange::within(min, max, self.table.year_bounds())?;
        self.refilter();
        Ok(())
    }

    /// Toggle a single vehicle type in the selection.
    pub fn toggle_vehicle_type(&mut self, vehicle_type: VehicleType) {
        if !self.filters.vehicle_types.remove(&vehicle_type) {
            self.filters.vehicle_types.insert(vehicle_type);
        }
        self.refilter();
    }

    /// Toggle a single county in the (optional) county selection.
    pub fn toggle_county(&mut self, county: &str) {
        if !self.filters.counties.remove(county) {
            self.filters.counties.insert(county.to_string());
        }
        self.refilter();
    }

    /// Select every vehicle type.
    pub fn select_all_types(&mut self) {
        self.filters.vehicle_types = VehicleType::ALL.into_iter().collect();
        self.refilter();
    }

    /// Deselect every vehicle type.
    pub fn select_no_types(&mut self) {
        self.filters.vehicle_types.clear();
        self.refilter();
    }

    /// Remove the county restriction.
    pub fn clear_counties(&mut self) {
        self.filters.counties.clear();
        self.refilter();
    }
}

/// One full render cycle.
///
/// An empty selection falls back to the whole table; the signals still report
/// the emptiness so the banner can say so. A dropped county filter and an
/// empty result can both happen in one cycle, and both get a banner.
fn render(
    table: &CanonicalTable,
    filters: &FilterSpec,
) -> (Dashboard, Vec<(StatusLevel, String)>) {
    let outcome = apply(table, filters);
    let signals = outcome.signals;

    let mut status = Vec::new();
    if signals.county_filter_was_dropped {
        status.push((
            StatusLevel::Warning,
            "The county selection matches no vehicles for these years and types; \
             showing the year and type selection only."
                .to_string(),
        ));
    }

    let view = if signals.is_empty {
        warn!("all filters produce an empty selection; showing the full table");
        status.push((
            StatusLevel::Error,
            "All filters produce an empty selection. Adjust the filters; \
             showing every registration meanwhile."
                .to_string(),
        ));
        FilteredView::all(table)
    } else {
        outcome.view
    };

    let dashboard = Dashboard::compute(&view, signals);
    info!(
        "showing {} of {} registrations",
        dashboard.summary.total, dashboard.summary.canonical_total
    );
    (dashboard, status)
}
