use std::fmt::{self, Write};

use crate::data::aggregate::Summary;
use crate::data::filter::FilterSpec;
use crate::state::{DashboardState, StatusLevel};

use super::charts::thousands;

// ---------------------------------------------------------------------------
// Header panels – banner, filters, metric cards
// ---------------------------------------------------------------------------

/// Warning / error banners for the current render cycle, in order.
pub fn status_banner(out: &mut impl Write, state: &DashboardState<'_>) -> fmt::Result {
    for (level, msg) in &state.status_messages {
        let tag = match level {
            StatusLevel::Warning => "warning",
            StatusLevel::Error => "error",
        };
        writeln!(out, "[{tag}] {msg}")?;
    }
    if !state.status_messages.is_empty() {
        writeln!(out)?;
    }
    Ok(())
}

/// One line per filter widget.
pub fn filter_summary(out: &mut impl Write, filters: &FilterSpec) -> fmt::Result {
    let range = filters.year_range;
    writeln!(out, "Model years   {} – {}", range.min(), range.max())?;

    let types: Vec<&str> = filters.vehicle_types.iter().map(|t| t.label()).collect();
    if types.is_empty() {
        writeln!(out, "Vehicle types (none)")?;
    } else {
        writeln!(out, "Vehicle types {}", types.join(", "))?;
    }

    if filters.counties.is_empty() {
        writeln!(out, "Counties      (all)")
    } else {
        let counties: Vec<&str> = filters.counties.iter().map(String::as_str).collect();
        writeln!(out, "Counties      {}", counties.join(", "))
    }
}

/// The four headline metric cards.
pub fn metric_cards(out: &mut impl Write, summary: &Summary) -> fmt::Result {
    let share = summary
        .share_of_canonical_pct
        .map(|p| format!("{p:.1}% of total"))
        .unwrap_or_else(|| "N/A".to_string());

    writeln!(out, "Total vehicles  {:>10}  ({share})", thousands(summary.total))?;
    writeln!(
        out,
        "Total BEV       {:>10}  ({:.1}%)",
        thousands(summary.bev),
        summary.bev_share_pct
    )?;
    writeln!(
        out,
        "Total PHEV      {:>10}  ({:.1}%)",
        thousands(summary.phev),
        summary.phev_share_pct
    )?;
    writeln!(
        out,
        "Distinct makes  {:>10}  ({} models)",
        thousands(summary.distinct_makes),
        thousands(summary.distinct_models)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::tests::record;
    use crate::data::model::CanonicalTable;
    use crate::data::model::VehicleType::{Bev, Phev};

    fn table() -> CanonicalTable {
        CanonicalTable::from_records(
            vec![record(2016, Bev, "King"), record(2018, Phev, "Pierce")],
            Vec::new(),
        )
    }

    #[test]
    fn metric_cards_show_shares() {
        let table = table();
        let state = DashboardState::new(&table);
        let mut out = String::new();
        metric_cards(&mut out, &state.dashboard.summary).unwrap();

        assert!(out.contains("(100.0% of total)"), "{out}");
        assert!(out.contains("(50.0%)"), "{out}");
        assert!(out.contains("(1 models)"), "{out}");
    }

    #[test]
    fn banner_only_when_flagged() {
        let table = table();
        let mut state = DashboardState::new(&table);
        let mut out = String::new();
        status_banner(&mut out, &state).unwrap();
        assert!(out.is_empty());

        state.select_no_types();
        status_banner(&mut out, &state).unwrap();
        assert!(out.starts_with("[error]"));

        // A county with no rows plus no types: both banners, warning first.
        state.toggle_county("Nowhere");
        let mut out = String::new();
        status_banner(&mut out, &state).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert!(lines[0].starts_with("[warning]"), "{out}");
        assert!(lines[1].starts_with("[error]"), "{out}");
    }

    #[test]
    fn filter_summary_lists_selection() {
        let table = table();
        let mut state = DashboardState::new(&table);
        state.toggle_county("King");
        let mut out = String::new();
        filter_summary(&mut out, &state.filters).unwrap();

        assert!(out.contains("2016 – 2018"), "{out}");
        assert!(out.contains("BEV, PHEV"), "{out}");
        assert!(out.contains("Counties      King"), "{out}");
    }
}
