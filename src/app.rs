use std::fmt::{self, Write};

use crate::state::DashboardState;
use crate::ui::charts::{bar_chart, grid, thousands};
use crate::ui::panels;

// ---------------------------------------------------------------------------
// Dashboard app: header panels followed by the five tabs
// ---------------------------------------------------------------------------

pub struct DashboardApp<'a> {
    pub state: DashboardState<'a>,
}

impl<'a> DashboardApp<'a> {
    pub fn new(state: DashboardState<'a>) -> Self {
        Self { state }
    }

    /// Render the whole dashboard as text.
    pub fn render_text(&self) -> Result<String, fmt::Error> {
        let mut out = String::new();
        let dash = &self.state.dashboard;

        writeln!(out, "EV REGISTRATION DASHBOARD\n")?;
        panels::status_banner(&mut out, &self.state)?;
        panels::filter_summary(&mut out, &self.state.filters)?;
        writeln!(out)?;
        panels::metric_cards(&mut out, &dash.summary)?;

        // ---- Geography ----
        section(&mut out, "Geography")?;
        bar_chart(&mut out, "Top 10 counties", &dash.top_regions)?;
        writeln!(out)?;
        bar_chart(&mut out, "Top 10 cities", &dash.top_cities)?;
        if let Some((county, n)) = dash.top_regions.first() {
            insight(&mut out, &format!("{county} leads with {} vehicles.", thousands(*n)))?;
        }

        // ---- Trend ----
        section(&mut out, "Trend")?;
        bar_chart(&mut out, "Registrations per model year", &dash.year_trend)?;
        if let Some((year, n)) = dash.peak_year {
            insight(&mut out, &format!("Peak: model year {year} with {} vehicles.", thousands(n)))?;
        }

        // ---- Brands ----
        section(&mut out, "Brands")?;
        bar_chart(&mut out, "Top 15 makes", &dash.top_makes)?;
        writeln!(out)?;
        bar_chart(&mut out, "Top 15 models", &dash.top_models)?;
        if let (Some((make, _)), Some((model, _))) = (dash.top_makes.first(), dash.top_models.first()) {
            insight(&mut out, &format!("{make} leads the market; the most popular model is {model}."))?;
        }

        // ---- Vehicle types ----
        section(&mut out, "Vehicle types")?;
        bar_chart(&mut out, "Vehicles per type", &dash.type_totals)?;
        writeln!(out)?;
        grid(&mut out, "Type mix in the top 5 counties", &dash.type_by_region)?;

        // ---- Advanced ----
        section(&mut out, "Advanced")?;
        bar_chart(&mut out, "Top 10 electric utilities", &dash.top_utilities)?;
        writeln!(out)?;
        grid(&mut out, "Model year × make (top 10 makes)", &dash.make_year_heatmap)?;

        Ok(out)
    }

    /// Render the aggregates and signals as pretty JSON.
    pub fn render_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.state.dashboard)
    }
}

fn section(out: &mut impl Write, title: &str) -> fmt::Result {
    writeln!(out, "\n== {title} {}", "=".repeat(60usize.saturating_sub(title.len())))
}

fn insight(out: &mut impl Write, text: &str) -> fmt::Result {
    writeln!(out, "  » {text}")
}
