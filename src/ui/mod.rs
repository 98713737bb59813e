//! Plain-text presentation of the dashboard: header panels and charts.

pub mod charts;
pub mod panels;
