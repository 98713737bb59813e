//! Filter-and-aggregate core of the EV registration dashboard.
//!
//! [`data`] loads and cleans the registration table, filters it and computes
//! the aggregate views; [`state`] drives one render cycle per filter change;
//! [`app`] and [`ui`] turn the result into text or JSON.

pub mod app;
pub mod data;
pub mod state;
pub mod ui;
