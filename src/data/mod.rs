/// Data layer: core types, loading, filtering and aggregation.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet  (local path or https URL)
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  fetch → RawTable → clean → CanonicalTable (cached once)
///   └──────────┘
///        │
///        ▼
///   ┌────────────────┐
///   │ CanonicalTable  │  Vec<Record>, year bounds, county index
///   └────────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  year/type predicates, soft county filter → FilteredView
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ aggregate  │  top-N tables, year trend, cross-tabs → Dashboard
///   └───────────┘
/// ```

pub mod aggregate;
pub mod error;
pub mod filter;
pub mod loader;
pub mod model;
