use thiserror::Error;

// ---------------------------------------------------------------------------
// Load failures
// ---------------------------------------------------------------------------

/// The dataset could not be turned into a canonical table.
///
/// Fatal to dashboard startup. The core never retries; a caller may retry
/// the whole load.
#[derive(Debug, Error)]
pub enum DataUnavailableError {
    /// Fetching or opening the source failed.
    #[error("data source {location} is unreachable: {reason}")]
    Unreachable { location: String, reason: String },

    /// The source could be read but not parsed as a table.
    #[error("data source {location} is malformed: {reason}")]
    Malformed { location: String, reason: String },

    /// One or more columns the engine reads are absent.
    #[error("data source {location} is missing required columns: {}", .columns.join(", "))]
    MissingColumns {
        location: String,
        columns: Vec<String>,
    },

    /// Nothing survived cleaning.
    #[error("data source {location} has no complete rows")]
    Empty { location: String },
}

// ---------------------------------------------------------------------------
// Filter construction failures
// ---------------------------------------------------------------------------

/// A vehicle-type string outside the closed vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized vehicle type '{0}'")]
pub struct UnknownVehicleType(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    #[error("year range is inverted: {min} > {max}")]
    InvertedYearRange { min: i32, max: i32 },

    #[error(transparent)]
    VehicleType(#[from] UnknownVehicleType),
}
