//! The cities the pipeline tracks.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A city from the reference dataset.
///
/// Locations are immutable reference data: the refresh only ever adds forecasts next to
/// them, it never edits the coordinates or the id.
///
/// # Examples
///
/// ```
/// use kayak::Location;
///
/// let gorges = Location::new(12, "Gorges du Verdon", 43.7496562, 6.3285616);
/// assert_eq!(gorges.to_string(), "Gorges du Verdon (id 12)");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Unique id of the row in the dataset.
    pub id: i64,
    pub city: String,
    pub lat: f64,
    pub lon: f64,
}

impl Location {
    pub fn new(id: i64, city: impl Into<String>, lat: f64, lon: f64) -> Self {
        Self {
            id,
            city: city.into(),
            lat,
            lon,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (id {})", self.city, self.id)
    }
}
