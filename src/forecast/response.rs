use serde::Deserialize;

/// The part of a One Call response the fetcher reads. Everything else is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct OneCallResponse {
    #[serde(default)]
    pub daily: Vec<DailyEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DailyEntry {
    pub feels_like: FeelsLike,
    /// Probability of precipitation, 0.0 to 1.0.
    pub pop: f64,
    pub humidity: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeelsLike {
    pub day: f64,
}

impl DailyEntry {
    /// `pop` as a whole percentage, truncated.
    pub fn rain_chance(&self) -> i64 {
        (self.pop * 100.0).trunc() as i64
    }
}
