use crate::forecast::error::FetchError;
use crate::forecast::response::OneCallResponse;
use crate::types::forecast::ForecastSeries;
use crate::types::location::Location;
use bon::bon;
use log::{debug, info, warn};
use reqwest::Client;
use std::fmt;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

/// Number of days after today that make up a forecast.
pub const DEFAULT_FORECAST_DAYS: usize = 7;

const EXCLUDED_SECTIONS: &str = "current,minutely,hourly,alerts";

/// A location whose forecast could not be fetched during [`ForecastFetcher::fetch_all`].
#[derive(Debug)]
pub struct FetchFailure {
    pub location: Location,
    pub error: FetchError,
}

/// Outcome of fetching a batch of locations. Every input location ends up in exactly one
/// of the two lists, in input order.
#[derive(Debug, Default)]
pub struct FetchReport {
    pub forecasts: Vec<(i64, ForecastSeries)>,
    pub failures: Vec<FetchFailure>,
}

impl FetchReport {
    pub fn succeeded(&self) -> usize {
        self.forecasts.len()
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }
}

/// Fetches daily forecasts from the OpenWeatherMap One Call endpoint.
#[derive(Clone)]
pub struct ForecastFetcher {
    client: Client,
    api_key: String,
    base_url: String,
    forecast_days: usize,
}

#[bon]
impl ForecastFetcher {
    /// # Arguments
    ///
    /// * `.api_key(..)`: **Required.** OpenWeatherMap API key.
    /// * `.base_url(..)`: Optional. Defaults to [`DEFAULT_BASE_URL`].
    /// * `.forecast_days(..)`: Optional. Days kept after today, defaults to
    ///   [`DEFAULT_FORECAST_DAYS`].
    /// * `.timeout(..)`: Optional. Per request timeout, no timeout when unset.
    ///
    /// # Errors
    ///
    /// Returns the [`reqwest::Error`] if the HTTP client cannot be built.
    #[builder]
    pub fn new(
        #[builder(into)] api_key: String,
        #[builder(into, default = DEFAULT_BASE_URL.to_string())] base_url: String,
        #[builder(default = DEFAULT_FORECAST_DAYS)] forecast_days: usize,
        timeout: Option<Duration>,
    ) -> Result<Self, reqwest::Error> {
        let mut client = Client::builder().gzip(true);
        if let Some(timeout) = timeout {
            client = client.timeout(timeout);
        }
        Ok(Self {
            client: client.build()?,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            forecast_days,
        })
    }

    pub fn forecast_days(&self) -> usize {
        self.forecast_days
    }

    fn endpoint(&self) -> String {
        format!("{}/onecall", self.base_url)
    }

    /// Fetches the next `forecast_days` days for `location`, starting tomorrow.
    ///
    /// Today's entry is dropped and any entries past the window are ignored.
    ///
    /// # Errors
    ///
    /// [`FetchError::ShortForecast`] when the response covers fewer upcoming days than the
    /// window, otherwise the network, status or decoding error of the single request.
    pub async fn fetch(&self, location: &Location) -> Result<ForecastSeries, FetchError> {
        let url = self.endpoint();
        debug!("Requesting forecast for {} from {}", location, url);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("lat", location.lat.to_string()),
                ("lon", location.lon.to_string()),
                ("units", "metric".to_string()),
                ("exclude", EXCLUDED_SECTIONS.to_string()),
                ("appid", self.api_key.clone()),
            ])
            .send()
            .await
            .map_err(|e| FetchError::NetworkRequest(url.clone(), e.without_url()))?;

        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                let e = e.without_url();
                return Err(match e.status() {
                    Some(status) => FetchError::HttpStatus {
                        url,
                        status,
                        source: e,
                    },
                    None => FetchError::NetworkRequest(url, e),
                });
            }
        };

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::NetworkRequest(url.clone(), e.without_url()))?;
        let parsed: OneCallResponse =
            serde_json::from_str(&body).map_err(|source| FetchError::JsonParse {
                city: location.city.clone(),
                source,
            })?;

        let upcoming = parsed.daily.len().saturating_sub(1);
        if upcoming < self.forecast_days {
            return Err(FetchError::ShortForecast {
                city: location.city.clone(),
                expected: self.forecast_days,
                found: upcoming,
            });
        }

        let window = parsed.daily.iter().skip(1).take(self.forecast_days);
        let mut felt_temperature = Vec::with_capacity(self.forecast_days);
        let mut rain_chances = Vec::with_capacity(self.forecast_days);
        let mut humidity = Vec::with_capacity(self.forecast_days);
        for day in window {
            felt_temperature.push(day.feels_like.day);
            rain_chances.push(day.rain_chance());
            humidity.push(day.humidity);
        }

        Ok(ForecastSeries::new(felt_temperature, rain_chances, humidity)?)
    }

    /// Fetches every location one after the other. A failing location is logged and
    /// recorded in the report; it never stops the others.
    pub async fn fetch_all(&self, locations: &[Location]) -> FetchReport {
        let mut report = FetchReport::default();
        for location in locations {
            match self.fetch(location).await {
                Ok(series) => report.forecasts.push((location.id, series)),
                Err(error) => {
                    warn!("Skipping forecast for {}: {}", location, error);
                    report.failures.push(FetchFailure {
                        location: location.clone(),
                        error,
                    });
                }
            }
        }
        info!(
            "Fetched forecasts for {}/{} locations",
            report.succeeded(),
            locations.len()
        );
        report
    }
}

impl fmt::Debug for ForecastFetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForecastFetcher")
            .field("base_url", &self.base_url)
            .field("forecast_days", &self.forecast_days)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn daily(days: usize) -> Value {
        let entries: Vec<Value> = (0..days)
            .map(|i| {
                json!({
                    "dt": 1_760_600_000 + i * 86_400,
                    "feels_like": {"day": 20.0 + i as f64, "night": 12.0},
                    "pop": 0.1 * i as f64,
                    "humidity": 50 + i,
                })
            })
            .collect();
        json!({ "lat": 43.3, "lon": 5.4, "daily": entries })
    }

    fn marseille() -> Location {
        Location::new(7, "Marseille", 43.3, 5.4)
    }

    fn fetcher(server: &MockServer) -> ForecastFetcher {
        ForecastFetcher::builder()
            .api_key("test-key")
            .base_url(server.uri())
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn drops_today_and_keeps_seven_days() -> Result<(), FetchError> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/onecall"))
            .and(query_param("lat", "43.3"))
            .and(query_param("lon", "5.4"))
            .and(query_param("units", "metric"))
            .and(query_param("exclude", "current,minutely,hourly,alerts"))
            .and(query_param("appid", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(daily(8)))
            .mount(&server)
            .await;

        let series = fetcher(&server).fetch(&marseille()).await?;
        assert_eq!(series.len(), 7);
        assert_eq!(series.felt_temperature()[0], 21.0);
        assert_eq!(series.felt_temperature()[6], 27.0);
        assert_eq!(series.rain_chances()[0], 10);
        assert_eq!(series.humidity()[6], 57.0);
        assert_eq!(series.day_plus(), vec![1, 2, 3, 4, 5, 6, 7]);
        Ok(())
    }

    #[tokio::test]
    async fn extra_days_are_ignored() -> Result<(), FetchError> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(daily(10)))
            .mount(&server)
            .await;

        let series = fetcher(&server).fetch(&marseille()).await?;
        assert_eq!(series.len(), 7);
        assert_eq!(series.felt_temperature()[6], 27.0);
        Ok(())
    }

    #[tokio::test]
    async fn short_forecast_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(daily(5)))
            .mount(&server)
            .await;

        let err = fetcher(&server).fetch(&marseille()).await.unwrap_err();
        assert!(matches!(
            err,
            FetchError::ShortForecast {
                expected: 7,
                found: 4,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn http_error_does_not_leak_api_key() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = fetcher(&server).fetch(&marseille()).await.unwrap_err();
        assert!(matches!(
            err,
            FetchError::HttpStatus { status, .. } if status == reqwest::StatusCode::UNAUTHORIZED
        ));

        let mut rendered = err.to_string();
        let mut source = std::error::Error::source(&err);
        while let Some(inner) = source {
            rendered.push_str(&inner.to_string());
            source = inner.source();
        }
        assert!(!rendered.contains("test-key"));
    }

    #[tokio::test]
    async fn malformed_body_is_a_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = fetcher(&server).fetch(&marseille()).await.unwrap_err();
        assert!(matches!(err, FetchError::JsonParse { ref city, .. } if city == "Marseille"));
    }

    #[tokio::test]
    async fn fetch_all_isolates_failures() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("lat", "48.8"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(daily(8)))
            .mount(&server)
            .await;

        let locations = vec![
            Location::new(1, "Nice", 43.7, 7.3),
            Location::new(2, "Paris", 48.8, 2.3),
            Location::new(3, "Biarritz", 43.5, -1.6),
        ];
        let report = fetcher(&server).fetch_all(&locations).await;

        let ids: Vec<i64> = report.forecasts.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.failures[0].location.id, 2);
        assert!(matches!(
            report.failures[0].error,
            FetchError::HttpStatus { .. }
        ));
    }
}
