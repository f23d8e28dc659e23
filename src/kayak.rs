//! The [`Kayak`] client: refreshes the forecasts of the dataset and serves the two map
//! tables built from the published result.

use crate::error::KayakError;
use crate::forecast::fetcher::{FetchFailure, ForecastFetcher};
use crate::storage::cache::{DatasetCache, DEFAULT_CACHE_TTL};
use crate::storage::publisher::Publisher;
use crate::storage::store::DatasetStore;
use crate::table::hotel_table::{normalize_hotels, HotelTable};
use crate::table::weather_table::{normalize_weather, WeatherTable};
use crate::types::dataset::Dataset;
use bon::bon;
use chrono::Utc;
use log::info;
use std::sync::Arc;
use std::time::Duration;

/// What a call to [`Kayak::refresh`] did.
#[derive(Debug)]
pub struct RefreshReport {
    /// Ids of the locations that got a new forecast, in dataset order.
    pub refreshed: Vec<i64>,
    /// Locations that kept their previous forecast, with the reason.
    pub failures: Vec<FetchFailure>,
    /// The dataset as it was published.
    pub dataset: Arc<Dataset>,
}

/// Entry point of the crate.
///
/// A refresh reads the raw dataset from `source`, fetches a new forecast for every
/// location, scores it and publishes the result to every target. Readers
/// ([`Kayak::dataset`], [`Kayak::weather_table`], [`Kayak::hotel_table`]) go through an
/// in-memory cache of the published dataset.
///
/// # Examples
///
/// ```no_run
/// # use kayak::{DatasetStore, Kayak, KayakError};
/// # async fn run() -> Result<(), KayakError> {
/// let kayak = Kayak::builder()
///     .api_key("my-openweathermap-key")
///     .source(DatasetStore::local("data/df_raw.csv"))
///     .targets(vec![DatasetStore::local("data/df_complete.csv")])
///     .build()?;
///
/// let report = kayak.refresh().await?;
/// println!("{} locations refreshed", report.refreshed.len());
///
/// let best = kayak.weather_table().await?.ranking()?;
/// println!("Best weather: {}", best[0].city);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Kayak {
    fetcher: Option<ForecastFetcher>,
    source: DatasetStore,
    publisher: Publisher,
    cache: DatasetCache,
}

#[bon]
impl Kayak {
    /// # Arguments
    ///
    /// * `.source(..)`: **Required.** Store holding the dataset to refresh.
    /// * `.api_key(..)`: Optional. Weather API key. Without it only the read methods work
    ///   and [`Kayak::refresh`] fails with [`KayakError::MissingApiKey`].
    /// * `.targets(..)`: Optional. Stores the refreshed dataset is written to, in order.
    /// * `.base_url(..)`: Optional. Weather API base URL.
    /// * `.forecast_days(..)`: Optional. Days per forecast, 7 by default.
    /// * `.timeout(..)`: Optional. Per request timeout for the weather API.
    /// * `.cache_ttl(..)`: Optional. How long a loaded dataset is served from memory,
    ///   10 minutes by default.
    ///
    /// # Errors
    ///
    /// [`KayakError::Client`] if the HTTP client cannot be built.
    #[builder]
    pub fn new(
        source: DatasetStore,
        #[builder(into)] api_key: Option<String>,
        #[builder(default)] targets: Vec<DatasetStore>,
        #[builder(into)] base_url: Option<String>,
        forecast_days: Option<usize>,
        timeout: Option<Duration>,
        #[builder(default = DEFAULT_CACHE_TTL)] cache_ttl: Duration,
    ) -> Result<Self, KayakError> {
        let fetcher = api_key
            .map(|api_key| {
                ForecastFetcher::builder()
                    .api_key(api_key)
                    .maybe_base_url(base_url)
                    .maybe_forecast_days(forecast_days)
                    .maybe_timeout(timeout)
                    .build()
            })
            .transpose()
            .map_err(KayakError::Client)?;

        Ok(Self {
            fetcher,
            source,
            publisher: Publisher::new(targets),
            cache: DatasetCache::new(cache_ttl),
        })
    }

    /// Fetches fresh forecasts for every location of the source dataset, rescores them and
    /// publishes the dataset.
    ///
    /// Locations whose fetch fails keep their previous forecast, score and `updated_at`; they
    /// are listed in [`RefreshReport::failures`]. A location that has never been refreshed
    /// stays without forecast and is left out of the tables until a later refresh succeeds.
    /// The published dataset replaces the cached one.
    ///
    /// # Errors
    ///
    /// * [`KayakError::MissingApiKey`] when the client was built without a key.
    /// * [`KayakError::Load`] when the source cannot be read.
    /// * [`KayakError::NothingRefreshed`] when every location failed. Nothing is published.
    /// * [`KayakError::Publish`] when a target cannot be written.
    pub async fn refresh(&self) -> Result<RefreshReport, KayakError> {
        let fetcher = self.fetcher.as_ref().ok_or(KayakError::MissingApiKey)?;

        let mut dataset = self.source.load().await?;
        let report = fetcher.fetch_all(&dataset.locations()).await;
        if report.forecasts.is_empty() && !dataset.is_empty() {
            return Err(KayakError::NothingRefreshed {
                failures: report.failures,
            });
        }

        let refreshed = dataset.apply_forecasts(&report.forecasts);
        self.publisher
            .publish(&mut dataset, &refreshed, Utc::now())
            .await?;
        let dataset = self.cache.insert(dataset).await;

        info!(
            "Refresh done: {} refreshed, {} kept their previous forecast",
            refreshed.len(),
            report.failures.len()
        );
        Ok(RefreshReport {
            refreshed,
            failures: report.failures,
            dataset,
        })
    }

    /// The store readers load from: the first target, or the source when nothing is
    /// published.
    pub fn read_store(&self) -> &DatasetStore {
        self.publisher.targets().first().unwrap_or(&self.source)
    }

    /// The published dataset, from the cache when it is fresh.
    pub async fn dataset(&self) -> Result<Arc<Dataset>, KayakError> {
        Ok(self.cache.get_or_load(self.read_store()).await?)
    }

    pub async fn weather_table(&self) -> Result<WeatherTable, KayakError> {
        let dataset = self.dataset().await?;
        Ok(normalize_weather(&dataset)?)
    }

    pub async fn hotel_table(&self) -> Result<HotelTable, KayakError> {
        let dataset = self.dataset().await?;
        Ok(normalize_hotels(&dataset)?)
    }

    /// Forgets the cached dataset; the next read loads it again.
    pub async fn invalidate(&self) {
        self.cache.invalidate().await;
    }
}
