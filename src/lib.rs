mod config;
mod error;
mod forecast;
mod kayak;
mod score;
mod storage;
mod table;
mod types;
mod utils;

pub use error::KayakError;
pub use kayak::*;

pub use config::{
    api_key_from_env, load_dotenv, non_empty_var, API_KEY_VAR, STORAGE_BUCKET_VAR,
    STORAGE_ENDPOINT_VAR,
};
pub use utils::{default_dataset_path, get_data_dir};

pub use forecast::error::FetchError;
pub use forecast::fetcher::*;

pub use score::{weather_score, IDEAL_FELT_TEMPERATURE};

pub use table::encoded::{parse_list, EncodedList, ListValue, ParseError};
pub use table::error::NormalizeError;
pub use table::hotel_table::*;
pub use table::weather_table::*;

pub use storage::cache::{DatasetCache, DEFAULT_CACHE_TTL};
pub use storage::csv::{dataset_from_csv, dataset_to_csv, DATASET_COLUMNS};
pub use storage::error::{LoadError, PublishError};
pub use storage::publisher::Publisher;
pub use storage::store::{DatasetStore, S3Store, DEFAULT_BUCKET, DEFAULT_OBJECT_KEY};

pub use types::dataset::{Dataset, DatasetRow, ForecastCells, HotelCells};
pub use types::forecast::{ForecastSeries, SeriesError};
pub use types::location::Location;
