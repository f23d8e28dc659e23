use argh::FromArgs;
use kayak::{
    api_key_from_env, default_dataset_path, load_dotenv, non_empty_var, DatasetStore, Kayak,
    KayakError, S3Store, STORAGE_BUCKET_VAR, STORAGE_ENDPOINT_VAR,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

#[derive(FromArgs)]
/// Refresh city weather forecasts and rank cities and hotels by weather.
struct Args {
    /// path of the published dataset (default: <data dir>/kayak/df_complete.csv)
    #[argh(option, short = 'd')]
    dataset: Option<PathBuf>,

    #[argh(subcommand)]
    command: Command,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum Command {
    Refresh(RefreshArgs),
    Rank(RankArgs),
}

#[derive(FromArgs)]
/// Fetch new forecasts for every city and publish the dataset.
#[argh(subcommand, name = "refresh")]
struct RefreshArgs {
    /// dataset to refresh (default: the published dataset)
    #[argh(option, short = 's')]
    source: Option<PathBuf>,

    /// also upload the dataset to S3 (bucket KAYAK_STORAGE_BUCKET, optional endpoint
    /// KAYAK_STORAGE_ENDPOINT, credentials from the AWS_* variables)
    #[argh(switch, short = 'u')]
    upload: bool,

    /// timeout per weather request, in seconds
    #[argh(option, short = 't')]
    timeout: Option<u64>,
}

#[derive(FromArgs)]
/// Print the best weather cities and their best rated hotels.
#[argh(subcommand, name = "rank")]
struct RankArgs {
    /// number of cities to list
    #[argh(option, short = 'c', default = "5")]
    cities: usize,

    /// number of hotels to list
    #[argh(option, short = 'n', default = "20")]
    hotels: usize,
}

#[tokio::main]
async fn main() -> ExitCode {
    let env = env_logger::Env::default().default_filter_or("info");
    env_logger::init_from_env(env);

    match load_dotenv(None) {
        Ok(Some(path)) => log::info!("Loaded environment from {}", path.display()),
        Ok(None) => {}
        Err(e) => log::warn!("Could not load .env file: {}", e),
    }

    let args: Args = argh::from_env();

    let dataset = match args.dataset.map(Ok).unwrap_or_else(default_dataset_path) {
        Ok(path) => path,
        Err(e) => {
            log::error!("Could not determine the dataset path: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = match args.command {
        Command::Refresh(refresh_args) => refresh(dataset, refresh_args).await,
        Command::Rank(rank_args) => rank(dataset, rank_args).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn refresh(dataset: PathBuf, args: RefreshArgs) -> Result<(), KayakError> {
    let api_key = api_key_from_env().ok_or(KayakError::MissingApiKey)?;
    let source = DatasetStore::local(args.source.unwrap_or_else(|| dataset.clone()));

    let mut targets = vec![DatasetStore::local(dataset)];
    if args.upload {
        targets.push(object_store_from_env()?);
    }

    let kayak = Kayak::builder()
        .api_key(api_key)
        .source(source)
        .targets(targets)
        .maybe_timeout(args.timeout.map(Duration::from_secs))
        .build()?;

    let report = kayak.refresh().await?;
    println!(
        "Refreshed {} of {} locations",
        report.refreshed.len(),
        report.dataset.len()
    );
    for failure in &report.failures {
        println!("  kept previous forecast for {}: {}", failure.location, failure.error);
    }
    Ok(())
}

fn object_store_from_env() -> Result<DatasetStore, KayakError> {
    let store = S3Store::builder()
        .maybe_bucket(non_empty_var(STORAGE_BUCKET_VAR))
        .maybe_endpoint(non_empty_var(STORAGE_ENDPOINT_VAR))
        .build()
        .map_err(KayakError::StorageConfig)?;
    Ok(DatasetStore::Object(store))
}

async fn rank(dataset: PathBuf, args: RankArgs) -> Result<(), KayakError> {
    let kayak = Kayak::builder()
        .source(DatasetStore::local(dataset))
        .build()?;

    match kayak.dataset().await?.last_updated() {
        Some(updated_at) => {
            println!("Last refresh: {}", updated_at.format("%Y-%m-%d %H:%M UTC"))
        }
        None => println!("Last refresh: never"),
    }

    let weather = kayak.weather_table().await?;
    if !weather.skipped.is_empty() {
        println!("{} cities without a forecast yet", weather.skipped.len());
    }
    let ranking = weather.ranking()?;
    println!();
    println!("Best weather:");
    for (place, city) in ranking.iter().take(args.cities).enumerate() {
        println!("{:>3}. {:<30} {:>7.1}", place + 1, city.city, city.score_weather);
    }

    let cities: Vec<i64> = ranking.iter().take(args.cities).map(|c| c.id).collect();
    let hotels = kayak.hotel_table().await?;
    let in_best_cities = hotels.in_locations(&cities)?;
    println!();
    println!("Best rated hotels in those cities:");
    for hotel in in_best_cities.best_rated(args.hotels)?.summaries()? {
        println!(
            "{:>5.1}  {} ({})\n       {}",
            hotel.score, hotel.name, hotel.city, hotel.url
        );
    }
    Ok(())
}
