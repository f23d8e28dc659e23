//! Environment variables read by the crate and its binary.

use std::path::{Path, PathBuf};

/// OpenWeatherMap API key.
pub const API_KEY_VAR: &str = "APIKEY";

/// Custom S3 endpoint used by `kayak refresh --upload`, for S3 compatible stores.
pub const STORAGE_ENDPOINT_VAR: &str = "KAYAK_STORAGE_ENDPOINT";

/// Bucket holding the published dataset.
pub const STORAGE_BUCKET_VAR: &str = "KAYAK_STORAGE_BUCKET";

/// The weather API key from the environment, ignoring empty values.
pub fn api_key_from_env() -> Option<String> {
    non_empty_var(API_KEY_VAR)
}

pub fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Loads variables from a `.env` file into the process environment.
///
/// Reads `path` when given, otherwise the first `.env` found in the current directory or
/// its parents. Variables already set in the environment are not overridden. Returns the
/// file that was loaded, or `None` when there is none.
pub fn load_dotenv(path: Option<&Path>) -> Result<Option<PathBuf>, dotenvy::Error> {
    let loaded = match path {
        Some(path) => dotenvy::from_path(path).map(|_| path.to_path_buf()),
        None => dotenvy::dotenv(),
    };
    match loaded {
        Ok(path) => Ok(Some(path)),
        Err(e) if e.not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn dotenv_file_is_loaded() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let file = dir.path().join(".env");
        fs::write(&file, "KAYAK_TEST_DOTENV_KEY=from-dotenv\n")?;

        assert_eq!(load_dotenv(Some(&file))?, Some(file));
        assert_eq!(
            non_empty_var("KAYAK_TEST_DOTENV_KEY").as_deref(),
            Some("from-dotenv")
        );
        Ok(())
    }

    #[test]
    fn missing_dotenv_file_is_not_an_error() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        assert_eq!(load_dotenv(Some(&dir.path().join(".env")))?, None);
        Ok(())
    }

    #[test]
    fn unset_variable_is_none() {
        assert_eq!(non_empty_var("KAYAK_TEST_SURELY_UNSET_VARIABLE"), None);
    }
}
