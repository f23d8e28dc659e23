use crate::storage::csv::dataset_to_csv;
use crate::storage::error::PublishError;
use crate::storage::store::DatasetStore;
use crate::types::dataset::Dataset;
use chrono::{DateTime, Utc};
use log::{info, warn};

/// Writes the enriched dataset to every configured store.
#[derive(Debug, Clone, Default)]
pub struct Publisher {
    targets: Vec<DatasetStore>,
}

impl Publisher {
    pub fn new(targets: Vec<DatasetStore>) -> Self {
        Self { targets }
    }

    pub fn targets(&self) -> &[DatasetStore] {
        &self.targets
    }

    /// Stamps the rows in `refreshed` with `now`, then overwrites each target in order with
    /// the CSV form of `dataset`.
    ///
    /// Rows not listed in `refreshed` keep their previous `updated_at`. The first target that
    /// fails stops the run; targets before it have already been replaced.
    pub async fn publish(
        &self,
        dataset: &mut Dataset,
        refreshed: &[i64],
        now: DateTime<Utc>,
    ) -> Result<(), PublishError> {
        dataset.stamp(refreshed, now);

        if self.targets.is_empty() {
            warn!("No publish targets configured, dataset is kept in memory only");
            return Ok(());
        }

        let bytes = dataset_to_csv(dataset).map_err(PublishError::Csv)?;
        for target in &self.targets {
            target.write(bytes.clone()).await?;
            info!(
                "Published {} locations ({} refreshed) to {}",
                dataset.len(),
                refreshed.len(),
                target
            );
        }
        Ok(())
    }
}
