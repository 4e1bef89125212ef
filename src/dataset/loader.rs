//! One-time asynchronous dataset load.
//!
//! The first caller performs the CSV read on a blocking thread; every other
//! caller, concurrent or later, waits for and shares the same dataset.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::OnceCell;

use super::{CsvImporter, CsvSchema, Dataset, ImportReport};
use crate::error::{Error, Result};

/// Dataset handle filled exactly once.
#[derive(Debug)]
pub struct SharedDataset {
    path: PathBuf,
    rolling_window: usize,
    cell: OnceCell<(Arc<Dataset>, ImportReport)>,
}

impl SharedDataset {
    /// Create an empty handle for the CSV at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            rolling_window: 5,
            cell: OnceCell::new(),
        }
    }

    /// Window used if the five-year average has to be derived on load.
    #[must_use]
    pub fn with_rolling_window(mut self, window: usize) -> Self {
        self.rolling_window = window;
        self
    }

    /// Source path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The dataset if the load already finished.
    #[must_use]
    pub fn get(&self) -> Option<Arc<Dataset>> {
        self.cell.get().map(|(dataset, _)| Arc::clone(dataset))
    }

    /// Import report of the finished load.
    #[must_use]
    pub fn report(&self) -> Option<&ImportReport> {
        self.cell.get().map(|(_, report)| report)
    }

    /// Load the dataset, or wait for the load already in flight.
    ///
    /// A failed load leaves the handle empty so a later call can retry.
    pub async fn get_or_load(&self) -> Result<Arc<Dataset>> {
        let (dataset, _) = self
            .cell
            .get_or_try_init(|| async {
                let path = self.path.clone();
                let window = self.rolling_window;
                let (dataset, report) = tokio::task::spawn_blocking(move || {
                    CsvImporter::new(CsvSchema::auto_detect())
                        .rolling_window(window)
                        .import(&path)
                })
                .await
                .map_err(|e| Error::DatasetLoad {
                    path: self.path.clone(),
                    reason: e.to_string(),
                })??;
                Ok::<_, Error>((Arc::new(dataset), report))
            })
            .await?;
        Ok(Arc::clone(dataset))
    }
}
