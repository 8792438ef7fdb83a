mod auth;
mod client;
mod formatting;

pub use client::SheetSync;

use crate::error::Result;
use crate::models::Dataset;
use async_trait::async_trait;

#[async_trait]
pub trait TrackerOperations {
    /// Ensure the tracker document exists, invite collaborators, and populate
    /// its first worksheet.
    async fn create_tracker_sheet(&self, dataset: &Dataset) -> Result<()>;

    /// Write a dataset into a new worksheet, or into the worksheet at
    /// `fallback_index` when one with the same title already exists.
    async fn add_worksheet(
        &self,
        title: &str,
        dataset: &Dataset,
        fallback_index: usize,
    ) -> Result<()>;

    /// Overwrite an existing worksheet's contents, leaving formatting alone.
    async fn update_worksheet(&self, title: &str, dataset: &Dataset) -> Result<()>;
}
