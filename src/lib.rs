//! Sync member progress tables into a shared Google spreadsheet.
//!
//! Authenticates with a service account, finds or creates the tracker
//! document, invites the configured collaborators, and keeps each worksheet's
//! content and status coloring consistent with the supplied dataset.

pub mod config;
pub mod error;
pub mod models;
pub mod sheets;

pub use config::Config;
pub use error::{AppError, Result};
pub use models::{Dataset, Status};
pub use sheets::{SheetSync, TrackerOperations};
