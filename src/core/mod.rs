pub mod depreciation;
pub mod scheduler;
pub mod updater;

pub use crate::domain::model::{Document, Listing, ListingUpdate, RunSummary};
pub use crate::domain::ports::{Clock, ConfigProvider, DocumentStore};
pub use crate::utils::error::Result;
