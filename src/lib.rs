//! filevault - personal file vault
//!
//! Local blob storage for files and folders, thumbnail rendering for any
//! MIME type, and a catalog service that ties them together.

pub mod analytics;
pub mod catalog;
pub mod config;
pub mod error;
pub mod format;
pub mod logging;
pub mod session;
pub mod store;
pub mod thumbnail;

pub use analytics::{SizeDistribution, UsageLevel, UsageStats};
pub use catalog::{BatchReport, Catalog, ItemFailure, Selection, UploadQueue, UploadTicket};
pub use config::Config;
pub use error::{Result, VaultError};
pub use format::format_size;
pub use session::{AuthEvent, Principal, SessionHub, Subscription};
pub use store::{BlobStore, FileBlob, StoredFile, StoredFolder};
pub use thumbnail::{placeholder_data_uri, ThumbnailRenderer};
