//! Business logic services.

pub mod download;
pub mod filename;
pub mod lookup;
pub mod qr;

pub use download::Downloader;
pub use lookup::{DownloadLink, LookupOutcome, LookupState, run_lookup};
