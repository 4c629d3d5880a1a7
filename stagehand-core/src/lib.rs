//! stagehand core library: domain types, descriptor parsing, configuration, errors.
//!
//! Public API surface:
//! - [`types`]: newtypes, content units, change sets, watermark, failure ledger
//! - [`descriptor`]: asset descriptor (`config.txt`) metadata extraction
//! - [`config`]: YAML configuration and resolved filesystem layout
//! - [`error`]: [`CoreError`]

pub mod config;
pub mod descriptor;
pub mod error;
pub mod types;

pub use config::{Config, Layout};
pub use descriptor::Descriptor;
pub use error::CoreError;
pub use types::{Asset, AssetId, ChangeSet, ContentUnit, FailureLedger, Script, Watermark};
