//! Client for the external content store's command-line protocol.
//!
//! Every operation spawns the store executable once (`<exe> <verb> <args…>`),
//! captures its standard output and scans it for the first decisive line:
//!
//! ```text
//! + <kuid:523:19001> : installed          success
//! - <kuid:523:19001> : asset is not open  failure, message after the ':'
//! ```
//!
//! [`AssetStore`] is the typed surface the sync pipeline depends on;
//! [`StoreClient`] implements it on top of any [`Invoker`], and
//! [`ProcessInvoker`] is the real subprocess transport.

mod client;
mod error;
mod invoker;
pub mod protocol;

pub use client::{AssetStore, Outcome, StoreClient};
pub use error::StoreError;
pub use invoker::{Invoker, ProcessInvoker};
pub use protocol::Verb;
