use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use stagehand_core::AssetId;

use crate::error::StoreError;
use crate::invoker::Invoker;
use crate::protocol::{self, Decisive, Verb};

/// Interpreted result of one store call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The first decisive line started with `+`; the line itself is kept.
    Success(String),
    /// The store printed nothing decisive.
    NoResult,
}

/// Typed operations against the content store.
///
/// The sync pipeline and reconciliation are written against this trait so
/// tests can script store behaviour without spawning processes.
pub trait AssetStore {
    /// Install the content at `path`. Returns the installed asset id when the
    /// store reports one.
    fn install_from_path(&self, path: &Path) -> Result<Option<AssetId>, StoreError>;

    /// Open `id` for editing. Returns the edit directory the store reports.
    fn open_for_edit(&self, id: &AssetId) -> Result<Option<PathBuf>, StoreError>;

    /// Commit pending edits of `id`. `false` means the store said nothing
    /// decisive.
    fn commit(&self, id: &AssetId) -> Result<bool, StoreError>;

    /// Abandon pending edits of `id`.
    fn revert(&self, id: &AssetId) -> Result<(), StoreError>;

    /// `true` when the store repeats `text` back verbatim on its own line.
    fn echo(&self, text: &str) -> Result<bool, StoreError>;
}

/// [`AssetStore`] over an [`Invoker`] transport.
pub struct StoreClient<I> {
    invoker: I,
}

impl<I: Invoker> StoreClient<I> {
    pub fn new(invoker: I) -> Self {
        Self { invoker }
    }

    pub fn invoker(&self) -> &I {
        &self.invoker
    }

    /// Run `verb` and interpret its first decisive line.
    ///
    /// A `-` line becomes [`StoreError::Rejected`] carrying the message text.
    pub fn invoke(&self, verb: Verb, args: &[&OsStr]) -> Result<Outcome, StoreError> {
        let stdout = self.invoker.run(verb, args)?;
        match protocol::first_decisive(&stdout) {
            Some(Decisive::Success(line)) => Ok(Outcome::Success(line.to_string())),
            Some(Decisive::Failure(line)) => Err(StoreError::Rejected {
                verb,
                message: protocol::tagged_text(line).to_string(),
            }),
            None => {
                tracing::debug!(verb = %verb, "store reply had no decisive line");
                Ok(Outcome::NoResult)
            }
        }
    }
}

impl<I: Invoker> AssetStore for StoreClient<I> {
    fn install_from_path(&self, path: &Path) -> Result<Option<AssetId>, StoreError> {
        match self.invoke(Verb::InstallFromPath, &[path.as_os_str()])? {
            Outcome::Success(line) => Ok(protocol::bracketed(&line).map(AssetId::from)),
            Outcome::NoResult => Ok(None),
        }
    }

    fn open_for_edit(&self, id: &AssetId) -> Result<Option<PathBuf>, StoreError> {
        match self.invoke(Verb::Edit, &[OsStr::new(id.as_str())])? {
            Outcome::Success(line) => {
                let dir = protocol::tagged_text(&line);
                Ok((!dir.is_empty()).then(|| PathBuf::from(dir)))
            }
            Outcome::NoResult => Ok(None),
        }
    }

    fn commit(&self, id: &AssetId) -> Result<bool, StoreError> {
        let outcome = self.invoke(Verb::Commit, &[OsStr::new(id.as_str())])?;
        Ok(matches!(outcome, Outcome::Success(_)))
    }

    fn revert(&self, id: &AssetId) -> Result<(), StoreError> {
        self.invoke(Verb::Revert, &[OsStr::new(id.as_str())])?;
        Ok(())
    }

    fn echo(&self, text: &str) -> Result<bool, StoreError> {
        let stdout = self.invoker.run(Verb::Echo, &[OsStr::new(text)])?;
        Ok(protocol::echoed(&stdout, text))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
