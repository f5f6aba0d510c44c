//! Document source trait: the seam between the coordinator and remote
//! storage.

use std::future::Future;
use std::pin::Pin;

use crate::{CoreError, DocumentHandle};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A store of documents available for matching.
///
/// Implementations may fail per-item or wholesale; the coordinator treats
/// any `fetch_text` failure as "no extractable text" and degrades to the
/// prompt presentation rather than surfacing an error.
pub trait DocumentSource: Send + Sync {
    /// List the available documents.
    fn list(&self) -> BoxFuture<'_, Result<Vec<DocumentHandle>, CoreError>>;

    /// Fetch the full extracted text of a document.
    fn fetch_text<'a>(
        &'a self,
        handle: &'a DocumentHandle,
    ) -> BoxFuture<'a, Result<String, CoreError>>;
}
