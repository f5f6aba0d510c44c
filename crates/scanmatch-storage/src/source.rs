//! [`DocumentSource`] implementation that composes the storage client with
//! a PDF text extraction backend.

use std::sync::Arc;

use scanmatch_core::{BackendError, BoxFuture, CoreError, DocumentHandle, DocumentSource, PdfBackend};

use crate::client::FirebaseClient;

/// Remote documents: listed and downloaded via [`FirebaseClient`], text
/// extracted through a [`PdfBackend`] on a blocking thread.
pub struct RemoteDocumentSource<B> {
    client: FirebaseClient,
    backend: Arc<B>,
}

impl<B: PdfBackend + 'static> RemoteDocumentSource<B> {
    pub fn new(client: FirebaseClient, backend: B) -> Self {
        Self {
            client,
            backend: Arc::new(backend),
        }
    }
}

impl<B: PdfBackend + 'static> DocumentSource for RemoteDocumentSource<B> {
    fn list(&self) -> BoxFuture<'_, Result<Vec<DocumentHandle>, CoreError>> {
        Box::pin(async move { Ok(self.client.list().await?) })
    }

    fn fetch_text<'a>(
        &'a self,
        handle: &'a DocumentHandle,
    ) -> BoxFuture<'a, Result<String, CoreError>> {
        Box::pin(async move {
            let file = self.client.download(handle).await?;
            let backend = Arc::clone(&self.backend);
            let text = tokio::task::spawn_blocking(move || {
                // The temp file must outlive extraction; moving it into the
                // closure ties its lifetime to the blocking task.
                let result = backend.extract_text(file.path());
                drop(file);
                result
            })
            .await
            .map_err(|e| {
                CoreError::Extraction(BackendError::ExtractionError(format!(
                    "extraction task failed: {e}"
                )))
            })??;
            Ok(text)
        })
    }
}
