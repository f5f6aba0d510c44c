//! Scan-match coordinator: owns selection/detection state and drives
//! evaluation.
//!
//! All mutations go through a single mutex, and observers only ever see
//! immutable [`PresentationState`] snapshots published through a watch
//! channel. Extraction for a selection runs on its own task; a generation
//! counter plus a [`CancellationToken`] guarantee that a slow extraction
//! for a superseded selection can never overwrite the newer selection's
//! state.

use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::barcode::{BarcodeSource, Permission};
use crate::evaluate::evaluate;
use crate::source::DocumentSource;
use crate::{CoreError, DetectedCode, DocumentHandle, PresentationState};

/// Hook fired on every detection event, match or not — the stand-in for the
/// haptic confirmation a handheld scanner gives on a successful decode.
pub type DetectionSignal = Arc<dyn Fn(&str) + Send + Sync>;

struct State {
    detected: Option<DetectedCode>,
    selected: Option<DocumentHandle>,
    /// Extracted text for `selected`. Absent until extraction lands, and
    /// absent permanently if extraction failed (silent degradation).
    text: Option<String>,
    /// Bumped on every selection change; an extraction result is applied
    /// only if its generation is still current.
    generation: u64,
    /// Token for the in-flight extraction. Lives inside the state mutex so
    /// replacing it and bumping the generation are one atomic step; a
    /// concurrent selection can therefore never cancel the token belonging
    /// to the generation that superseded it.
    extraction: CancellationToken,
}

struct Inner {
    documents: Arc<dyn DocumentSource>,
    state: Mutex<State>,
    tx: watch::Sender<PresentationState>,
    signal: Option<DetectionSignal>,
}

/// Cheaply cloneable handle; all clones share the same state.
#[derive(Clone)]
pub struct Coordinator {
    inner: Arc<Inner>,
}

impl Coordinator {
    pub fn new(documents: Arc<dyn DocumentSource>) -> Self {
        Self::build(documents, None)
    }

    /// A coordinator that fires `signal` on every detection event.
    pub fn with_signal(documents: Arc<dyn DocumentSource>, signal: DetectionSignal) -> Self {
        Self::build(documents, Some(signal))
    }

    fn build(documents: Arc<dyn DocumentSource>, signal: Option<DetectionSignal>) -> Self {
        let (tx, _rx) = watch::channel(PresentationState::default());
        Self {
            inner: Arc::new(Inner {
                documents,
                state: Mutex::new(State {
                    detected: None,
                    selected: None,
                    text: None,
                    generation: 0,
                    extraction: CancellationToken::new(),
                }),
                tx,
                signal,
            }),
        }
    }

    /// Observe presentation snapshots. The receiver starts at the current
    /// state and sees every subsequent change.
    pub fn subscribe(&self) -> watch::Receiver<PresentationState> {
        self.inner.tx.subscribe()
    }

    /// The current presentation snapshot.
    pub fn current(&self) -> PresentationState {
        self.inner.tx.borrow().clone()
    }

    /// Replace the current detected code and re-evaluate.
    ///
    /// The detection signal fires on every event regardless of the match
    /// outcome. The code persists until the next detection; there is no
    /// expiry.
    pub fn on_barcode_detected(&self, code: impl Into<String>) {
        let code = code.into();
        if let Some(signal) = &self.inner.signal {
            signal(&code);
        }
        let mut state = self.inner.state.lock().unwrap();
        state.detected = Some(DetectedCode::new(code));
        self.inner.publish(&state);
    }

    /// Replace the current selection and start extracting its text.
    ///
    /// Any in-flight extraction for a prior selection is cancelled, and its
    /// result is discarded even if it slips past cancellation. Extraction
    /// failure leaves the text absent, so evaluation degrades to the prompt
    /// state instead of reporting an error.
    pub fn select_document(&self, handle: DocumentHandle) -> JoinHandle<()> {
        let (generation, token) = {
            let mut state = self.inner.state.lock().unwrap();
            state.generation += 1;
            state.selected = Some(handle.clone());
            state.text = None;
            state.extraction.cancel();
            state.extraction = CancellationToken::new();
            self.inner.publish(&state);
            (state.generation, state.extraction.clone())
        };

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let outcome = tokio::select! {
                _ = token.cancelled() => return,
                outcome = inner.documents.fetch_text(&handle) => outcome,
            };

            let mut state = inner.state.lock().unwrap();
            if state.generation != generation {
                // A newer selection won the race; drop this result.
                return;
            }
            match outcome {
                Ok(text) => state.text = Some(text),
                Err(error) => {
                    tracing::warn!(
                        document = %handle.name,
                        %error,
                        "text extraction failed; treating document as having no text"
                    );
                    state.text = None;
                }
            }
            inner.publish(&state);
        })
    }

    /// Drop the current selection and its extracted text, cancelling any
    /// in-flight extraction.
    pub fn clear_selection(&self) {
        let mut state = self.inner.state.lock().unwrap();
        state.generation += 1;
        state.selected = None;
        state.text = None;
        state.extraction.cancel();
        self.inner.publish(&state);
    }

    /// Drive detections from a barcode source until `cancel` fires or the
    /// source's stream closes.
    ///
    /// Errors when the source cannot produce events: permission denied, or
    /// the device's stream was already taken. The coordinator itself keeps
    /// working without a source, so callers that treat scanning as optional
    /// can log the error and continue.
    pub fn attach_source(
        &self,
        source: &dyn BarcodeSource,
        cancel: CancellationToken,
    ) -> Result<JoinHandle<()>, CoreError> {
        if source.permission() == Permission::Denied {
            tracing::debug!("capture permission denied; not scanning");
            return Err(CoreError::PermissionDenied);
        }
        let mut events = source.take_events().ok_or(CoreError::DeviceUnavailable)?;
        let this = self.clone();
        Ok(tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    event = events.recv() => match event {
                        Some(code) => this.on_barcode_detected(code),
                        None => break,
                    },
                }
            }
        }))
    }
}

impl Inner {
    fn publish(&self, state: &State) {
        let snapshot = PresentationState {
            detected: state.detected.clone(),
            selected: state.selected.clone(),
            state: evaluate(
                state.detected.as_ref().map(DetectedCode::as_str),
                state.text.as_deref(),
            ),
        };
        // Send succeeds even with no receivers; `current()` reads the same
        // channel.
        let _ = self.tx.send(snapshot);
    }
}
