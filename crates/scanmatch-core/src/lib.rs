use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod backend;
pub mod barcode;
pub mod config_file;
pub mod coordinator;
pub mod evaluate;
pub mod source;

// Re-export for convenience
pub use backend::{BackendError, PdfBackend};
pub use barcode::{BarcodeSource, ChannelSource, Permission, ScannerConfig, Symbology};
pub use coordinator::{Coordinator, DetectionSignal};
pub use evaluate::evaluate;
pub use source::{BoxFuture, DocumentSource};

/// A barcode payload produced by a detection event.
///
/// Ephemeral: each new detection replaces the previous value, and no history
/// is kept. An empty string is a valid, present payload — "no scan yet" is
/// represented by the absence of a `DetectedCode`, never by `""`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedCode(String);

impl DetectedCode {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A remotely hosted document available for matching.
///
/// Immutable once produced by a listing. `name` is the display name (object
/// key with the listing prefix stripped); `url` resolves to the document
/// content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentHandle {
    pub name: String,
    pub url: String,
}

/// Derived match tri-state for the current scan and selection.
///
/// Never stored independently: always recomputed from the latest detected
/// code and the selected document's extracted text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchState {
    /// A code was scanned but no document text is available (nothing
    /// selected, or extraction failed).
    Unselected,
    /// The scanned code appears in the document text.
    Matched,
    /// The scanned code does not appear in the document text.
    Unmatched,
}

/// Fixed banner messages shown by the presentation boundary.
pub const MSG_SELECT: &str = "Select a PDF";
pub const MSG_MATCHED: &str = "Barcode found in the PDF!";
pub const MSG_UNMATCHED: &str = "Barcode not found in the PDF.";

/// Banner background color. `Clear` renders with no emphasis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerColor {
    Clear,
    Green,
    Red,
}

/// What the presentation boundary should render for a match state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Banner {
    pub message: &'static str,
    pub color: BannerColor,
}

impl Banner {
    pub fn for_state(state: MatchState) -> Self {
        match state {
            MatchState::Unselected => Banner {
                message: MSG_SELECT,
                color: BannerColor::Clear,
            },
            MatchState::Matched => Banner {
                message: MSG_MATCHED,
                color: BannerColor::Green,
            },
            MatchState::Unmatched => Banner {
                message: MSG_UNMATCHED,
                color: BannerColor::Red,
            },
        }
    }
}

/// Immutable snapshot of the coordinator's observable state.
///
/// `state` is `None` exactly when no code has been detected yet; the UI
/// shows no indicator in that case.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PresentationState {
    pub detected: Option<DetectedCode>,
    pub selected: Option<DocumentHandle>,
    pub state: Option<MatchState>,
}

impl PresentationState {
    /// The banner to render, if any.
    pub fn banner(&self) -> Option<Banner> {
        self.state.map(Banner::for_state)
    }
}

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("capture permission denied")]
    PermissionDenied,
    #[error("capture device unavailable")]
    DeviceUnavailable,
    #[error("document listing failed: {0}")]
    Listing(String),
    #[error("document resolution failed: {0}")]
    ItemResolution(String),
    #[error("text extraction failed: {0}")]
    Extraction(#[from] BackendError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn banner_messages_are_fixed() {
        assert_eq!(Banner::for_state(MatchState::Unselected).message, MSG_SELECT);
        assert_eq!(Banner::for_state(MatchState::Matched).message, MSG_MATCHED);
        assert_eq!(
            Banner::for_state(MatchState::Unmatched).message,
            MSG_UNMATCHED
        );
    }

    #[test]
    fn no_detection_means_no_banner() {
        let snapshot = PresentationState::default();
        assert!(snapshot.banner().is_none());
    }

    #[test]
    fn banner_colors() {
        assert_eq!(
            Banner::for_state(MatchState::Matched).color,
            BannerColor::Green
        );
        assert_eq!(
            Banner::for_state(MatchState::Unmatched).color,
            BannerColor::Red
        );
        assert_eq!(
            Banner::for_state(MatchState::Unselected).color,
            BannerColor::Clear
        );
    }
}
