//! Barcode source abstraction.
//!
//! Camera capture and symbol decoding live outside this crate; a
//! [`BarcodeSource`] is anything that can hand the coordinator a stream of
//! decoded payload strings after the user has granted capture permission.

use std::collections::HashSet;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Barcode symbol families a capture pipeline may decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Symbology {
    QrCode,
    Ean8,
    Ean13,
    UpcE,
    Code39,
    Code128,
}

impl Symbology {
    pub const ALL: [Symbology; 6] = [
        Symbology::QrCode,
        Symbology::Ean8,
        Symbology::Ean13,
        Symbology::UpcE,
        Symbology::Code39,
        Symbology::Code128,
    ];

    /// Human-readable name, matching common scanner nomenclature.
    pub fn name(&self) -> &'static str {
        match self {
            Symbology::QrCode => "QR Code",
            Symbology::Ean8 => "EAN-8",
            Symbology::Ean13 => "EAN-13",
            Symbology::UpcE => "UPC-E",
            Symbology::Code39 => "Code 39",
            Symbology::Code128 => "Code 128",
        }
    }
}

/// Which symbol families a source should decode. Defaults to all of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannerConfig {
    enabled: HashSet<Symbology>,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            enabled: Symbology::ALL.into_iter().collect(),
        }
    }
}

impl ScannerConfig {
    /// A config with no symbologies enabled.
    pub fn none() -> Self {
        Self {
            enabled: HashSet::new(),
        }
    }

    pub fn enable(mut self, symbology: Symbology) -> Self {
        self.enabled.insert(symbology);
        self
    }

    pub fn disable(mut self, symbology: Symbology) -> Self {
        self.enabled.remove(&symbology);
        self
    }

    pub fn is_enabled(&self, symbology: Symbology) -> bool {
        self.enabled.contains(&symbology)
    }

    pub fn enabled(&self) -> impl Iterator<Item = Symbology> + '_ {
        self.enabled.iter().copied()
    }
}

/// Capture permission state. Sources must emit nothing while `Denied`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    NotDetermined,
    Granted,
    Denied,
}

/// A source of barcode detection events.
pub trait BarcodeSource: Send + Sync {
    /// Current capture permission state.
    fn permission(&self) -> Permission;

    /// Take the event stream. Each item is one decoded payload string.
    ///
    /// Returns `None` when permission is denied or the stream has already
    /// been taken; callers treat that as "no scanning available" and must
    /// not fail.
    fn take_events(&self) -> Option<mpsc::Receiver<String>>;
}

/// In-process [`BarcodeSource`] backed by an mpsc channel.
///
/// The producer half feeds decoded values in from wherever they originate —
/// tests push strings directly, the CLI forwards stdin lines.
pub struct ChannelSource {
    permission: Permission,
    rx: Mutex<Option<mpsc::Receiver<String>>>,
}

impl ChannelSource {
    /// A granted source together with its feed handle.
    pub fn new() -> (mpsc::Sender<String>, Self) {
        let (tx, rx) = mpsc::channel(16);
        (
            tx,
            Self {
                permission: Permission::Granted,
                rx: Mutex::new(Some(rx)),
            },
        )
    }

    /// A source whose permission was denied; it never yields events.
    pub fn denied() -> Self {
        Self {
            permission: Permission::Denied,
            rx: Mutex::new(None),
        }
    }
}

impl BarcodeSource for ChannelSource {
    fn permission(&self) -> Permission {
        self.permission
    }

    fn take_events(&self) -> Option<mpsc::Receiver<String>> {
        if self.permission == Permission::Denied {
            return None;
        }
        self.rx.lock().unwrap().take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_enables_all_families() {
        let config = ScannerConfig::default();
        for symbology in Symbology::ALL {
            assert!(config.is_enabled(symbology), "{} missing", symbology.name());
        }
    }

    #[test]
    fn builder_enable_disable() {
        let config = ScannerConfig::none()
            .enable(Symbology::Ean13)
            .enable(Symbology::QrCode)
            .disable(Symbology::Ean13);
        assert!(config.is_enabled(Symbology::QrCode));
        assert!(!config.is_enabled(Symbology::Ean13));
        assert!(!config.is_enabled(Symbology::Code39));
    }

    #[test]
    fn denied_source_yields_no_stream() {
        let source = ChannelSource::denied();
        assert_eq!(source.permission(), Permission::Denied);
        assert!(source.take_events().is_none());
    }

    #[test]
    fn event_stream_can_only_be_taken_once() {
        let (_tx, source) = ChannelSource::new();
        assert!(source.take_events().is_some());
        assert!(source.take_events().is_none());
    }

    #[tokio::test]
    async fn events_flow_through_the_channel() {
        let (tx, source) = ChannelSource::new();
        let mut rx = source.take_events().unwrap();
        tx.send("12345".to_string()).await.unwrap();
        assert_eq!(rx.recv().await.as_deref(), Some("12345"));
    }

    #[test]
    fn symbology_deserializes_kebab_case() {
        #[derive(serde::Deserialize)]
        struct Wrapper {
            symbologies: Vec<Symbology>,
        }
        let parsed: Wrapper =
            toml::from_str("symbologies = [\"qr-code\", \"ean-13\", \"upc-e\"]").unwrap();
        assert_eq!(
            parsed.symbologies,
            vec![Symbology::QrCode, Symbology::Ean13, Symbology::UpcE]
        );
    }
}
