use std::io::Write;

use owo_colors::OwoColorize;
use scanmatch_core::{BannerColor, DocumentHandle, PresentationState};

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

/// Print the banner for the current presentation snapshot. Prints nothing
/// when no code has been detected yet (no indicator).
pub fn print_banner(
    w: &mut dyn Write,
    snapshot: &PresentationState,
    color: ColorMode,
) -> std::io::Result<()> {
    let Some(banner) = snapshot.banner() else {
        return Ok(());
    };
    let code = snapshot
        .detected
        .as_ref()
        .map(|c| c.as_str())
        .unwrap_or_default();

    if color.enabled() {
        match banner.color {
            BannerColor::Green => writeln!(w, "{}  [{}]", banner.message.green(), code),
            BannerColor::Red => writeln!(w, "{}  [{}]", banner.message.red(), code),
            BannerColor::Clear => writeln!(w, "{}  [{}]", banner.message.dimmed(), code),
        }
    } else {
        writeln!(w, "{}  [{}]", banner.message, code)
    }
}

/// Print the selectable document list, marking the current selection.
pub fn print_document_list(
    w: &mut dyn Write,
    handles: &[DocumentHandle],
    selected: Option<&str>,
    color: ColorMode,
) -> std::io::Result<()> {
    if handles.is_empty() {
        writeln!(w, "No documents found.")?;
        return Ok(());
    }
    for handle in handles {
        let marker = if selected == Some(handle.name.as_str()) {
            "*"
        } else {
            " "
        };
        if color.enabled() && marker == "*" {
            writeln!(w, "{} {}", marker, handle.name.blue())?;
        } else {
            writeln!(w, "{} {}", marker, handle.name)?;
        }
    }
    Ok(())
}
