use std::{
    fmt,
    io::{self, Write},
    sync::{Mutex, PoisonError},
};

use anyhow::Context;
use base64::{Engine, engine::general_purpose::STANDARD};
use tracing::debug;

/// Places text on some clipboard.
pub trait Clipboard: Send + Sync {
    /// # Errors
    /// Will return [`Err`] if the clipboard is unavailable or rejects the text.
    fn copy_text(&self, text: &str) -> anyhow::Result<()>;
}

/// The desktop clipboard, through `arboard`.
///
/// On X11 and Wayland the copied text is only served while the owning handle is alive, so the
/// handle is opened on first use and kept until this value is dropped. Dropping it hands the
/// contents over to a clipboard manager when one is running.
#[derive(Default)]
pub struct SystemClipboard {
    handle: Mutex<Option<arboard::Clipboard>>,
}

impl fmt::Debug for SystemClipboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SystemClipboard")
            .field("handle", &"<system clipboard>")
            .finish()
    }
}

impl Clipboard for SystemClipboard {
    fn copy_text(&self, text: &str) -> anyhow::Result<()> {
        let mut slot = self.handle.lock().unwrap_or_else(PoisonError::into_inner);
        let clipboard = retained(&mut slot, || {
            arboard::Clipboard::new().context("Failed to access system clipboard")
        })?;
        clipboard
            .set_text(text)
            .context("Failed to set clipboard text")?;
        debug!(len = text.len(), "Copied to system clipboard");
        Ok(())
    }
}

/// Returns the handle in `slot`, opening one first if the slot is empty.
///
/// A failed open leaves the slot empty so the next call tries again.
fn retained<T>(
    slot: &mut Option<T>,
    open: impl FnOnce() -> anyhow::Result<T>,
) -> anyhow::Result<&mut T> {
    let handle = match slot.take() {
        Some(handle) => handle,
        None => open()?,
    };
    Ok(slot.insert(handle))
}

/// Legacy fallback: asks the terminal emulator to copy via an OSC 52 escape sequence.
#[derive(Debug, Default)]
pub struct TerminalClipboard;

impl TerminalClipboard {
    #[must_use]
    pub fn sequence(text: &str) -> String {
        format!("\x1b]52;c;{}\x07", STANDARD.encode(text))
    }
}

impl Clipboard for TerminalClipboard {
    fn copy_text(&self, text: &str) -> anyhow::Result<()> {
        let mut stdout = io::stdout().lock();
        stdout
            .write_all(Self::sequence(text).as_bytes())
            .and_then(|()| stdout.flush())
            .context("Failed to write OSC 52 sequence")?;
        debug!(len = text.len(), "Copied through terminal escape sequence");
        Ok(())
    }
}
