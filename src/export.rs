// Project bundle export and clipboard access

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::models::GeneratedApp;

/// Destination for copied text.
#[cfg_attr(test, mockall::automock)]
pub trait ClipboardSink {
    fn set_text(&mut self, text: &str) -> Result<()>;
}

/// The desktop clipboard. The handle is opened lazily so a headless session
/// only fails when the user actually copies.
#[derive(Default)]
pub struct SystemClipboard {
    inner: Option<arboard::Clipboard>,
}

impl ClipboardSink for SystemClipboard {
    fn set_text(&mut self, text: &str) -> Result<()> {
        if self.inner.is_none() {
            self.inner = Some(arboard::Clipboard::new().context("Clipboard is not available")?);
        }
        if let Some(clipboard) = self.inner.as_mut() {
            clipboard
                .set_text(text.to_string())
                .context("Failed to write to clipboard")?;
        }
        Ok(())
    }
}

/// Flatten every file into one text document with a path header per file.
pub fn bundle_text(app: &GeneratedApp) -> String {
    app.files
        .iter()
        .map(|file| format!("// --- {} ---\n{}", file.path, file.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// File name for the bundle. The project name comes from the model, so only
/// alphanumerics, `-` and `_` survive; every other run becomes a single `-`.
pub fn bundle_file_name(app: &GeneratedApp) -> String {
    let lowered = app.name.to_lowercase();
    let slug = lowered
        .split(|c: char| !(c.is_alphanumeric() || c == '-' || c == '_'))
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-");
    let slug = slug.trim_matches('-');
    let slug = if slug.is_empty() { "project" } else { slug };
    format!("{slug}-vercel-ready.txt")
}

pub fn write_bundle(app: &GeneratedApp, dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir).context("Failed to create output directory")?;

    let path = dir.join(bundle_file_name(app));
    fs::write(&path, bundle_text(app)).context("Failed to write project bundle")?;

    tracing::info!(path = %path.display(), files = app.files.len(), "Project bundle written");
    Ok(path)
}
