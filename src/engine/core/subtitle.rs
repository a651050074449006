//! Subtitle text normalization.
//!
//! ffmpeg's subtitles filter (libass) expects UTF-8. Subtitle files in the
//! wild are often Windows-1251 or DOS codepages, so the file is decoded with
//! the first encoding that accepts it and written to a temporary UTF-8 copy.

use anyhow::{Context, Result};
use encoding_rs::{Encoding, IBM866, UTF_8, WINDOWS_1251, WINDOWS_1252};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::TempPath;
use tracing::{debug, warn};

/// Source encodings tried in order
pub fn candidate_encodings() -> [&'static Encoding; 4] {
    [UTF_8, WINDOWS_1251, IBM866, WINDOWS_1252]
}

/// How the subtitle bytes were turned into UTF-8
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoded {
    /// Decoded strictly with this encoding
    Exact(&'static Encoding),
    /// No candidate decoded cleanly; invalid sequences were replaced
    Lossy,
}

/// Decode subtitle bytes with the first candidate encoding that has no errors
pub fn decode_subtitle(bytes: &[u8]) -> (String, Decoded) {
    for encoding in candidate_encodings() {
        if let Some(text) = encoding.decode_without_bom_handling_and_without_replacement(bytes) {
            return (text.into_owned(), Decoded::Exact(encoding));
        }
    }
    (String::from_utf8_lossy(bytes).into_owned(), Decoded::Lossy)
}

/// UTF-8 temporary copy of a subtitle file. Deleted when dropped.
#[derive(Debug)]
pub struct NormalizedSubtitle {
    path: TempPath,
    decoded: Decoded,
}

impl NormalizedSubtitle {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn decoded(&self) -> Decoded {
        self.decoded
    }

    /// Delete the temporary file now, reporting failure
    pub fn close(self) -> Result<()> {
        let display = self.path.display().to_string();
        self.path
            .close()
            .with_context(|| format!("Failed to remove temporary subtitle {}", display))
    }
}

/// Write a UTF-8 copy of `original` into the system temp dir.
///
/// The copy is named `sub_*` and keeps the source extension so the filter
/// still recognizes the subtitle format.
pub fn normalize_subtitle(original: &Path) -> Result<NormalizedSubtitle> {
    normalize_subtitle_in(original, &std::env::temp_dir())
}

/// Same as [`normalize_subtitle`], writing into `dir`
pub fn normalize_subtitle_in(original: &Path, dir: &Path) -> Result<NormalizedSubtitle> {
    let bytes = fs::read(original)
        .with_context(|| format!("Failed to read subtitle file {}", original.display()))?;

    let (text, decoded) = decode_subtitle(&bytes);
    match decoded {
        Decoded::Exact(encoding) => debug!(
            subtitle = %original.display(),
            encoding = encoding.name(),
            "decoded subtitle"
        ),
        Decoded::Lossy => warn!(
            subtitle = %original.display(),
            "no candidate encoding matched, using lossy UTF-8"
        ),
    }

    let suffix = original
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();

    let mut file = tempfile::Builder::new()
        .prefix("sub_")
        .suffix(&suffix)
        .tempfile_in(dir)
        .context("Failed to create temporary subtitle file")?;

    file.write_all(text.as_bytes())
        .context("Failed to write temporary subtitle file")?;
    file.flush()
        .context("Failed to flush temporary subtitle file")?;

    Ok(NormalizedSubtitle {
        path: file.into_temp_path(),
        decoded,
    })
}
