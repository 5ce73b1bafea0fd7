//! Input resolution: read the source markdown and derive artifact paths.
//!
//! Input failures are the only fatal-before-start errors in the pipeline, so
//! they get precise variants — a missing file and an unreadable file need
//! different remediation and must not collapse into one message.

use crate::error::CarouselError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Suffix of the persisted HTML artifact.
pub const HTML_SUFFIX: &str = "_carousel.html";

/// Suffix of the persisted PDF artifact.
pub const PDF_SUFFIX: &str = "_carousel.pdf";

/// A successfully read source document.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    /// Path the document was read from.
    pub path: PathBuf,
    /// Full markdown text.
    pub text: String,
    /// File stem used to derive artifact names and the fallback title.
    pub base_name: String,
}

impl SourceDocument {
    /// `<dir>/<base>_carousel.html` next to the source file.
    pub fn html_path(&self) -> PathBuf {
        self.sibling(HTML_SUFFIX)
    }

    /// `<dir>/<base>_carousel.pdf` next to the source file.
    pub fn pdf_path(&self) -> PathBuf {
        self.sibling(PDF_SUFFIX)
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let file = format!("{}{}", self.base_name, suffix);
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.join(file),
            _ => PathBuf::from(file),
        }
    }

    /// Title for the fallback slide list: the first `# ` heading, else the
    /// file stem with `_`/`-` mapped to spaces and each word capitalised.
    pub fn fallback_title(&self) -> String {
        if let Some(caps) = RE_H1.captures(&self.text) {
            return caps[1].trim().to_string();
        }
        title_case(&self.base_name)
    }
}

static RE_H1: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^# (.+)$").expect("valid regex"));

/// Read and validate the source markdown file.
pub async fn read_source(path: impl AsRef<Path>) -> Result<SourceDocument, CarouselError> {
    let path = path.as_ref().to_path_buf();

    if !path.exists() {
        return Err(CarouselError::FileNotFound { path });
    }

    let text = match tokio::fs::read_to_string(&path).await {
        Ok(t) => t,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(CarouselError::PermissionDenied { path });
        }
        Err(e) => {
            return Err(CarouselError::UnreadableInput {
                path,
                detail: e.to_string(),
            });
        }
    };

    let base_name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "carousel".to_string());

    info!("Loaded {} characters from {}", text.len(), path.display());
    debug!("Base name: {base_name}");

    Ok(SourceDocument {
        path,
        text,
        base_name,
    })
}

/// "market_research-2024" → "Market Research 2024".
fn title_case(stem: &str) -> String {
    stem.replace(['_', '-'], " ")
        .split_whitespace()
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(path: &str, text: &str) -> SourceDocument {
        let path = PathBuf::from(path);
        let base_name = path.file_stem().unwrap().to_string_lossy().into_owned();
        SourceDocument {
            path,
            text: text.to_string(),
            base_name,
        }
    }

    #[test]
    fn artifact_paths_use_fixed_suffixes() {
        let d = doc("/tmp/reports/q3_review.md", "# Q3");
        assert_eq!(d.html_path(), PathBuf::from("/tmp/reports/q3_review_carousel.html"));
        assert_eq!(d.pdf_path(), PathBuf::from("/tmp/reports/q3_review_carousel.pdf"));
    }

    #[test]
    fn bare_filename_has_no_parent_prefix() {
        let d = doc("notes.md", "hello");
        assert_eq!(d.html_path(), PathBuf::from("notes_carousel.html"));
    }

    #[test]
    fn fallback_title_prefers_h1() {
        let d = doc("x.md", "intro\n# Marketing Report\nbody");
        assert_eq!(d.fallback_title(), "Marketing Report");
    }

    #[test]
    fn fallback_title_from_stem_when_no_heading() {
        let d = doc("market_research-2024.md", "no headings here");
        assert_eq!(d.fallback_title(), "Market Research 2024");
    }

    #[tokio::test]
    async fn missing_file_is_distinct_error() {
        let err = read_source("/definitely/not/here.md").await.unwrap_err();
        assert!(matches!(err, CarouselError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn reads_real_file() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("demo.md");
        std::fs::write(&p, "# Demo\n\ncontent").unwrap();
        let d = read_source(&p).await.unwrap();
        assert_eq!(d.base_name, "demo");
        assert_eq!(d.fallback_title(), "Demo");
    }
}
