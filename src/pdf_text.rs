use std::path::Path;

use anyhow::Context;

/// Returns the trimmed text strictly between the first occurrence of
/// `start_marker` and the first occurrence of `end_marker` after it.
/// If the end marker never appears the remainder of the text is returned;
/// if the start marker never appears there is nothing to extract.
pub fn extract_between_markers(
    full_text: &str,
    start_marker: &str,
    end_marker: &str,
) -> Option<String> {
    let start_idx = full_text.find(start_marker)?;
    let after_start = start_idx + start_marker.len();
    let section = match full_text[after_start..].find(end_marker) {
        Some(offset) => &full_text[after_start..after_start + offset],
        None => &full_text[after_start..],
    };
    Some(section.trim().to_string())
}

/// The text-extraction step behind the marker search, so tests can feed
/// plain-text documents through the same pipeline.
pub trait PdfTextBackend: Send + Sync {
    /// Extract the document's plain text, pages concatenated in order.
    fn extract_text(&self, path: &Path) -> anyhow::Result<String>;
}

pub struct PdfExtractBackend;

impl PdfTextBackend for PdfExtractBackend {
    fn extract_text(&self, path: &Path) -> anyhow::Result<String> {
        pdf_extract::extract_text(path)
            .with_context(|| format!("failed to extract text from {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_trimmed_text_between_markers() {
        let text = "A Course objectives and learning outcomes: Foo Entrance requirement: Bar";
        let section = extract_between_markers(
            text,
            "Course objectives and learning outcomes",
            "Entrance requirement",
        );
        assert_eq!(section.as_deref(), Some(": Foo"));
    }

    #[test]
    fn missing_start_marker_yields_nothing() {
        let section = extract_between_markers("nothing relevant here", "Contents", "Bibliography");
        assert_eq!(section, None);
    }

    #[test]
    fn missing_end_marker_takes_the_remainder() {
        let text = "intro Contents everything after the heading";
        let section = extract_between_markers(text, "Contents", "Bibliography");
        assert_eq!(section.as_deref(), Some("everything after the heading"));
    }

    #[test]
    fn end_marker_is_searched_only_after_the_start() {
        // The end marker also occurs before the start marker; only the later
        // occurrence bounds the section.
        let text = "End Start middle End tail";
        let section = extract_between_markers(text, "Start", "End");
        assert_eq!(section.as_deref(), Some("middle"));
    }

    #[test]
    fn matching_is_case_sensitive() {
        let text = "course objectives and learning outcomes: Foo";
        let section = extract_between_markers(
            text,
            "Course objectives and learning outcomes",
            "Entrance requirement",
        );
        assert_eq!(section, None);
    }
}
