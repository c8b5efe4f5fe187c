//! Per-page classification: is a page's embedded text good enough, or does
//! the page need to be rasterized and OCRed?

/// Chosen text source for a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageClass {
    /// Embedded text is usable as-is.
    UseEmbedded,
    /// Embedded text is missing or junk (whitespace, bare page numbers,
    /// extraction artifacts); the page must go through OCR.
    NeedsOcr,
}

/// Classify a page from its embedded text.
///
/// `UseEmbedded` iff the trimmed text is strictly longer than `threshold`
/// characters. The threshold is a heuristic, not a correctness boundary;
/// it defaults to 20 and is configurable.
pub fn classify_page(embedded: Option<&str>, threshold: usize) -> PageClass {
    match embedded {
        Some(text) if text.trim().chars().count() > threshold => PageClass::UseEmbedded,
        _ => PageClass::NeedsOcr,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const THRESHOLD: usize = 20;

    #[test]
    fn test_long_text_uses_embedded() {
        let text = "This page has plenty of real embedded text content.";
        assert_eq!(classify_page(Some(text), THRESHOLD), PageClass::UseEmbedded);
    }

    #[test]
    fn test_threshold_is_strict() {
        // Exactly 20 chars after trim is still junk.
        let text = "a".repeat(20);
        assert_eq!(classify_page(Some(&text), THRESHOLD), PageClass::NeedsOcr);

        let text = "a".repeat(21);
        assert_eq!(classify_page(Some(&text), THRESHOLD), PageClass::UseEmbedded);
    }

    #[test]
    fn test_whitespace_padding_does_not_count() {
        let text = format!("   {}   \n", "a".repeat(20));
        assert_eq!(classify_page(Some(&text), THRESHOLD), PageClass::NeedsOcr);
    }

    #[test]
    fn test_empty_and_missing_need_ocr() {
        assert_eq!(classify_page(Some(""), THRESHOLD), PageClass::NeedsOcr);
        assert_eq!(classify_page(Some("  \n\t "), THRESHOLD), PageClass::NeedsOcr);
        assert_eq!(classify_page(None, THRESHOLD), PageClass::NeedsOcr);
    }

    #[test]
    fn test_page_number_artifacts_need_ocr() {
        assert_eq!(classify_page(Some("- 14 -"), THRESHOLD), PageClass::NeedsOcr);
    }
}
