//! Localized fallback text for missing titles.

/// Text used when a document does not provide a title.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FallbackLabels {
    /// Book title used when `book-title` is missing or blank
    pub untitled: &'static str,
    /// Word placed before the chapter number in generated chapter titles
    pub chapter: &'static str,
}

impl FallbackLabels {
    /// English labels: "Untitled", "Chapter N".
    pub const fn english() -> Self {
        Self {
            untitled: "Untitled",
            chapter: "Chapter",
        }
    }

    /// Russian labels: "Без названия", "Глава N".
    pub const fn russian() -> Self {
        Self {
            untitled: "Без названия",
            chapter: "Глава",
        }
    }

    /// Look up labels by language code; unknown codes get `None`.
    pub fn for_language(code: &str) -> Option<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "en" => Some(Self::english()),
            "ru" => Some(Self::russian()),
            _ => None,
        }
    }

    /// Generated title for the chapter at 1-based `position`.
    pub fn chapter_title(&self, position: usize) -> String {
        format!("{} {}", self.chapter, position)
    }
}

impl Default for FallbackLabels {
    fn default() -> Self {
        Self::english()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_english() {
        let labels = FallbackLabels::default();
        assert_eq!(labels.untitled, "Untitled");
        assert_eq!(labels.chapter_title(3), "Chapter 3");
    }

    #[test]
    fn test_russian_labels() {
        let labels = FallbackLabels::russian();
        assert_eq!(labels.untitled, "Без названия");
        assert_eq!(labels.chapter_title(1), "Глава 1");
    }

    #[test]
    fn test_for_language() {
        assert_eq!(FallbackLabels::for_language("RU"), Some(FallbackLabels::russian()));
        assert_eq!(FallbackLabels::for_language(" en "), Some(FallbackLabels::english()));
        assert_eq!(FallbackLabels::for_language("de"), None);
    }
}
