pub const DEFAULT_KEYWORDS: [&str; 2] = ["mbois", "ustadz"];

/// Keeps items whose combined text mentions at least one keyword.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelevanceFilter {
    keywords: Vec<String>,
}

impl Default for RelevanceFilter {
    fn default() -> Self {
        Self::new(DEFAULT_KEYWORDS)
    }
}

impl RelevanceFilter {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut keywords: Vec<String> = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        keywords.dedup();
        Self { keywords }
    }

    /// A filter with no keywords accepts everything.
    pub fn accept_all() -> Self {
        Self {
            keywords: Vec::new(),
        }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn matches(&self, fields: &[&str]) -> bool {
        if self.keywords.is_empty() {
            return true;
        }
        let text = fields.join(" ").to_lowercase();
        self.keywords.iter().any(|k| text.contains(k.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_any_keyword_across_fields() {
        let f = RelevanceFilter::default();
        assert!(f.matches(&["Kajian Subuh", "Ustadz Mbois Official", ""]));
        assert!(f.matches(&["", "", "bersama USTADZ kita"]));
        assert!(!f.matches(&["Resep rendang", "Dapur Nusantara", "masak enak"]));
    }

    #[test]
    fn keywords_are_normalized() {
        let f = RelevanceFilter::new([" Tafsir ", "", "tafsir"]);
        assert_eq!(f.keywords(), &["tafsir".to_string()]);
    }

    #[test]
    fn empty_filter_accepts_everything() {
        assert!(RelevanceFilter::accept_all().matches(&["anything"]));
        assert!(RelevanceFilter::new(Vec::<String>::new()).matches(&["x"]));
    }
}
