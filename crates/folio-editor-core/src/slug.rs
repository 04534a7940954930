//! URL slug derivation from document titles.

use std::sync::LazyLock;

use regex::Regex;

static DISALLOWED_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9_\s-]").unwrap());
static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static HYPHENS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-+").unwrap());

/// Derive a URL-safe slug: lowercase ASCII letters, digits, underscores and
/// single hyphens, never starting or ending with a hyphen.
pub fn slugify(title: &str) -> String {
    let lowered = title.to_lowercase();
    let stripped = DISALLOWED_RE.replace_all(lowered.trim(), "");
    let hyphenated = WHITESPACE_RE.replace_all(&stripped, "-");
    let collapsed = HYPHENS_RE.replace_all(&hyphenated, "-");
    collapsed.trim_matches('-').to_owned()
}

/// Keeps a slug in step with its title until the user takes it over.
///
/// Once the slug has been edited by hand and no longer matches what the
/// previous title would have produced, title changes stop touching it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlugTracker {
    slug: String,
    previous_title: String,
    manual: bool,
}

impl SlugTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume tracking for an existing title/slug pair. A slug that differs
    /// from the title's derivation counts as manually edited.
    pub fn resume(title: &str, slug: &str) -> Self {
        Self {
            slug: slug.to_owned(),
            previous_title: title.to_owned(),
            manual: !slug.is_empty() && slug != slugify(title),
        }
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn is_manual(&self) -> bool {
        self.manual
    }

    /// React to a title edit. Returns the slug after the change.
    pub fn on_title_changed(&mut self, title: &str) -> &str {
        let diverged = self.manual && self.slug != slugify(&self.previous_title);
        if title.trim().is_empty() {
            if !self.manual {
                self.slug.clear();
            }
        } else if !diverged {
            self.slug = slugify(title);
        }
        self.previous_title = title.to_owned();
        &self.slug
    }

    /// Record a hand edit of the slug.
    pub fn on_slug_edited(&mut self, slug: impl Into<String>) {
        self.slug = slug.into();
        self.manual = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_examples() {
        insta::assert_snapshot!(slugify("Hello, World!"), @"hello-world");
        insta::assert_snapshot!(slugify("  Rust   &  Tokio -- a tour  "), @"rust-tokio-a-tour");
        insta::assert_snapshot!(slugify("snake_case stays"), @"snake_case-stays");
        insta::assert_snapshot!(slugify("Café 2024"), @"caf-2024");
        assert_eq!(slugify("---"), "");
        assert_eq!(slugify(""), "");
    }

    #[test]
    fn test_slugify_output_alphabet() {
        let inputs = [
            "Ünïcödé title",
            "-leading and trailing-",
            "tabs\tand\nnewlines",
            "!!!",
            "a - - b",
            "  x  ",
        ];
        for input in inputs {
            let slug = slugify(input);
            assert!(
                slug.chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-'),
                "{slug:?}"
            );
            assert!(!slug.contains("--"), "{slug:?}");
            assert!(!slug.starts_with('-') && !slug.ends_with('-'), "{slug:?}");
        }
    }

    #[test]
    fn test_tracker_follows_title() {
        let mut tracker = SlugTracker::new();
        assert_eq!(tracker.on_title_changed("First Post"), "first-post");
        assert_eq!(tracker.on_title_changed("First Post, revised"), "first-post-revised");
        assert_eq!(tracker.on_title_changed(""), "");
    }

    #[test]
    fn test_manual_slug_survives_title_changes() {
        let mut tracker = SlugTracker::new();
        tracker.on_title_changed("Draft");
        tracker.on_slug_edited("custom");
        assert_eq!(tracker.on_title_changed("Draft two"), "custom");
        assert_eq!(tracker.on_title_changed(""), "custom");
    }

    #[test]
    fn test_manual_slug_matching_title_keeps_following() {
        let mut tracker = SlugTracker::new();
        tracker.on_title_changed("Same");
        tracker.on_slug_edited("same");
        assert_eq!(tracker.on_title_changed("Same again"), "same-again");
    }

    #[test]
    fn test_resume_detects_custom_slug() {
        assert!(SlugTracker::resume("A Title", "elsewhere").is_manual());
        assert!(!SlugTracker::resume("A Title", "a-title").is_manual());
        assert!(!SlugTracker::resume("A Title", "").is_manual());
    }
}
