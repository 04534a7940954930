//! Draft/published id convention.
//!
//! A draft shares its logical identity with the published document; only the
//! id differs, by the `drafts.` prefix.

/// Prefix that marks a document id as a draft.
pub const DRAFTS_PREFIX: &str = "drafts.";

/// Whether `id` names a draft.
pub fn is_draft(id: &str) -> bool {
    id.starts_with(DRAFTS_PREFIX)
}

/// The draft id for a document, whichever form `id` is in.
pub fn draft_id(id: &str) -> String {
    if is_draft(id) {
        id.to_owned()
    } else {
        format!("{DRAFTS_PREFIX}{id}")
    }
}

/// The published (canonical) id for a document, whichever form `id` is in.
pub fn published_id(id: &str) -> String {
    id.strip_prefix(DRAFTS_PREFIX).unwrap_or(id).to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_conversions() {
        assert_eq!(draft_id("abc"), "drafts.abc");
        assert_eq!(draft_id("drafts.abc"), "drafts.abc");
        assert_eq!(published_id("drafts.abc"), "abc");
        assert_eq!(published_id("abc"), "abc");
        assert!(is_draft("drafts.abc"));
        assert!(!is_draft("abc"));
    }
}
