//! Twitter status URL extraction.

use crate::config::Limit;
use regex::Regex;
use std::sync::LazyLock;

/// `http(s)://[mobile.]twitter.com/<handle>/status/<digits>`. The handle is
/// not validated beyond being a single non-empty path segment.
static STATUS_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https?://(?:mobile\.)?twitter\.com/[^/\s]+/status/([0-9]+)")
        .expect("hardcoded regex is valid")
});

/// Extract post ids from free-form text in order of first appearance,
/// skipping repeats and stopping once `limit` ids were found.
pub fn extract_post_ids(text: &str, limit: Limit) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();

    for captures in STATUS_URL.captures_iter(text) {
        if !limit.allows(ids.len() as u32) {
            break;
        }
        let id = &captures[1];
        if ids.iter().any(|seen| seen == id) {
            continue;
        }
        ids.push(id.to_string());
    }

    ids
}

/// Canonical URL for a post.
pub fn status_url(username: &str, post_id: &str) -> String {
    format!("https://twitter.com/{username}/status/{post_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_single_id() {
        let ids = extract_post_ids("see https://twitter.com/alice/status/111", Limit::Unlimited);
        assert_eq!(ids, vec!["111"]);
    }

    #[test]
    fn keeps_left_to_right_order() {
        let text = "https://twitter.com/a/status/3 then http://mobile.twitter.com/b/status/1 \
                    and https://mobile.twitter.com/c/status/2?s=20";
        assert_eq!(extract_post_ids(text, Limit::Unlimited), vec!["3", "1", "2"]);
    }

    #[test]
    fn adjacent_urls_are_extracted_independently() {
        let text = "https://twitter.com/a/status/10https://twitter.com/b/status/20";
        assert_eq!(extract_post_ids(text, Limit::Unlimited), vec!["10", "20"]);
    }

    #[test]
    fn caps_at_limit() {
        let text = "https://twitter.com/a/status/1 https://twitter.com/a/status/2 \
                    https://twitter.com/a/status/3";
        assert_eq!(extract_post_ids(text, Limit::Max(2)), vec!["1", "2"]);
        assert_eq!(extract_post_ids(text, Limit::Max(1)), vec!["1"]);
    }

    #[test]
    fn repeats_are_reported_once() {
        let text = "https://twitter.com/a/status/7 https://twitter.com/b/status/7 \
                    https://twitter.com/c/status/8";
        assert_eq!(extract_post_ids(text, Limit::Max(2)), vec!["7", "8"]);
    }

    #[test]
    fn ignores_non_matching_urls() {
        let text = "https://example.com/a/status/1 \
                    https://twitter.com/a/likes/2 \
                    https://twitter.com/a/status/abc \
                    ftp://twitter.com/a/status/3 \
                    https://twitter.com//status/4 \
                    https://www.twitter.com/a/status/5 \
                    twitter.com/a/status/6";
        assert!(extract_post_ids(text, Limit::Unlimited).is_empty());
    }

    #[test]
    fn empty_text_yields_nothing() {
        assert!(extract_post_ids("", Limit::Max(5)).is_empty());
    }

    #[test]
    fn builds_status_url() {
        assert_eq!(status_url("bob", "222"), "https://twitter.com/bob/status/222");
    }
}
