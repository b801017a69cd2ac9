use std::sync::LazyLock;

use regex::Regex;

static CHECKBOX_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[-*]\s*\[\s*([xX ])\s*\]\s*(.+)$").expect("checkbox regex"));
static GITHUB_URL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https://github\.com/[^\s)]+").expect("github url regex"));
static REPO_REF_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z0-9_.-]+/[A-Za-z0-9_.-]+#[0-9]+").expect("repo ref regex")
});

/// Normalize a URL for deduplication: trailing slash stripped, lowercased.
pub fn canonicalize_url(url: &str) -> String {
    url.trim_end_matches('/').to_lowercase()
}

/// Deduplication identity for a queried item: the canonical URL when one
/// exists, else `owner/repo#number` lowercased.
pub fn canonicalize_reference(url: Option<&str>, repository: &str, number: u64) -> String {
    if let Some(url) = url {
        let normalized = canonicalize_url(url);
        if !normalized.is_empty() {
            return normalized;
        }
    }
    format!("{}#{number}", repository.to_lowercase())
}

/// Deduplication identity for a free-form checklist line.
///
/// Carry-over text may retain a markdown link, a bare `owner/repo#n`
/// reference, or neither, so identity falls back through whatever signal
/// survived formatting: embedded GitHub URL, then repo reference, then the
/// whitespace-collapsed lowercased line itself.
pub fn canonicalize_line(line: &str) -> String {
    if let Some(url) = GITHUB_URL_PATTERN.find(line) {
        return canonicalize_url(url.as_str());
    }
    if let Some(reference) = REPO_REF_PATTERN.find(line) {
        return reference.as_str().to_lowercase();
    }
    collapse_whitespace(line).to_lowercase()
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Unchecked checkbox lines from a checklist body, trimmed, in order.
pub fn extract_unfinished_items(body: &str) -> Vec<String> {
    let mut carryover = Vec::new();
    for line in body.lines() {
        let Some(captures) = CHECKBOX_PATTERN.captures(line) else {
            continue;
        };
        if !captures[1].eq_ignore_ascii_case("x") {
            carryover.push(captures[2].trim().to_string());
        }
    }
    carryover
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_canonicalization_strips_slash_and_case() {
        assert_eq!(
            canonicalize_url("https://GitHub.com/Acme/Repo/issues/7/"),
            "https://github.com/acme/repo/issues/7"
        );
    }

    #[test]
    fn canonicalization_is_idempotent() {
        let once = canonicalize_line("- Review [acme/Repo#9 Fix](https://github.com/acme/Repo/pull/9/)");
        assert_eq!(canonicalize_line(&once), once);
        let url = canonicalize_url("https://github.com/a/b/");
        assert_eq!(canonicalize_url(&url), url);
    }

    #[test]
    fn reference_prefers_url_over_repo_number() {
        assert_eq!(
            canonicalize_reference(Some("https://github.com/Acme/repo/pull/3/"), "Acme/repo", 3),
            "https://github.com/acme/repo/pull/3"
        );
        assert_eq!(canonicalize_reference(None, "Acme/Repo", 3), "acme/repo#3");
        assert_eq!(canonicalize_reference(Some(""), "Acme/Repo", 3), "acme/repo#3");
    }

    #[test]
    fn line_identity_falls_back_three_ways() {
        assert_eq!(
            canonicalize_line("Review [x](https://github.com/Acme/repo/pull/5/) today"),
            "https://github.com/acme/repo/pull/5"
        );
        assert_eq!(
            canonicalize_line("Follow up on Acme/Repo#12 when CI is green"),
            "acme/repo#12"
        );
        assert_eq!(
            canonicalize_line("  Ping   the   Release team "),
            "ping the release team"
        );
    }

    #[test]
    fn extracts_only_unchecked_items() {
        let body = "# Todos\n- [ ] Foo\n- [x] Bar\n* [ ] Baz\n- [X] Done\nplain line\n";
        assert_eq!(extract_unfinished_items(body), vec!["Foo", "Baz"]);
    }

    #[test]
    fn tolerates_spacing_inside_checkboxes() {
        let body = "-  [  ]  Loose spacing\n- [ x ] Finished\n";
        assert_eq!(extract_unfinished_items(body), vec!["Loose spacing"]);
    }
}
