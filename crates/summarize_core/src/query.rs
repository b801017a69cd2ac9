use std::sync::LazyLock;

use anyhow::{Result, bail};
use regex::Regex;
use serde::Deserialize;

use crate::canonical::{canonicalize_reference, collapse_whitespace};

/// Placeholder token in a query command that is replaced with the
/// organization name at run time.
pub const OWNER_PLACEHOLDER: &str = "__OWNER_PLACEHOLDER__";

static ITEM_URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https://github\.com/(?P<owner>[^/\s]+)/(?P<repo>[^/\s]+)/").expect("item url regex")
});

/// One named `gh` search bound to a heading and formatting rules.
/// Pure static data; the catalog is fixed at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Query {
    pub slug: &'static str,
    pub heading: &'static str,
    pub command: &'static [&'static str],
    pub imperative_template: &'static str,
    pub empty_message: &'static str,
}

/// An issue or pull request as returned by `gh search --json`.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct SearchItem {
    pub number: Option<u64>,
    #[serde(default)]
    pub title: String,
    pub url: Option<String>,
    pub repository: Option<ItemRepository>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ItemRepository {
    pub name_with_owner: Option<String>,
    pub name: Option<String>,
    pub owner: Option<RepositoryOwner>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RepositoryOwner {
    pub login: Option<String>,
}

impl SearchItem {
    /// `owner/repo` slug, preferring the structured repository field and
    /// falling back to the item URL, else `"unknown"`.
    pub fn repo_slug(&self) -> String {
        if let Some(repository) = &self.repository {
            if let Some(name_with_owner) = repository
                .name_with_owner
                .as_deref()
                .filter(|slug| !slug.is_empty())
            {
                return name_with_owner.to_string();
            }
            let login = repository
                .owner
                .as_ref()
                .and_then(|owner| owner.login.as_deref())
                .filter(|login| !login.is_empty());
            let name = repository.name.as_deref().filter(|name| !name.is_empty());
            if let (Some(login), Some(name)) = (login, name) {
                return format!("{login}/{name}");
            }
        }
        if let Some(url) = self.url.as_deref() {
            if let Some(captures) = ITEM_URL_PATTERN.captures(url) {
                return format!("{}/{}", &captures["owner"], &captures["repo"]);
            }
        }
        "unknown".to_string()
    }
}

impl Query {
    /// Render one item into its (canonical key, checklist line) pair.
    pub fn format_entry(&self, item: &SearchItem) -> Result<(String, String)> {
        let (Some(number), Some(url)) = (item.number, item.url.as_deref().filter(|u| !u.is_empty()))
        else {
            bail!(
                "Query `{}` returned an item missing `number` or `url`: {:?} {:?}",
                self.slug,
                item.number,
                item.url
            );
        };
        let title = collapse_whitespace(item.title.trim());
        let repository = item.repo_slug();
        let link = format!("[{repository}#{number} {title}]({url})");
        let canonical = canonicalize_reference(Some(url), &repository, number);
        let line = self.imperative_template.replace("{link}", &link);
        Ok((canonical, line))
    }
}

/// The fixed query catalog, in document order.
pub fn catalog() -> &'static [Query] {
    &[
        Query {
            slug: "assigned-issues",
            heading: "Assigned Issues",
            command: &[
                "gh",
                "search",
                "issues",
                "--owner",
                OWNER_PLACEHOLDER,
                "--assignee",
                "@me",
                "--state",
                "open",
                "--json",
                "number,title,url,repository",
                "--limit",
                "50",
            ],
            imperative_template: "Triage {link}.",
            empty_message: "Confirm no assigned issues need attention.",
        },
        Query {
            slug: "review-requests",
            heading: "PR Review Requests",
            command: &[
                "gh",
                "search",
                "prs",
                "--owner",
                OWNER_PLACEHOLDER,
                "--review-requested",
                "@me",
                "--state",
                "open",
                "--json",
                "number,title,url,repository",
                "--limit",
                "50",
            ],
            imperative_template: "Review {link}.",
            empty_message: "Confirm no outstanding review requests.",
        },
        Query {
            slug: "authored-prs",
            heading: "Authored PRs",
            command: &[
                "gh",
                "search",
                "prs",
                "--owner",
                OWNER_PLACEHOLDER,
                "--author",
                "@me",
                "--state",
                "open",
                "--json",
                "number,title,url,repository",
                "--limit",
                "50",
            ],
            imperative_template: "Follow up on {link}.",
            empty_message: "Confirm no authored PRs require action.",
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(json: &str) -> SearchItem {
        serde_json::from_str(json).expect("item json")
    }

    #[test]
    fn catalog_is_stable() {
        let queries = catalog();
        assert_eq!(queries.len(), 3);
        assert_eq!(queries[0].slug, "assigned-issues");
        assert_eq!(queries[1].slug, "review-requests");
        assert_eq!(queries[2].slug, "authored-prs");
        for query in queries {
            assert!(query.command.contains(&OWNER_PLACEHOLDER));
            assert!(query.imperative_template.contains("{link}"));
        }
    }

    #[test]
    fn format_entry_renders_markdown_link() {
        let query = catalog()[0];
        let item = item(
            r#"{"number":7,"title":"Fix bug","url":"https://github.com/acme/repo/issues/7","repository":{"nameWithOwner":"acme/repo"}}"#,
        );
        let (canonical, line) = query.format_entry(&item).expect("format");
        assert_eq!(canonical, "https://github.com/acme/repo/issues/7");
        assert_eq!(
            line,
            "Triage [acme/repo#7 Fix bug](https://github.com/acme/repo/issues/7)."
        );
    }

    #[test]
    fn format_entry_collapses_title_whitespace() {
        let query = catalog()[1];
        let item = item(
            r#"{"number":12,"title":"  Fix \t the   parser ","url":"https://github.com/acme/repo/pull/12"}"#,
        );
        let (_, line) = query.format_entry(&item).expect("format");
        assert_eq!(
            line,
            "Review [acme/repo#12 Fix the parser](https://github.com/acme/repo/pull/12)."
        );
    }

    #[test]
    fn format_entry_rejects_missing_fields() {
        let query = catalog()[0];
        let missing_url = item(r#"{"number":7,"title":"Fix bug"}"#);
        let error = query.format_entry(&missing_url).expect_err("must fail");
        assert!(error.to_string().contains("assigned-issues"));

        let missing_number =
            item(r#"{"title":"Fix bug","url":"https://github.com/acme/repo/issues/7"}"#);
        assert!(query.format_entry(&missing_number).is_err());
    }

    #[test]
    fn repo_slug_prefers_structured_field() {
        let from_field = item(
            r#"{"url":"https://github.com/other/place/issues/1","repository":{"nameWithOwner":"acme/repo"}}"#,
        );
        assert_eq!(from_field.repo_slug(), "acme/repo");

        let from_parts = item(
            r#"{"repository":{"name":"repo","owner":{"login":"acme"}}}"#,
        );
        assert_eq!(from_parts.repo_slug(), "acme/repo");

        let from_url = item(r#"{"url":"https://github.com/acme/repo/pull/3"}"#);
        assert_eq!(from_url.repo_slug(), "acme/repo");

        assert_eq!(SearchItem::default().repo_slug(), "unknown");
    }
}
