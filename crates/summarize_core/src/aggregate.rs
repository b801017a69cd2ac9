use std::collections::HashSet;

use anyhow::{Context, Result, bail};
use serde_json::Value;

use crate::is_todo_title;
use crate::query::{OWNER_PLACEHOLDER, Query, SearchItem, catalog};

/// One query's formatted `(canonical key, line)` entries for one
/// organization, in (repo slug, number) order.
#[derive(Debug, Clone)]
pub struct QuerySection {
    pub query: Query,
    pub entries: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
pub struct OrgSections {
    pub organization: String,
    pub sections: Vec<QuerySection>,
}

/// Substitute the organization into a query command: fill the placeholder
/// token when present, else append an `--owner` flag.
pub fn build_command_for_org(command: &[&str], organization: &str) -> Vec<String> {
    let mut argv: Vec<String> = command.iter().map(|token| token.to_string()).collect();
    match argv.iter().position(|token| token == OWNER_PLACEHOLDER) {
        Some(index) => argv[index] = organization.to_string(),
        None => {
            argv.push("--owner".to_string());
            argv.push(organization.to_string());
        }
    }
    argv
}

/// Generated checklists must never track themselves.
fn is_automation_item(item: &SearchItem) -> bool {
    is_todo_title(item.title.trim())
}

/// Run every catalog query once per organization and return the formatted
/// sections in configured-organization order.
///
/// The runner is injected so tests can feed canned `gh` output. Any single
/// failure aborts the whole collection.
pub fn collect_sections(
    organizations: &[String],
    run: impl Fn(&[String]) -> Result<String>,
) -> Result<Vec<OrgSections>> {
    let mut aggregated: Vec<OrgSections> = organizations
        .iter()
        .map(|organization| OrgSections {
            organization: organization.clone(),
            sections: Vec::new(),
        })
        .collect();
    for query in catalog() {
        let items_by_org = run_query(query, organizations, &run)
            .with_context(|| format!("Unable to complete query '{}'.", query.slug))?;
        for (org_sections, mut items) in aggregated.iter_mut().zip(items_by_org) {
            items.sort_by(|a, b| {
                (a.repo_slug().to_lowercase(), a.number.unwrap_or(0))
                    .cmp(&(b.repo_slug().to_lowercase(), b.number.unwrap_or(0)))
            });
            let entries = items
                .iter()
                .map(|item| query.format_entry(item))
                .collect::<Result<Vec<_>>>()?;
            org_sections.sections.push(QuerySection {
                query: *query,
                entries,
            });
        }
    }
    Ok(aggregated)
}

/// One query across all organizations. URL dedup is shared across the
/// whole query run (exact, case-sensitive); organizations stay separate
/// partitions otherwise.
fn run_query(
    query: &Query,
    organizations: &[String],
    run: &impl Fn(&[String]) -> Result<String>,
) -> Result<Vec<Vec<SearchItem>>> {
    let mut items_by_org: Vec<Vec<SearchItem>> = vec![Vec::new(); organizations.len()];
    let mut seen_urls: HashSet<String> = HashSet::new();
    for (organization, kept) in organizations.iter().zip(items_by_org.iter_mut()) {
        let argv = build_command_for_org(query.command, organization);
        let stdout = run(&argv)?;
        let data: Value = serde_json::from_str(&stdout).with_context(|| {
            format!(
                "Failed to parse JSON from query `{}` for org `{organization}`.",
                query.slug
            )
        })?;
        let Value::Array(raw_items) = data else {
            bail!(
                "Unexpected JSON structure from query `{}` for org `{organization}`: {}",
                query.slug,
                json_type_name(&data)
            );
        };
        for raw_item in raw_items {
            let item: SearchItem = serde_json::from_value(raw_item).with_context(|| {
                format!(
                    "Malformed item from query `{}` for org `{organization}`.",
                    query.slug
                )
            })?;
            if is_automation_item(&item) {
                continue;
            }
            let Some(url) = item.url.clone().filter(|url| !url.is_empty()) else {
                continue;
            };
            if !seen_urls.insert(url) {
                continue;
            }
            kept.push(item);
        }
    }
    Ok(items_by_org)
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn orgs(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    /// Canned runner keyed by the substituted `--owner` value; every
    /// query slug serves the same payload for simplicity.
    fn canned(
        by_org: HashMap<&'static str, &'static str>,
    ) -> impl Fn(&[String]) -> Result<String> {
        move |argv| {
            let owner = argv
                .iter()
                .position(|token| token == "--owner")
                .map(|index| argv[index + 1].as_str())
                .expect("owner flag");
            Ok(by_org.get(owner).copied().unwrap_or("[]").to_string())
        }
    }

    #[test]
    fn placeholder_is_filled_in_place() {
        let argv = build_command_for_org(&["gh", "search", "--owner", OWNER_PLACEHOLDER], "Acme");
        assert_eq!(argv, vec!["gh", "search", "--owner", "Acme"]);
    }

    #[test]
    fn owner_flag_is_appended_when_no_placeholder() {
        let argv = build_command_for_org(&["gh", "search"], "Acme");
        assert_eq!(argv, vec!["gh", "search", "--owner", "Acme"]);
    }

    #[test]
    fn skips_generated_checklists_and_duplicate_urls() {
        let payload = r#"[
            {"number":1,"title":"Todos for 2026-08-29","url":"https://github.com/acme/status/issues/90"},
            {"number":2,"title":"Daily Todos for 2026-08-01","url":"https://github.com/acme/status/issues/40"},
            {"number":7,"title":"Fix bug","url":"https://github.com/acme/repo/issues/7"},
            {"number":7,"title":"Fix bug","url":"https://github.com/acme/repo/issues/7"},
            {"number":9,"title":"No url at all"}
        ]"#;
        let sections = collect_sections(
            &orgs(&["Acme"]),
            canned(HashMap::from([("Acme", payload)])),
        )
        .expect("collect");
        assert_eq!(sections.len(), 1);
        for section in &sections[0].sections {
            assert_eq!(section.entries.len(), 1, "query {}", section.query.slug);
            assert!(section.entries[0].1.contains("acme/repo#7"));
        }
    }

    #[test]
    fn url_dedup_spans_organizations_within_one_query() {
        let shared =
            r#"[{"number":7,"title":"Fix bug","url":"https://github.com/acme/repo/issues/7"}]"#;
        let sections = collect_sections(
            &orgs(&["Acme", "Globex"]),
            canned(HashMap::from([("Acme", shared), ("Globex", shared)])),
        )
        .expect("collect");
        assert_eq!(sections[0].sections[0].entries.len(), 1);
        assert!(sections[1].sections[0].entries.is_empty());
    }

    #[test]
    fn items_sort_by_repo_slug_then_number() {
        let payload = r#"[
            {"number":20,"title":"B","url":"https://github.com/acme/zeta/issues/20","repository":{"nameWithOwner":"acme/zeta"}},
            {"number":5,"title":"C","url":"https://github.com/acme/Alpha/issues/5","repository":{"nameWithOwner":"acme/Alpha"}},
            {"number":2,"title":"A","url":"https://github.com/acme/alpha/issues/2","repository":{"nameWithOwner":"acme/alpha"}}
        ]"#;
        let sections = collect_sections(
            &orgs(&["Acme"]),
            canned(HashMap::from([("Acme", payload)])),
        )
        .expect("collect");
        let lines: Vec<&str> = sections[0].sections[0]
            .entries
            .iter()
            .map(|(_, line)| line.as_str())
            .collect();
        assert!(lines[0].contains("#2"));
        assert!(lines[1].contains("#5"));
        assert!(lines[2].contains("#20"));
    }

    #[test]
    fn non_array_payload_is_fatal() {
        let error = collect_sections(
            &orgs(&["Acme"]),
            canned(HashMap::from([("Acme", r#"{"items":[]}"#)])),
        )
        .expect_err("must fail");
        let chain = format!("{error:#}");
        assert!(chain.contains("Unable to complete query 'assigned-issues'."));
        assert!(chain.contains("Unexpected JSON structure"));
        assert!(chain.contains("object"));
    }

    #[test]
    fn malformed_json_is_fatal() {
        let error = collect_sections(
            &orgs(&["Acme"]),
            canned(HashMap::from([("Acme", "not json")])),
        )
        .expect_err("must fail");
        assert!(format!("{error:#}").contains("Failed to parse JSON"));
    }
}
