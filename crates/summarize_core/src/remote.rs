use std::io::Write;
use std::sync::LazyLock;

use anyhow::{Context, Result, bail};
use regex::Regex;
use serde::Deserialize;
use tempfile::NamedTempFile;

use crate::runner::run_command;
use crate::store::{ChecklistRecord, ChecklistStore};
use crate::{is_todo_title, todo_title_for};

static ISSUE_URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https://github\.com/[^/\s]+/[^/\s]+/issues/(?P<number>\d+)")
        .expect("issue url regex")
});

/// Daily checklists persisted as issues in one `owner/repo`, driven
/// through the `gh` CLI.
#[derive(Debug, Clone)]
pub struct IssueStore {
    repository: String,
}

#[derive(Debug, Deserialize)]
struct GhIssue {
    number: u64,
    title: String,
    #[serde(default)]
    body: String,
    url: String,
    #[serde(rename = "createdAt", default)]
    created_at: String,
    #[serde(default)]
    state: String,
}

impl From<GhIssue> for ChecklistRecord {
    fn from(issue: GhIssue) -> Self {
        ChecklistRecord {
            number: Some(issue.number),
            title: issue.title,
            body: issue.body,
            url: issue.url,
            created_at: issue.created_at,
            open: issue.state.eq_ignore_ascii_case("open"),
        }
    }
}

impl IssueStore {
    pub fn new(repository: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
        }
    }

    fn list_by_title(&self, needle: &str, limit: usize) -> Result<Vec<ChecklistRecord>> {
        let argv = argv(&[
            "gh",
            "issue",
            "list",
            "--repo",
            &self.repository,
            "--state",
            "all",
            "--limit",
            &limit.to_string(),
            "--json",
            "number,title,body,url,createdAt,state",
            "--search",
            &format!("\"{needle}\" in:title sort:created-desc"),
        ]);
        let stdout = run_command(&argv)?;
        parse_issue_list(&stdout)
            .with_context(|| format!("Unexpected issue list output for search `{needle}`."))
    }

    fn issue_number(record: &ChecklistRecord) -> Result<u64> {
        record
            .number
            .with_context(|| format!("Checklist `{}` has no issue number.", record.title))
    }

    fn fallback_url(&self, number: u64) -> String {
        format!(
            "https://github.com/{}/issues/{number}",
            self.repository.trim_matches('/')
        )
    }
}

impl ChecklistStore for IssueStore {
    fn find_for_date(&self, date: &str) -> Result<Option<ChecklistRecord>> {
        let title = todo_title_for(date);
        // Issue search matches substrings; only an exact title counts.
        let issues = self.list_by_title(&title, 20)?;
        Ok(issues.into_iter().find(|issue| issue.title == title))
    }

    fn recent(&self, limit: usize) -> Result<Vec<ChecklistRecord>> {
        let issues = self.list_by_title("Todos", limit)?;
        Ok(issues
            .into_iter()
            .filter(|issue| is_todo_title(&issue.title))
            .collect())
    }

    fn create(&self, date: &str, body: &str) -> Result<ChecklistRecord> {
        let title = todo_title_for(date);
        let body_file = write_body_file(body)?;
        let stdout = run_command(&argv(&[
            "gh",
            "issue",
            "create",
            "--repo",
            &self.repository,
            "--title",
            &title,
            "--body-file",
            &body_file.path().to_string_lossy(),
        ]))?;
        let Some((number, url)) = extract_issue_reference(&stdout) else {
            bail!(
                "gh issue create succeeded but did not return an issue URL. Please update the GitHub CLI to a recent version."
            );
        };
        Ok(ChecklistRecord {
            number: Some(number),
            title,
            body: body.to_string(),
            url,
            created_at: String::new(),
            open: true,
        })
    }

    fn update(&self, record: &ChecklistRecord, body: &str) -> Result<ChecklistRecord> {
        let number = Self::issue_number(record)?;
        let body_file = write_body_file(body)?;
        let stdout = run_command(&argv(&[
            "gh",
            "issue",
            "edit",
            &number.to_string(),
            "--repo",
            &self.repository,
            "--title",
            &record.title,
            "--body-file",
            &body_file.path().to_string_lossy(),
        ]))?;
        let url = extract_issue_reference(&stdout)
            .map(|(_, url)| url)
            .unwrap_or_else(|| self.fallback_url(number));
        Ok(ChecklistRecord {
            body: body.to_string(),
            url,
            ..record.clone()
        })
    }

    fn supersede(&self, previous: &ChecklistRecord, new_record: &ChecklistRecord) -> Result<()> {
        let number = Self::issue_number(previous)?;
        run_command(&argv(&[
            "gh",
            "issue",
            "close",
            &number.to_string(),
            "--repo",
            &self.repository,
            "--comment",
            &format!("Superseded by {}", new_record.url),
        ]))?;
        Ok(())
    }

    fn reopen(&self, record: &ChecklistRecord) -> Result<()> {
        let number = Self::issue_number(record)?;
        run_command(&argv(&[
            "gh",
            "issue",
            "reopen",
            &number.to_string(),
            "--repo",
            &self.repository,
        ]))?;
        Ok(())
    }
}

fn argv(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|part| part.to_string()).collect()
}

fn parse_issue_list(stdout: &str) -> Result<Vec<ChecklistRecord>> {
    let issues: Vec<GhIssue> = serde_json::from_str(stdout)?;
    Ok(issues.into_iter().map(ChecklistRecord::from).collect())
}

/// `gh` reads long bodies more reliably from a file than from an argument.
fn write_body_file(body: &str) -> Result<NamedTempFile> {
    let mut file = NamedTempFile::with_suffix(".md").context("failed to create body file")?;
    file.write_all(body.as_bytes())
        .context("failed to write body file")?;
    file.flush().context("failed to flush body file")?;
    Ok(file)
}

/// First issue URL in `gh` output, with its issue number.
pub fn extract_issue_reference(output: &str) -> Option<(u64, String)> {
    for line in output.lines() {
        if let Some(captures) = ISSUE_URL_PATTERN.captures(line.trim()) {
            let number = captures["number"].parse().ok()?;
            return Some((number, captures[0].to_string()));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_issue_reference_from_create_output() {
        let output = "Creating issue in acme/status\n\nhttps://github.com/acme/status/issues/123\n";
        assert_eq!(
            extract_issue_reference(output),
            Some((123, "https://github.com/acme/status/issues/123".to_string()))
        );
    }

    #[test]
    fn ignores_output_without_issue_urls() {
        assert_eq!(extract_issue_reference("nothing to see"), None);
        assert_eq!(
            extract_issue_reference("https://github.com/acme/status/pull/9"),
            None
        );
    }

    #[test]
    fn parses_issue_list_json() {
        let stdout = r#"[
            {"number":5,"title":"Todos for 2026-08-29","body":"- [ ] Foo","url":"https://github.com/acme/status/issues/5","createdAt":"2026-08-29T12:00:00Z","state":"OPEN"},
            {"number":3,"title":"Todos for 2026-08-28","url":"https://github.com/acme/status/issues/3","state":"CLOSED"}
        ]"#;
        let issues = parse_issue_list(stdout).expect("parse");
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].number, Some(5));
        assert_eq!(issues[0].body, "- [ ] Foo");
        assert!(issues[0].open);
        assert_eq!(issues[1].body, "");
        assert!(!issues[1].open);
    }

    #[test]
    fn malformed_issue_list_is_an_error() {
        assert!(parse_issue_list("not json").is_err());
        assert!(parse_issue_list(r#"{"number":5}"#).is_err());
    }

    #[test]
    fn body_file_holds_the_rendered_document() {
        let file = write_body_file("# Todos\n").expect("body file");
        let contents = std::fs::read_to_string(file.path()).expect("read back");
        assert_eq!(contents, "# Todos\n");
    }
}
