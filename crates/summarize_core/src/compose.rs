use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::aggregate::OrgSections;
use crate::canonical::canonicalize_line;

/// Render the full checklist document.
///
/// Document order decides deduplication precedence: carry-over seeds the
/// seen set, then configured organizations in configured order, then any
/// organization present in the results but not configured. The rendered
/// body ends with exactly one trailing newline.
pub fn compose_checklist(
    today: &str,
    now_utc: DateTime<Utc>,
    carryover: &[String],
    organizations: &[String],
    sections: &[OrgSections],
) -> String {
    let mut lines: Vec<String> = Vec::new();
    lines.push(format!("# Todos — {today}"));
    lines.push(String::new());
    lines.push(format!(
        "_Generated {} UTC via `summarize`._",
        now_utc.format("%Y-%m-%d %H:%M")
    ));
    lines.push(String::new());

    let mut seen_items: HashSet<String> = HashSet::new();
    let mut deduped_carryover: Vec<&str> = Vec::new();
    for item in carryover {
        if seen_items.insert(canonicalize_line(item)) {
            deduped_carryover.push(item);
        }
    }
    if !deduped_carryover.is_empty() {
        lines.push("## Carryover from Previous List".to_string());
        for item in deduped_carryover {
            lines.push(format!("- [ ] {item}"));
        }
        lines.push(String::new());
    }

    for organization in ordered_organizations(organizations, sections) {
        let org_sections = sections
            .iter()
            .find(|candidate| candidate.organization == organization)
            .map(|candidate| candidate.sections.as_slice())
            .unwrap_or_default();
        lines.push(format!("## {organization} Todos"));
        lines.push(String::new());
        if org_sections.is_empty() {
            lines.push("- [ ] Confirm no actionable items today.".to_string());
            lines.push(String::new());
            continue;
        }
        for section in org_sections {
            let mut filtered: Vec<&str> = Vec::new();
            for (canonical, line) in &section.entries {
                let canonical_id = if canonical.is_empty() {
                    canonicalize_line(line)
                } else {
                    canonical.clone()
                };
                if seen_items.insert(canonical_id) {
                    filtered.push(line);
                }
            }
            lines.push(format!("### {}", section.query.heading));
            if filtered.is_empty() {
                lines.push(format!("- [ ] {}", section.query.empty_message));
            } else {
                for line in filtered {
                    lines.push(format!("- [ ] {line}"));
                }
            }
            lines.push(String::new());
        }
    }

    let mut body = lines.join("\n");
    body.truncate(body.trim_end().len());
    body.push('\n');
    body
}

/// Configured organizations first, then unconfigured ones in insertion
/// order, without duplicates.
fn ordered_organizations(organizations: &[String], sections: &[OrgSections]) -> Vec<String> {
    let mut ordered: Vec<String> = Vec::new();
    for name in organizations
        .iter()
        .chain(sections.iter().map(|section| &section.organization))
    {
        if !ordered.contains(name) {
            ordered.push(name.clone());
        }
    }
    ordered
}
