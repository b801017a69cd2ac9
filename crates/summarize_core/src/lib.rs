pub mod aggregate;
pub mod canonical;
pub mod compose;
pub mod config;
pub mod local;
pub mod query;
pub mod remote;
pub mod runner;
pub mod store;
pub mod workflow;

/// Title prefix of checklists generated by the current tool version.
pub const TODOS_TITLE_PREFIX: &str = "Todos for ";

/// Title prefixes written by earlier versions; still recognized so the
/// aggregator skips them and the previous-checklist lookup finds them.
pub const LEGACY_TODOS_PREFIXES: &[&str] = &["Daily Todos for "];

pub fn is_todo_title(title: &str) -> bool {
    title.starts_with(TODOS_TITLE_PREFIX)
        || LEGACY_TODOS_PREFIXES
            .iter()
            .any(|prefix| title.starts_with(prefix))
}

pub fn todo_title_for(date: &str) -> String {
    format!("{TODOS_TITLE_PREFIX}{date}")
}

/// The ISO date carried in a recognized checklist title, if any.
pub fn date_from_todo_title(title: &str) -> Option<&str> {
    let date = title.strip_prefix(TODOS_TITLE_PREFIX).or_else(|| {
        LEGACY_TODOS_PREFIXES
            .iter()
            .find_map(|prefix| title.strip_prefix(prefix))
    })?;
    let date = date.trim();
    (!date.is_empty()).then_some(date)
}
