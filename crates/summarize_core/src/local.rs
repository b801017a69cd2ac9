use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;

use crate::store::{ChecklistRecord, ChecklistStore};
use crate::todo_title_for;

static DATED_FILE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}\.md$").expect("dated file regex"));

/// Daily checklists persisted as `<tasks_dir>/<date>.md` files.
///
/// Filenames are ISO dates, so lexicographic order equals chronological
/// order. Files have no open/closed lifecycle: `supersede` and `reopen`
/// are no-ops and every record reads as open.
#[derive(Debug, Clone)]
pub struct LocalStore {
    tasks_dir: PathBuf,
}

impl LocalStore {
    pub fn new(tasks_dir: impl Into<PathBuf>) -> Self {
        Self {
            tasks_dir: tasks_dir.into(),
        }
    }

    fn path_for(&self, date: &str) -> PathBuf {
        self.tasks_dir.join(format!("{date}.md"))
    }

    fn load(&self, path: &Path, date: &str) -> Result<ChecklistRecord> {
        let body = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Ok(ChecklistRecord {
            number: None,
            title: todo_title_for(date),
            body,
            url: path.display().to_string(),
            created_at: date.to_string(),
            open: true,
        })
    }

    /// Dated filenames in the tasks directory, newest first.
    fn dates_descending(&self) -> Result<Vec<String>> {
        if !self.tasks_dir.exists() {
            return Ok(Vec::new());
        }
        let entries = fs::read_dir(&self.tasks_dir)
            .with_context(|| format!("failed to read {}", self.tasks_dir.display()))?;
        let mut dates = Vec::new();
        for entry in entries {
            let entry = entry
                .with_context(|| format!("failed to read {}", self.tasks_dir.display()))?;
            let name = entry.file_name().to_string_lossy().to_string();
            if DATED_FILE_PATTERN.is_match(&name) {
                dates.push(name.trim_end_matches(".md").to_string());
            }
        }
        dates.sort_by(|a, b| b.cmp(a));
        Ok(dates)
    }

    fn write(&self, date: &str, body: &str) -> Result<ChecklistRecord> {
        fs::create_dir_all(&self.tasks_dir)
            .with_context(|| format!("failed to create {}", self.tasks_dir.display()))?;
        let path = self.path_for(date);
        fs::write(&path, body).with_context(|| format!("failed to write {}", path.display()))?;
        self.load(&path, date)
    }
}

impl ChecklistStore for LocalStore {
    fn find_for_date(&self, date: &str) -> Result<Option<ChecklistRecord>> {
        let path = self.path_for(date);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(self.load(&path, date)?))
    }

    fn recent(&self, limit: usize) -> Result<Vec<ChecklistRecord>> {
        let mut records = Vec::new();
        for date in self.dates_descending()?.into_iter().take(limit) {
            records.push(self.load(&self.path_for(&date), &date)?);
        }
        Ok(records)
    }

    fn create(&self, date: &str, body: &str) -> Result<ChecklistRecord> {
        self.write(date, body)
    }

    fn update(&self, record: &ChecklistRecord, body: &str) -> Result<ChecklistRecord> {
        self.write(&record.created_at, body)
    }

    fn supersede(&self, _previous: &ChecklistRecord, _new_record: &ChecklistRecord) -> Result<()> {
        Ok(())
    }

    fn reopen(&self, _record: &ChecklistRecord) -> Result<()> {
        Ok(())
    }
}
