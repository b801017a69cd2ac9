use anyhow::Result;

/// One persisted daily checklist, from either backend.
///
/// `number` is set by the issue backend only; `url` is the issue URL or
/// the local file path. `created_at` is whatever the backend reports and
/// is informational only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecklistRecord {
    pub number: Option<u64>,
    pub title: String,
    pub body: String,
    pub url: String,
    pub created_at: String,
    pub open: bool,
}

impl ChecklistRecord {
    /// Identity check across lookups: issue number when both sides have
    /// one, title otherwise.
    pub fn same_as(&self, other: &ChecklistRecord) -> bool {
        match (self.number, other.number) {
            (Some(a), Some(b)) => a == b,
            _ => self.title == other.title,
        }
    }
}

/// Idempotent once-per-day persistence, shared by the hosted-issue and
/// local-file backends. `supersede` and `reopen` are no-ops for the local
/// backend, which has no open/closed lifecycle.
pub trait ChecklistStore {
    /// The record whose title is exactly `Todos for <date>`, if any.
    fn find_for_date(&self, date: &str) -> Result<Option<ChecklistRecord>>;

    /// Recognized checklist records, most recent first.
    fn recent(&self, limit: usize) -> Result<Vec<ChecklistRecord>>;

    fn create(&self, date: &str, body: &str) -> Result<ChecklistRecord>;

    fn update(&self, record: &ChecklistRecord, body: &str) -> Result<ChecklistRecord>;

    /// Close `previous` as superseded by `new_record`.
    fn supersede(&self, previous: &ChecklistRecord, new_record: &ChecklistRecord) -> Result<()>;

    fn reopen(&self, record: &ChecklistRecord) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(number: Option<u64>, title: &str) -> ChecklistRecord {
        ChecklistRecord {
            number,
            title: title.to_string(),
            body: String::new(),
            url: String::new(),
            created_at: String::new(),
            open: true,
        }
    }

    #[test]
    fn identity_prefers_numbers_over_titles() {
        assert!(record(Some(4), "a").same_as(&record(Some(4), "b")));
        assert!(!record(Some(4), "a").same_as(&record(Some(5), "a")));
        assert!(record(None, "Todos for 2026-08-30").same_as(&record(
            None,
            "Todos for 2026-08-30"
        )));
        assert!(!record(None, "a").same_as(&record(Some(4), "b")));
    }
}
