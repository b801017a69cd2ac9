use anyhow::{Result, bail};
use chrono::{DateTime, Utc};
use chrono_tz::America::New_York;
use chrono_tz::Tz;

use crate::aggregate::collect_sections;
use crate::canonical::extract_unfinished_items;
use crate::compose::compose_checklist;
use crate::config::Config;
use crate::store::{ChecklistRecord, ChecklistStore};
use crate::{date_from_todo_title, todo_title_for};

/// Checklist days roll over at midnight in this zone regardless of where
/// the tool runs.
pub const CHECKLIST_TIME_ZONE: Tz = New_York;

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    pub force: bool,
    pub show: bool,
    pub dry_run: bool,
}

/// What one invocation did; rendering to stdout is the caller's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// `--show`, or today's record already exists without `--force`.
    Shown {
        record: ChecklistRecord,
        /// True when today had no record and an older one was shown.
        fallback: bool,
        /// True for the implicit already-exists display (no `--show`).
        already_existed: bool,
    },
    DryRun {
        title: String,
        body: String,
    },
    Created {
        record: ChecklistRecord,
        closed_previous: Option<u64>,
    },
    Updated {
        record: ChecklistRecord,
        reopened: bool,
    },
}

pub fn today_in_checklist_zone(now_utc: DateTime<Utc>) -> String {
    now_utc
        .with_timezone(&CHECKLIST_TIME_ZONE)
        .date_naive()
        .format("%Y-%m-%d")
        .to_string()
}

/// The daily lifecycle: find-or-create today's checklist, carry over
/// unfinished items, supersede the previous open record.
///
/// Nothing is persisted until the whole document is composed; any query
/// failure aborts with no partial writes. There is no locking between the
/// existence check and creation, so simultaneous runs can race.
pub fn run_daily(
    config: &Config,
    store: &dyn ChecklistStore,
    options: RunOptions,
    now_utc: DateTime<Utc>,
    run: impl Fn(&[String]) -> Result<String>,
) -> Result<RunOutcome> {
    let today = today_in_checklist_zone(now_utc);
    let today_title = todo_title_for(&today);

    let mut existing_today = store.find_for_date(&today)?;

    if options.show {
        if let Some(record) = existing_today {
            return Ok(RunOutcome::Shown {
                record,
                fallback: false,
                already_existed: false,
            });
        }
        let Some(record) = store.recent(1)?.into_iter().next() else {
            bail!("No Todos issues exist yet.");
        };
        return Ok(RunOutcome::Shown {
            record,
            fallback: true,
            already_existed: false,
        });
    }

    if let Some(record) = &existing_today
        && !options.force
    {
        return Ok(RunOutcome::Shown {
            record: record.clone(),
            fallback: false,
            already_existed: true,
        });
    }

    let recent = store.recent(10)?;
    // The dated lookup can miss a just-created record when issue search
    // lags; the recent list is the backstop.
    if existing_today.is_none() {
        existing_today = recent
            .iter()
            .find(|record| record.title == today_title)
            .cloned();
    }
    // Previous means strictly before today: a future-dated record (a
    // hand-made file, a clock skew artifact) is never a carry-over source.
    let previous = recent
        .iter()
        .filter(|record| {
            date_from_todo_title(&record.title)
                .is_some_and(|date| date < today.as_str())
        })
        .find(|record| match &existing_today {
            Some(existing) => !record.same_as(existing),
            None => true,
        })
        .cloned();

    // Forced regeneration re-derives carry-over from today's own current
    // body, not the prior day's.
    let carryover_source = if options.force && existing_today.is_some() {
        existing_today.as_ref().map(|record| record.body.clone())
    } else {
        previous.as_ref().map(|record| record.body.clone())
    };
    let carryover = carryover_source
        .as_deref()
        .map(extract_unfinished_items)
        .unwrap_or_default();

    let sections = collect_sections(&config.organizations, run)?;
    let body = compose_checklist(
        &today,
        now_utc,
        &carryover,
        &config.organizations,
        &sections,
    );

    if options.dry_run {
        return Ok(RunOutcome::DryRun {
            title: today_title,
            body,
        });
    }

    if options.force
        && let Some(existing) = existing_today
    {
        let updated = store.update(&existing, &body)?;
        let mut reopened = false;
        if !existing.open {
            store.reopen(&existing)?;
            reopened = true;
        }
        return Ok(RunOutcome::Updated {
            record: updated,
            reopened,
        });
    }

    let created = store.create(&today, &body)?;
    let mut closed_previous = None;
    if let Some(previous) = previous
        && previous.open
    {
        store.supersede(&previous, &created)?;
        closed_previous = previous.number;
    }
    Ok(RunOutcome::Created {
        record: created,
        closed_previous,
    })
}
