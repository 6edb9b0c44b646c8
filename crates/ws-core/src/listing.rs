use chrono::{Days, NaiveDate};

use crate::workspace::{Status, WorkspaceEntry, WorkspaceMeta, WorkspaceStore};

/// Days without activity after which a workspace is shown as idle.
pub const IDLE_AFTER_DAYS: i64 = 7;
/// Days without activity after which a workspace is shown as stale.
pub const STALE_AFTER_DAYS: i64 = 30;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    pub status: Option<Status>,
    /// Keep only workspaces whose last activity is strictly older than
    /// `today - stale_days`.
    pub stale_days: Option<u64>,
}

impl ListFilter {
    /// Entries whose marker could not be parsed never match an active filter.
    pub fn matches(&self, entry: &WorkspaceEntry, today: NaiveDate) -> bool {
        if self.status.is_none() && self.stale_days.is_none() {
            return true;
        }
        let Some(meta) = entry.meta.as_ref() else {
            return false;
        };
        if let Some(status) = self.status {
            if meta.status != status {
                return false;
            }
        }
        if let Some(days) = self.stale_days {
            let Some(cutoff) = today.checked_sub_days(Days::new(days)) else {
                return false;
            };
            if meta.last_activity() >= cutoff {
                return false;
            }
        }
        true
    }
}

pub fn list_workspaces(
    store: &WorkspaceStore,
    filter: &ListFilter,
    today: NaiveDate,
) -> Vec<WorkspaceEntry> {
    store
        .find_all()
        .into_iter()
        .filter(|entry| filter.matches(entry, today))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Staleness {
    Fresh,
    Idle(i64),
    Stale(i64),
}

pub fn days_idle(meta: &WorkspaceMeta, today: NaiveDate) -> i64 {
    (today - meta.last_activity()).num_days()
}

pub fn staleness(meta: &WorkspaceMeta, today: NaiveDate) -> Staleness {
    let days = days_idle(meta, today);
    if days > STALE_AFTER_DAYS {
        Staleness::Stale(days)
    } else if days > IDLE_AFTER_DAYS {
        Staleness::Idle(days)
    } else {
        Staleness::Fresh
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::name::WorkspaceName;
    use std::path::PathBuf;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("date")
    }

    fn entry(name: &str, status: Status, last_opened: NaiveDate) -> WorkspaceEntry {
        let mut meta = WorkspaceMeta::new(name, status, date(2026, 1, 1));
        meta.last_opened = last_opened;
        WorkspaceEntry {
            name: WorkspaceName::parse(name).expect("name"),
            path: PathBuf::from(name),
            meta: Some(meta),
        }
    }

    #[test]
    fn status_filter_drops_other_statuses_and_unparsed_markers() {
        let today = date(2026, 3, 1);
        let filter = ListFilter {
            status: Some(Status::Paused),
            ..ListFilter::default()
        };
        assert!(filter.matches(&entry("a", Status::Paused, today), today));
        assert!(!filter.matches(&entry("b", Status::Active, today), today));
        let broken = WorkspaceEntry {
            meta: None,
            ..entry("c", Status::Paused, today)
        };
        assert!(!filter.matches(&broken, today));
        assert!(ListFilter::default().matches(&broken, today));
    }

    #[test]
    fn stale_filter_is_strict() {
        let today = date(2026, 3, 31);
        let filter = ListFilter {
            stale_days: Some(30),
            ..ListFilter::default()
        };
        assert!(filter.matches(&entry("old", Status::Active, date(2026, 2, 28)), today));
        assert!(!filter.matches(&entry("edge", Status::Active, date(2026, 3, 1)), today));
        assert!(!filter.matches(&entry("new", Status::Active, today), today));
    }

    #[test]
    fn staleness_thresholds() {
        let today = date(2026, 3, 31);
        let meta = |opened| entry("x", Status::Active, opened).meta.expect("meta");
        assert_eq!(staleness(&meta(date(2026, 3, 24)), today), Staleness::Fresh);
        assert_eq!(staleness(&meta(date(2026, 3, 23)), today), Staleness::Idle(8));
        assert_eq!(staleness(&meta(date(2026, 3, 1)), today), Staleness::Idle(30));
        assert_eq!(staleness(&meta(date(2026, 2, 28)), today), Staleness::Stale(31));
    }
}
