use crate::analysis::teams::assign_team;
use crate::models::bug::{AppFilter, BugRecord, BugRow, BugSummary, TypeCount};
use std::collections::{BTreeMap, BTreeSet};

/// Count records per `type`, scoped to `filter`, ordered by type ascending.
pub fn counts_by_type(records: &[BugRecord], filter: &AppFilter) -> Vec<TypeCount> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for record in records.iter().filter(|r| filter.matches(r)) {
        *counts.entry(record.bug_type.as_str()).or_insert(0) += 1;
    }

    counts
        .into_iter()
        .map(|(bug_type, count)| TypeCount {
            bug_type: bug_type.to_string(),
            count,
        })
        .collect()
}

/// Records matching `filter`, in their original order.
pub fn filter_by_app(records: &[BugRecord], filter: &AppFilter) -> Vec<BugRecord> {
    records
        .iter()
        .filter(|r| filter.matches(r))
        .cloned()
        .collect()
}

/// Distinct app names for the filter picker, sorted.
pub fn app_names(records: &[BugRecord]) -> Vec<String> {
    records
        .iter()
        .map(|r| r.app.as_str())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

pub fn bug_rows(records: &[BugRecord], filter: &AppFilter) -> Vec<BugRow> {
    records
        .iter()
        .filter(|r| filter.matches(r))
        .map(|r| BugRow {
            record: r.clone(),
            team: assign_team(r).to_string(),
        })
        .collect()
}

pub fn summarize(records: &[BugRecord], filter: &AppFilter) -> BugSummary {
    let (resolved, unresolved) = records
        .iter()
        .filter(|r| filter.matches(r))
        .fold((0, 0), |(done, open), r| {
            if r.is_resolved() {
                (done + 1, open)
            } else {
                (done, open + 1)
            }
        });

    BugSummary {
        app_filter: filter.to_string(),
        total: resolved + unresolved,
        resolved,
        unresolved,
        by_type: counts_by_type(records, filter),
    }
}
