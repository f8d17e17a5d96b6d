//! Longest-collaboration analysis
//!
//! Loads every assignment, groups them by project, and for every pair of
//! records inside a group adds the inclusive day count of their date-range
//! intersection to that employee pair's running total. The pair with the
//! largest total across all projects wins.
//!
//! Iteration is deterministic: projects in order of first appearance in the
//! scan, records within a project in scan order, pair totals in order of first
//! contribution. On equal totals the pair reached first is kept.
//!
//! Cost is O(sum of project_size^2) comparisons. Fine for a batch query;
//! not something to put on a hot request path at scale.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use collab_common::dates::inclusive_days;
use collab_common::{AssignmentRecord, LongestCollaboration, PairKey, Result};
use tracing::{debug, info};

use crate::store::AssignmentStore;

/// One employee's period on a project
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Stint {
    employee_id: i64,
    date_from: NaiveDate,
    date_to: NaiveDate,
}

/// Running per-pair totals, kept in first-contribution order
#[derive(Debug, Default)]
pub struct PairTotals {
    index: HashMap<PairKey, usize>,
    totals: Vec<(PairKey, i64)>,
}

impl PairTotals {
    pub fn add(&mut self, pair: PairKey, days: i64) {
        match self.index.get(&pair) {
            Some(&slot) => self.totals[slot].1 += days,
            None => {
                self.index.insert(pair, self.totals.len());
                self.totals.push((pair, days));
            }
        }
    }

    #[cfg(test)]
    pub fn get(&self, pair: PairKey) -> Option<i64> {
        self.index.get(&pair).map(|&slot| self.totals[slot].1)
    }

    pub fn len(&self) -> usize {
        self.totals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    /// Largest total; earliest pair wins ties. `None` if nothing overlapped.
    pub fn best(&self) -> Option<(PairKey, i64)> {
        let mut best: Option<(PairKey, i64)> = None;
        for &(pair, days) in &self.totals {
            match best {
                Some((_, best_days)) if days <= best_days => {}
                _ => best = Some((pair, days)),
            }
        }
        best
    }
}

/// Days two periods share, counting both boundary days; 0 if disjoint
pub fn overlap_days(a_from: NaiveDate, a_to: NaiveDate, b_from: NaiveDate, b_to: NaiveDate) -> i64 {
    let start = a_from.max(b_from);
    let end = a_to.min(b_to);
    if start <= end {
        inclusive_days(start, end)
    } else {
        0
    }
}

/// Accumulate overlap days per employee pair over all projects
pub fn accumulate_pairs(records: &[AssignmentRecord]) -> PairTotals {
    // Projects in first-seen order
    let mut project_slots: HashMap<i64, usize> = HashMap::new();
    let mut projects: Vec<Vec<Stint>> = Vec::new();

    for record in records {
        let slot = *project_slots.entry(record.project_id).or_insert_with(|| {
            projects.push(Vec::new());
            projects.len() - 1
        });
        projects[slot].push(Stint {
            employee_id: record.employee_id,
            date_from: record.date_from,
            date_to: record.date_to,
        });
    }

    let mut totals = PairTotals::default();
    for stints in &projects {
        for (i, a) in stints.iter().enumerate() {
            for b in &stints[i + 1..] {
                // Two periods of the same employee are not a collaboration
                if a.employee_id == b.employee_id {
                    continue;
                }
                let days = overlap_days(a.date_from, a.date_to, b.date_from, b.date_to);
                if days > 0 {
                    totals.add(PairKey::new(a.employee_id, b.employee_id), days);
                }
            }
        }
    }

    debug!(
        projects = projects.len(),
        pairs = totals.len(),
        "Accumulated collaboration totals"
    );
    totals
}

/// Pick the winning pair from already-loaded records
pub fn longest_collaboration(records: &[AssignmentRecord]) -> LongestCollaboration {
    match accumulate_pairs(records).best() {
        Some((pair, days)) => LongestCollaboration::from_pair(pair, days),
        None => LongestCollaboration::none(),
    }
}

#[derive(Clone)]
pub struct OverlapAnalyzer {
    store: Arc<dyn AssignmentStore>,
}

impl OverlapAnalyzer {
    pub fn new(store: Arc<dyn AssignmentStore>) -> Self {
        Self { store }
    }

    /// Full scan then compute. Recomputed from scratch on every call.
    pub async fn find_longest_collaboration(&self) -> Result<LongestCollaboration> {
        let records = self.store.scan_assignments().await?;
        let result = longest_collaboration(&records);

        info!(
            assignments = records.len(),
            emp1_id = result.emp1_id,
            emp2_id = result.emp2_id,
            total_days = result.total_days,
            "Longest collaboration computed"
        );
        Ok(result)
    }
}
