//! PCP (percentage of planned work completed) aggregation.
//!
//! A task counts as completed only through its `is_fully_completed` flag. The
//! daily breakdown does not feed into these figures.

use serde::Serialize;

use crate::task::Task;

/// Completion ratio over a set of tasks.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
pub struct PcpData {
    pub percentage: u32,
    pub completed_tasks: usize,
    pub total_tasks: usize,
}

/// Completion ratio for one discipline.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DisciplineProgress {
    pub name: String,
    pub percentage: u32,
    pub completed_tasks: usize,
    pub total_tasks: usize,
}

/// Overall figure plus the per-discipline split.
#[derive(Debug, Clone, Serialize, PartialEq, Eq, Default)]
pub struct PcpBreakdown {
    pub overall: PcpData,
    pub disciplines: Vec<DisciplineProgress>,
}

/// `round(100 * completed / total)`, or 0 for an empty set.
pub fn percentage(completed: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (100.0 * completed as f64 / total as f64).round() as u32
}

pub fn aggregate(tasks: &[Task]) -> PcpData {
    let completed_tasks = tasks.iter().filter(|t| t.is_fully_completed).count();
    let total_tasks = tasks.len();
    PcpData {
        percentage: percentage(completed_tasks, total_tasks),
        completed_tasks,
        total_tasks,
    }
}

/// Per-discipline figures in the order each discipline first appears.
///
/// Disciplines are matched by exact string; no case or whitespace folding.
pub fn by_discipline(tasks: &[Task]) -> Vec<DisciplineProgress> {
    let mut groups: Vec<(&str, usize, usize)> = Vec::new();
    for t in tasks {
        let idx = match groups.iter().position(|g| g.0 == t.discipline) {
            Some(i) => i,
            None => {
                groups.push((t.discipline.as_str(), 0, 0));
                groups.len() - 1
            }
        };
        let g = &mut groups[idx];
        g.2 += 1;
        if t.is_fully_completed {
            g.1 += 1;
        }
    }
    groups
        .into_iter()
        .map(|(name, completed, total)| DisciplineProgress {
            name: name.to_string(),
            percentage: percentage(completed, total),
            completed_tasks: completed,
            total_tasks: total,
        })
        .collect()
}

pub fn breakdown(tasks: &[Task]) -> PcpBreakdown {
    PcpBreakdown { overall: aggregate(tasks), disciplines: by_discipline(tasks) }
}

/// Count of non-completion causes across tasks that are not fully completed.
///
/// Sorted by count descending; ties keep first-seen order.
pub fn cause_ranking(tasks: &[Task]) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for t in tasks.iter().filter(|t| !t.is_fully_completed) {
        let Some(cause) = t.cause_if_not_done.as_deref().map(str::trim) else {
            continue;
        };
        if cause.is_empty() {
            continue;
        }
        match counts.iter_mut().find(|entry| entry.0 == cause) {
            Some(entry) => entry.1 += 1,
            None => counts.push((cause.to_string(), 1)),
        }
    }
    // Stable sort keeps first-seen order among equal counts.
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}
