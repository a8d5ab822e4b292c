//! Task data structure and status mutations.
//!
//! A `Task` is one planned work item for a reporting week on an obra. It carries
//! a per-day status breakdown and an overall completion flag. The two are kept
//! independent: toggling completion never looks at the daily entries and
//! changing a day never touches completion.

use chrono::{NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::fields::*;
use crate::week::week_start;

/// Status recorded for a single day.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DailyStatusEntry {
    pub day: DayOfWeek,
    pub status: TaskStatus,
}

/// A planned work item with its weekly status breakdown.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub id: u64,
    pub obra_id: String,
    pub description: String,
    #[serde(default)]
    pub item: String,
    #[serde(default)]
    pub sector: String,
    #[serde(default)]
    pub discipline: String,
    #[serde(default)]
    pub team: String,
    #[serde(default)]
    pub responsible: String,
    #[serde(default)]
    pub executor: String,
    pub daily_status: Vec<DailyStatusEntry>,
    #[serde(default)]
    pub is_fully_completed: bool,
    #[serde(default)]
    pub cause_if_not_done: Option<String>,
    #[serde(default)]
    pub week_start_date: Option<NaiveDate>,
    pub created_at_utc: i64,
    pub updated_at_utc: i64,
}

impl Task {
    /// Create a task with every day set to the default status.
    pub fn new(id: u64, obra_id: &str, description: &str, created_at_utc: i64) -> Self {
        Task {
            id,
            obra_id: obra_id.to_string(),
            description: description.to_string(),
            item: String::new(),
            sector: String::new(),
            discipline: String::new(),
            team: String::new(),
            responsible: String::new(),
            executor: String::new(),
            daily_status: blank_week(),
            is_fully_completed: false,
            cause_if_not_done: None,
            week_start_date: None,
            created_at_utc,
            updated_at_utc: created_at_utc,
        }
    }

    /// Status recorded for `day`, if the breakdown has an entry for it.
    pub fn status_on(&self, day: DayOfWeek) -> Option<TaskStatus> {
        self.daily_status.iter().find(|e| e.day == day).map(|e| e.status)
    }

    /// Return a copy with the entry for `day` set to `status`.
    ///
    /// The entry is replaced in place. A missing day is inserted at its weekday
    /// position so the breakdown never holds two entries for one day.
    pub fn with_status(&self, day: DayOfWeek, status: TaskStatus) -> Task {
        let mut next = self.clone();
        if let Some(entry) = next.daily_status.iter_mut().find(|e| e.day == day) {
            entry.status = status;
        } else {
            let pos = next
                .daily_status
                .iter()
                .position(|e| e.day > day)
                .unwrap_or(next.daily_status.len());
            next.daily_status.insert(pos, DailyStatusEntry { day, status });
        }
        next
    }

    /// Return a copy with `is_fully_completed` negated. Daily entries are untouched.
    pub fn toggled(&self) -> Task {
        Task { is_fully_completed: !self.is_fully_completed, ..self.clone() }
    }

    /// Return a copy with the non-completion cause set. Empty input clears it.
    ///
    /// The cause is accepted whatever the task's status is.
    pub fn with_cause(&self, cause: &str) -> Task {
        let cause = cause.trim();
        Task {
            cause_if_not_done: if cause.is_empty() { None } else { Some(cause.to_string()) },
            ..self.clone()
        }
    }

    /// True when every day in the breakdown is done. Informational only.
    pub fn all_days_done(&self) -> bool {
        !self.daily_status.is_empty()
            && self.daily_status.iter().all(|e| e.status == TaskStatus::Done)
    }

    /// The week this task reports into: its stored week, or the Monday of its creation day.
    pub fn reporting_week(&self) -> NaiveDate {
        self.week_start_date.unwrap_or_else(|| {
            let created = Utc
                .timestamp_opt(self.created_at_utc, 0)
                .single()
                .unwrap_or_default()
                .date_naive();
            week_start(created)
        })
    }
}

/// One entry per day, Monday to Sunday, all at the default status.
pub fn blank_week() -> Vec<DailyStatusEntry> {
    DayOfWeek::ALL
        .iter()
        .map(|&day| DailyStatusEntry { day, status: TaskStatus::default() })
        .collect()
}

/// A material requested for a task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Material {
    pub id: u64,
    pub task_id: u64,
    pub description: String,
    #[serde(default)]
    pub quantity: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
    pub created_at_utc: i64,
}

/// Input for creating a material. `task_id` is optional so that a missing
/// parent can be rejected before any store call.
#[derive(Debug, Clone, Default)]
pub struct NewMaterial {
    pub task_id: Option<u64>,
    pub description: String,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
}

/// A company (empresa) registered on the platform.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Company {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// A platform user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
}
