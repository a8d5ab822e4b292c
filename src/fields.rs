//! Enumerations and field types for site task tracking.
//!
//! This module defines the closed value sets a task's daily breakdown is built
//! from: the seven days of a reporting week and the status recorded per day.

use chrono::Weekday;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Day of a Monday-anchored reporting week.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Hash, PartialOrd, Ord,
)]
#[serde(rename_all = "kebab-case")]
pub enum DayOfWeek {
    #[serde(alias = "Monday", alias = "segunda")]
    #[value(alias = "segunda", alias = "mon")]
    Monday,
    #[serde(alias = "Tuesday", alias = "terca")]
    #[value(alias = "terca", alias = "tue")]
    Tuesday,
    #[serde(alias = "Wednesday", alias = "quarta")]
    #[value(alias = "quarta", alias = "wed")]
    Wednesday,
    #[serde(alias = "Thursday", alias = "quinta")]
    #[value(alias = "quinta", alias = "thu")]
    Thursday,
    #[serde(alias = "Friday", alias = "sexta")]
    #[value(alias = "sexta", alias = "fri")]
    Friday,
    #[serde(alias = "Saturday", alias = "sabado")]
    #[value(alias = "sabado", alias = "sat")]
    Saturday,
    #[serde(alias = "Sunday", alias = "domingo")]
    #[value(alias = "domingo", alias = "sun")]
    Sunday,
}

impl DayOfWeek {
    /// All days in reporting order.
    pub const ALL: [DayOfWeek; 7] = [
        DayOfWeek::Monday,
        DayOfWeek::Tuesday,
        DayOfWeek::Wednesday,
        DayOfWeek::Thursday,
        DayOfWeek::Friday,
        DayOfWeek::Saturday,
        DayOfWeek::Sunday,
    ];

    /// Zero-based position within the week, Monday = 0.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Short Portuguese label used in tables.
    pub fn short_label(self) -> &'static str {
        match self {
            DayOfWeek::Monday => "Seg",
            DayOfWeek::Tuesday => "Ter",
            DayOfWeek::Wednesday => "Qua",
            DayOfWeek::Thursday => "Qui",
            DayOfWeek::Friday => "Sex",
            DayOfWeek::Saturday => "Sáb",
            DayOfWeek::Sunday => "Dom",
        }
    }
}

impl From<Weekday> for DayOfWeek {
    fn from(w: Weekday) -> Self {
        DayOfWeek::ALL[w.num_days_from_monday() as usize]
    }
}

/// Outcome recorded for one day of a task.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    #[serde(alias = "Done", alias = "concluido")]
    #[value(alias = "concluido")]
    Done,
    #[serde(alias = "NotDone", alias = "not_done", alias = "nao-concluido")]
    #[value(alias = "nao-concluido")]
    NotDone,
    #[default]
    #[serde(alias = "NotApplicable", alias = "not_applicable", alias = "na")]
    #[value(alias = "na")]
    NotApplicable,
}

/// Format a day status for display.
pub fn format_task_status(s: TaskStatus) -> &'static str {
    match s {
        TaskStatus::Done => "OK",
        TaskStatus::NotDone => "X",
        TaskStatus::NotApplicable => "-",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn days_follow_monday_first_order() {
        for (i, d) in DayOfWeek::ALL.iter().enumerate() {
            assert_eq!(d.index(), i);
        }
        assert_eq!(DayOfWeek::from(Weekday::Mon), DayOfWeek::Monday);
        assert_eq!(DayOfWeek::from(Weekday::Sun), DayOfWeek::Sunday);
    }

    #[test]
    fn portuguese_aliases_deserialize() {
        let d: DayOfWeek = serde_json::from_str("\"segunda\"").unwrap();
        assert_eq!(d, DayOfWeek::Monday);
        let s: TaskStatus = serde_json::from_str("\"not_done\"").unwrap();
        assert_eq!(s, TaskStatus::NotDone);
        let s: TaskStatus = serde_json::from_str("\"not-applicable\"").unwrap();
        assert_eq!(s, TaskStatus::NotApplicable);
    }
}
