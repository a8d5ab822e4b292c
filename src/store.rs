//! Store collaborators and the decode boundary for remote rows.
//!
//! The task, material and email stores are traits so the reporting core never
//! depends on where rows live. Rows coming from a remote backend are loosely
//! typed; `RawTask` accepts that shape and `RawTask::decode` turns it into a
//! checked `Task` or rejects it.

use std::collections::HashSet;

use serde::Deserialize;
use serde_json::Value;

use crate::dates::safe_parse_date;
use crate::error::{AppError, Result};
use crate::fields::{DayOfWeek, TaskStatus};
use crate::task::{blank_week, DailyStatusEntry, Material, NewMaterial, Task};
use crate::week::date_only;

/// Tasks of an obra.
pub trait TaskStore {
    fn fetch_tasks(&self, obra_id: &str) -> Result<Vec<Task>>;
    fn create_task(&mut self, task: Task) -> Result<Task>;
    fn update_task(&mut self, task: &Task) -> Result<()>;
}

/// Materials attached to tasks.
pub trait MaterialStore {
    fn list(&self, task_id: u64) -> Result<Vec<Material>>;
    fn create(&mut self, data: NewMaterial) -> Result<Material>;
    fn delete(&mut self, id: u64) -> Result<()>;
}

/// Registered emails. `lookup` returns the name of the source that holds it.
pub trait EmailDirectory {
    fn lookup(&self, email: &str) -> Result<Option<String>>;
}

/// Result of a best-effort email existence check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailExistence {
    pub exists: bool,
    pub source: Option<String>,
}

/// Reject tasks missing the fields every write needs.
pub fn validate_task(task: &Task) -> Result<()> {
    if task.obra_id.trim().is_empty() {
        return Err(AppError::Validation("obra id is required".into()));
    }
    if task.description.trim().is_empty() {
        return Err(AppError::Validation("task description is required".into()));
    }
    Ok(())
}

/// Validate and create a material. Nothing reaches the store on invalid input.
pub fn create_material<S: MaterialStore + ?Sized>(
    store: &mut S,
    data: NewMaterial,
) -> Result<Material> {
    if data.task_id.is_none() {
        return Err(AppError::Validation("task id is required".into()));
    }
    if data.description.trim().is_empty() {
        return Err(AppError::Validation("material description is required".into()));
    }
    store.create(data)
}

/// Check whether an email is registered. Lookup failures count as "not found".
pub fn check_email_exists<D: EmailDirectory + ?Sized>(dir: &D, email: &str) -> EmailExistence {
    match dir.lookup(email) {
        Ok(Some(source)) => EmailExistence { exists: true, source: Some(source) },
        Ok(None) => EmailExistence { exists: false, source: None },
        Err(e) => {
            tracing::warn!(email, error = %e, "email lookup failed, treating as absent");
            EmailExistence { exists: false, source: None }
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawDailyStatus {
    pub day: String,
    pub status: String,
}

/// A task row as a remote backend returns it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTask {
    #[serde(default)]
    pub id: Value,
    #[serde(default, alias = "obra_id")]
    pub obra_id: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub item: Option<String>,
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub discipline: Option<String>,
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub responsible: Option<String>,
    #[serde(default)]
    pub executor: Option<String>,
    #[serde(default)]
    pub daily_status: Option<Vec<RawDailyStatus>>,
    #[serde(default)]
    pub is_fully_completed: Option<bool>,
    #[serde(default)]
    pub cause_if_not_done: Option<String>,
    #[serde(default)]
    pub week_start_date: Option<String>,
    #[serde(default, rename = "created_at", alias = "createdAt")]
    pub created_at: Option<String>,
}

impl RawTask {
    /// Decode into a `Task`. The row's own obra id wins over `default_obra`.
    pub fn decode(self, default_obra: &str) -> Result<Task> {
        let id = decode_id(&self.id)?;
        let ctx = |msg: String| AppError::Decode(format!("task {id}: {msg}"));

        let daily_status = match self.daily_status {
            None => blank_week(),
            Some(rows) => {
                let mut seen = HashSet::new();
                let mut entries = Vec::with_capacity(rows.len());
                for row in rows {
                    let day: DayOfWeek = serde_json::from_value(Value::String(row.day.clone()))
                        .map_err(|_| ctx(format!("unknown day '{}'", row.day)))?;
                    let status: TaskStatus =
                        serde_json::from_value(Value::String(row.status.clone()))
                            .map_err(|_| ctx(format!("unknown status '{}'", row.status)))?;
                    if !seen.insert(day) {
                        return Err(ctx(format!("duplicate entry for {day:?}")));
                    }
                    entries.push(DailyStatusEntry { day, status });
                }
                entries
            }
        };

        let week_start_date = match self.week_start_date.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(s) => Some(date_only(s).ok_or_else(|| ctx(format!("invalid week start '{s}'")))?),
        };

        let created_at_utc = match self.created_at.as_deref() {
            Some(s) => safe_parse_date(Some(s))
                .ok_or_else(|| ctx(format!("invalid created_at '{s}'")))?
                .and_utc()
                .timestamp(),
            None => return Err(ctx("missing created_at".into())),
        };

        let obra_id = self
            .obra_id
            .filter(|o| !o.trim().is_empty())
            .unwrap_or_else(|| default_obra.to_string());

        Ok(Task {
            id,
            obra_id,
            description: self.description.unwrap_or_default(),
            item: self.item.unwrap_or_default(),
            sector: self.sector.unwrap_or_default(),
            discipline: self.discipline.unwrap_or_default(),
            team: self.team.unwrap_or_default(),
            responsible: self.responsible.unwrap_or_default(),
            executor: self.executor.unwrap_or_default(),
            daily_status,
            is_fully_completed: self.is_fully_completed.unwrap_or(false),
            cause_if_not_done: self.cause_if_not_done.filter(|c| !c.trim().is_empty()),
            week_start_date,
            created_at_utc,
            updated_at_utc: created_at_utc,
        })
    }
}

fn decode_id(v: &Value) -> Result<u64> {
    match v {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
    .ok_or_else(|| AppError::Decode(format!("missing or invalid task id: {v}")))
}

/// Decode a JSON array of remote task rows. Any bad row fails the whole batch.
pub fn decode_tasks(json: &str, default_obra: &str) -> Result<Vec<Task>> {
    let rows: Vec<RawTask> = serde_json::from_str(json)?;
    rows.into_iter().map(|r| r.decode(default_obra)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct CountingStore {
        calls: Cell<usize>,
    }

    impl MaterialStore for CountingStore {
        fn list(&self, _task_id: u64) -> Result<Vec<Material>> {
            Ok(Vec::new())
        }
        fn create(&mut self, data: NewMaterial) -> Result<Material> {
            self.calls.set(self.calls.get() + 1);
            Ok(Material {
                id: 1,
                task_id: data.task_id.unwrap_or_default(),
                description: data.description,
                quantity: data.quantity,
                unit: data.unit,
                created_at_utc: 0,
            })
        }
        fn delete(&mut self, _id: u64) -> Result<()> {
            Ok(())
        }
    }

    struct Offline;

    impl EmailDirectory for Offline {
        fn lookup(&self, _email: &str) -> Result<Option<String>> {
            Err(AppError::Transient("connection refused".into()))
        }
    }

    struct Fixed(Option<&'static str>);

    impl EmailDirectory for Fixed {
        fn lookup(&self, _email: &str) -> Result<Option<String>> {
            Ok(self.0.map(String::from))
        }
    }

    #[test]
    fn material_validation_happens_before_store_call() {
        let mut store = CountingStore { calls: Cell::new(0) };

        let material = |task_id: Option<u64>, description: &str| NewMaterial {
            task_id,
            description: description.into(),
            ..Default::default()
        };

        let err = create_material(&mut store, material(None, "Cimento"));
        assert!(matches!(err, Err(AppError::Validation(_))));

        let err = create_material(&mut store, material(Some(3), "  "));
        assert!(matches!(err, Err(AppError::Validation(_))));
        assert_eq!(store.calls.get(), 0);

        let m = create_material(&mut store, material(Some(3), "Cimento")).unwrap();
        assert_eq!(m.task_id, 3);
        assert_eq!(store.calls.get(), 1);
    }

    #[test]
    fn email_check_swallows_transport_errors() {
        assert_eq!(
            check_email_exists(&Offline, "a@b.com"),
            EmailExistence { exists: false, source: None }
        );
        assert_eq!(
            check_email_exists(&Fixed(Some("usuarios")), "a@b.com"),
            EmailExistence { exists: true, source: Some("usuarios".into()) }
        );
        assert!(!check_email_exists(&Fixed(None), "a@b.com").exists);
    }

    #[test]
    fn task_validation() {
        let t = Task::new(1, "obra", "Reboco", 0);
        assert!(validate_task(&t).is_ok());
        assert!(validate_task(&Task::new(1, "obra", " ", 0)).is_err());
        assert!(validate_task(&Task::new(1, "", "Reboco", 0)).is_err());
    }

    #[test]
    fn decodes_remote_rows() {
        let json = r#"[{
            "id": "7",
            "description": "Instalar eletrodutos",
            "discipline": "Elétrica",
            "dailyStatus": [
                {"day": "monday", "status": "done"},
                {"day": "terca", "status": "not_done"}
            ],
            "isFullyCompleted": true,
            "causeIfNotDone": "",
            "weekStartDate": "2024-03-11T03:00:00.000Z",
            "created_at": "2024-03-11T12:00:00+00:00"
        }]"#;
        let tasks = decode_tasks(json, "edificio-a").unwrap();
        assert_eq!(tasks.len(), 1);
        let t = &tasks[0];
        assert_eq!(t.id, 7);
        assert_eq!(t.obra_id, "edificio-a");
        assert_eq!(t.status_on(DayOfWeek::Tuesday), Some(TaskStatus::NotDone));
        assert_eq!(t.status_on(DayOfWeek::Friday), None);
        assert!(t.is_fully_completed);
        assert_eq!(t.cause_if_not_done, None);
        assert_eq!(t.week_start_date, chrono::NaiveDate::from_ymd_opt(2024, 3, 11));
        assert_eq!(t.created_at_utc, 1_710_158_400);
        assert_eq!(t.sector, "");
    }

    #[test]
    fn missing_daily_status_becomes_blank_week() {
        let json = r#"[{"id": 1, "description": "x", "created_at": "2024-03-11"}]"#;
        let tasks = decode_tasks(json, "o").unwrap();
        assert_eq!(tasks[0].daily_status, blank_week());
        assert_eq!(tasks[0].week_start_date, None);
    }

    #[test]
    fn rejects_malformed_rows() {
        let dup = r#"[{"id": 1, "created_at": "2024-03-11",
            "dailyStatus": [{"day": "monday", "status": "done"},
                            {"day": "segunda", "status": "done"}]}]"#;
        assert!(matches!(decode_tasks(dup, "o"), Err(AppError::Decode(_))));

        let no_id = r#"[{"description": "x", "created_at": "2024-03-11"}]"#;
        assert!(matches!(decode_tasks(no_id, "o"), Err(AppError::Decode(_))));

        let bad_week = r#"[{"id": 1, "created_at": "2024-03-11", "weekStartDate": "11/03/2024"}]"#;
        assert!(matches!(decode_tasks(bad_week, "o"), Err(AppError::Decode(_))));

        let bad_day = r#"[{"id": 1, "created_at": "2024-03-11",
            "dailyStatus": [{"day": "funday", "status": "done"}]}]"#;
        assert!(matches!(decode_tasks(bad_day, "o"), Err(AppError::Decode(_))));

        assert!(matches!(decode_tasks("{}", "o"), Err(AppError::Json(_))));
    }
}
