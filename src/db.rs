//! File-backed stores.
//!
//! `Database` holds one obra's tasks and materials in a JSON file and implements
//! `TaskStore` and `MaterialStore`. `Directory` holds the companies and users
//! shared by all obras and implements `EmailDirectory`. Both persist with a
//! temp-file write followed by a rename.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::store::{validate_task, EmailDirectory, MaterialStore, TaskStore};
use crate::task::{Company, Material, NewMaterial, Task, User};

/// File name of the shared company/user directory.
pub const DIRECTORY_FILE: &str = "directory.json";

/// Tasks and materials of a single obra.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Database {
    #[serde(default)]
    pub obra_id: String,
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub materials: Vec<Material>,
    #[serde(skip)]
    path: Option<PathBuf>,
}

impl Database {
    /// Open the database at `path`. A missing file yields an empty database bound to that path.
    pub fn open(path: &Path, obra_id: &str) -> Result<Self> {
        let mut db: Database = load_json(path)?.unwrap_or_default();
        if db.obra_id.is_empty() {
            db.obra_id = obra_id.to_string();
        }
        db.path = Some(path.to_path_buf());
        tracing::debug!(path = %path.display(), tasks = db.tasks.len(), "opened obra database");
        Ok(db)
    }

    /// In-memory database that never touches disk.
    pub fn in_memory(obra_id: &str) -> Self {
        Database { obra_id: obra_id.to_string(), ..Default::default() }
    }

    /// Write to the bound path, if any.
    pub fn persist(&self) -> Result<()> {
        match &self.path {
            Some(p) => save_json(self, p),
            None => Ok(()),
        }
    }

    /// Generate the next available task ID.
    pub fn next_id(&self) -> u64 {
        self.tasks.iter().map(|t| t.id).max().unwrap_or(0) + 1
    }

    fn next_material_id(&self) -> u64 {
        self.materials.iter().map(|m| m.id).max().unwrap_or(0) + 1
    }

    /// Get a task by ID.
    pub fn get(&self, id: u64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Insert new tasks and replace existing ones by ID, then persist once.
    ///
    /// Returns `(inserted, replaced)`.
    pub fn upsert_all(&mut self, tasks: Vec<Task>) -> Result<(usize, usize)> {
        for t in &tasks {
            validate_task(t)?;
        }
        let (mut inserted, mut replaced) = (0, 0);
        for t in tasks {
            match self.tasks.iter_mut().find(|x| x.id == t.id) {
                Some(slot) => {
                    *slot = t;
                    replaced += 1;
                }
                None => {
                    self.tasks.push(t);
                    inserted += 1;
                }
            }
        }
        self.persist()?;
        Ok((inserted, replaced))
    }
}

impl TaskStore for Database {
    fn fetch_tasks(&self, obra_id: &str) -> Result<Vec<Task>> {
        Ok(self.tasks.iter().filter(|t| t.obra_id == obra_id).cloned().collect())
    }

    fn create_task(&mut self, task: Task) -> Result<Task> {
        validate_task(&task)?;
        if self.get(task.id).is_some() {
            return Err(AppError::Validation(format!("task id {} already exists", task.id)));
        }
        self.tasks.push(task.clone());
        self.persist()?;
        tracing::info!(id = task.id, obra = %task.obra_id, "task created");
        Ok(task)
    }

    fn update_task(&mut self, task: &Task) -> Result<()> {
        validate_task(task)?;
        let Some(slot) = self.tasks.iter_mut().find(|t| t.id == task.id) else {
            return Err(AppError::not_found("Task", task.id));
        };
        *slot = task.clone();
        self.persist()?;
        tracing::info!(id = task.id, "task updated");
        Ok(())
    }
}

impl MaterialStore for Database {
    fn list(&self, task_id: u64) -> Result<Vec<Material>> {
        Ok(self.materials.iter().filter(|m| m.task_id == task_id).cloned().collect())
    }

    fn create(&mut self, data: NewMaterial) -> Result<Material> {
        let task_id = data
            .task_id
            .ok_or_else(|| AppError::Validation("task id is required".into()))?;
        if self.get(task_id).is_none() {
            return Err(AppError::not_found("Task", task_id));
        }
        let material = Material {
            id: self.next_material_id(),
            task_id,
            description: data.description.trim().to_string(),
            quantity: data.quantity,
            unit: data.unit.map(|u| u.trim().to_string()).filter(|u| !u.is_empty()),
            created_at_utc: Utc::now().timestamp(),
        };
        self.materials.push(material.clone());
        self.persist()?;
        tracing::info!(id = material.id, task_id, "material created");
        Ok(material)
    }

    fn delete(&mut self, id: u64) -> Result<()> {
        let before = self.materials.len();
        self.materials.retain(|m| m.id != id);
        if self.materials.len() == before {
            return Err(AppError::not_found("Material", id));
        }
        self.persist()?;
        tracing::info!(id, "material deleted");
        Ok(())
    }
}

/// Companies and users shared across obras.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Directory {
    #[serde(default)]
    pub companies: Vec<Company>,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(skip)]
    path: Option<PathBuf>,
}

impl Directory {
    pub fn open(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(DIRECTORY_FILE);
        let mut dir: Directory = load_json(&path)?.unwrap_or_default();
        dir.path = Some(path);
        Ok(dir)
    }

    pub fn persist(&self) -> Result<()> {
        match &self.path {
            Some(p) => save_json(self, p),
            None => Ok(()),
        }
    }

    pub fn add_company(
        &mut self,
        name: &str,
        email: Option<String>,
        phone: Option<String>,
    ) -> Result<Company> {
        if name.trim().is_empty() {
            return Err(AppError::Validation("company name is required".into()));
        }
        let company = Company {
            id: self.companies.iter().map(|c| c.id).max().unwrap_or(0) + 1,
            name: name.trim().to_string(),
            email: email.map(|e| e.trim().to_lowercase()).filter(|e| !e.is_empty()),
            phone: phone.filter(|p| !p.trim().is_empty()),
        };
        self.companies.push(company.clone());
        self.persist()?;
        Ok(company)
    }

    pub fn add_user(&mut self, name: &str, email: &str, phone: Option<String>) -> Result<User> {
        let email = email.trim().to_lowercase();
        if name.trim().is_empty() || email.is_empty() {
            return Err(AppError::Validation("user name and email are required".into()));
        }
        if self.users.iter().any(|u| u.email == email) {
            return Err(AppError::Validation(format!("email {email} is already registered")));
        }
        let user = User {
            id: self.users.iter().map(|u| u.id).max().unwrap_or(0) + 1,
            name: name.trim().to_string(),
            email,
            phone: phone.filter(|p| !p.trim().is_empty()),
        };
        self.users.push(user.clone());
        self.persist()?;
        Ok(user)
    }
}

impl EmailDirectory for Directory {
    fn lookup(&self, email: &str) -> Result<Option<String>> {
        let email = email.trim().to_lowercase();
        if self.users.iter().any(|u| u.email == email) {
            return Ok(Some("usuarios".into()));
        }
        if self.companies.iter().any(|c| c.email.as_deref() == Some(email.as_str())) {
            return Ok(Some("empresas".into()));
        }
        Ok(None)
    }
}

/// Read and parse a JSON file. A missing file is `Ok(None)`.
fn load_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    let buf = fs::read_to_string(path)?;
    let value = serde_json::from_str(&buf).map_err(|e| {
        tracing::error!(path = %path.display(), error = %e, "failed to parse data file");
        e
    })?;
    Ok(Some(value))
}

/// Atomic-ish write via temp + rename.
fn save_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    let data = serde_json::to_string_pretty(value)?;
    let mut f = fs::File::create(&tmp)?;
    f.write_all(data.as_bytes())?;
    f.flush()?;
    fs::rename(tmp, path)?;
    Ok(())
}
