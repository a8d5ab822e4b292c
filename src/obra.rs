//! Obra (construction site) discovery and per-obra database files.
//!
//! Every obra is stored as its own JSON file in the data directory, named
//! `<obra_id>_tasks.json`. The obra id is the sanitized display name.

use std::fs;
use std::path::{Path, PathBuf};

use crate::db::Database;
use crate::error::{AppError, Result};

/// An obra with its id and database file path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Obra {
    pub id: String,
    pub display_name: String,
    pub file_path: PathBuf,
}

impl Obra {
    /// Create an obra handle for the given display name.
    pub fn new(display_name: &str, data_dir: &Path) -> Self {
        let id = sanitize_obra_name(display_name);
        let file_path = data_dir.join(format!("{}_tasks.json", id));
        Obra {
            id,
            display_name: display_name.trim().to_string(),
            file_path,
        }
    }

    /// Recognise an obra from an existing database file.
    pub fn from_file(file_path: PathBuf) -> Option<Self> {
        let file_name = file_path.file_stem()?.to_str()?;
        let id = file_name.strip_suffix("_tasks")?;
        if id.is_empty() {
            return None;
        }
        Some(Obra {
            id: id.to_string(),
            display_name: id.replace('_', " "),
            file_path,
        })
    }

    /// Open this obra's task and material database.
    pub fn open_database(&self) -> Result<Database> {
        Database::open(&self.file_path, &self.id)
    }
}

/// Convert a display name to a safe id for file naming.
/// Lowercases, keeps alphanumerics and joins everything else with single underscores.
pub fn sanitize_obra_name(display_name: &str) -> String {
    display_name
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect::<String>()
        .split('_')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

/// Resolve a user-supplied obra name, rejecting names with nothing usable in them.
pub fn resolve_obra(display_name: &str, data_dir: &Path) -> Result<Obra> {
    let obra = Obra::new(display_name, data_dir);
    if obra.id.is_empty() {
        return Err(AppError::Validation(format!("invalid obra name '{}'", display_name)));
    }
    Ok(obra)
}

/// Discover all obras in the data directory, sorted by id.
pub fn discover_obras(data_dir: &Path) -> Result<Vec<Obra>> {
    let mut obras = Vec::new();
    if !data_dir.exists() {
        return Ok(obras);
    }
    for entry in fs::read_dir(data_dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|e| e == "json") {
            if let Some(obra) = Obra::from_file(path) {
                obras.push(obra);
            }
        }
    }
    obras.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(obras)
}
