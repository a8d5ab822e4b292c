//! # obra-pcp - construction-site task tracking
//!
//! Weekly task planning and PCP (Percentual de Conclusão do Planejado,
//! percentage of planned work completed) reporting for construction sites
//! ("obras").
//!
//! ## Key Features
//!
//! - **Weekly planning**: every task belongs to a Monday-anchored reporting week
//!   and records a status for each day of that week.
//! - **Independent completion flag**: a task is complete only when someone marks
//!   it so. All days done does not imply complete, and the reverse also holds.
//! - **PCP reporting**: overall and per-discipline completion percentages, plus a
//!   ranking of the causes given for work not done.
//! - **Materials**: materials requested per task.
//! - **Local storage**: one JSON file per obra, plus a shared company/user directory.
//!
//! ## Quick Start
//!
//! ```bash
//! obra --obra "Torre A" task add "Alvenaria 3º pavimento" --discipline Civil
//! obra --obra "Torre A" task status 1 monday done
//! obra --obra "Torre A" task toggle 1
//! obra --obra "Torre A" pcp
//! ```
//!
//! Data is stored in `~/.obra/` unless `--data-dir` or `OBRA_DATA_DIR` is set.

pub mod cli;
pub mod cmd;
pub mod config;
pub mod dates;
pub mod db;
pub mod error;
pub mod fields;
pub mod format;
pub mod obra;
pub mod pcp;
pub mod store;
pub mod task;
pub mod week;

pub use error::{AppError, Result};
pub use pcp::{aggregate, breakdown, PcpBreakdown, PcpData};
pub use task::Task;
pub use week::filter_tasks_by_week;
