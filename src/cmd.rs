//! Command implementations for the CLI interface.
//!
//! Each handler takes the explicit `AppContext`, opens the stores it needs and
//! returns `Result`, leaving error reporting and exit codes to `main`.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{Local, NaiveDate, TimeZone, Utc};
use clap::Subcommand;
use clap_complete::{generate, Shell};
use serde::Serialize;

use crate::config::AppContext;
use crate::dates::{get_days_from_today, is_date_overdue, safe_format_date};
use crate::db::Directory;
use crate::error::{AppError, Result};
use crate::fields::*;
use crate::format::{capitalize_words, format_phone, or_not_defined, truncate};
use crate::obra::{discover_obras, sanitize_obra_name};
use crate::pcp::{breakdown, cause_ranking, PcpBreakdown};
use crate::store::{check_email_exists, create_material, decode_tasks, MaterialStore, TaskStore};
use crate::task::{NewMaterial, Task};
use crate::week::{filter_tasks_by_week, parse_week_input, reference_week, week_range};

#[derive(Subcommand)]
pub enum Commands {
    /// List obras found in the data directory.
    Obras,

    /// Manage tasks of the current obra.
    Task {
        #[command(subcommand)]
        action: TaskAction,
    },

    /// Show the PCP (percentage of planned work completed) for a week.
    Pcp {
        /// Week: YYYY-MM-DD, "this", "last", "next", "in Nw" or "Nw ago".
        #[arg(long)]
        week: Option<String>,
        /// Restrict to one discipline (exact match).
        #[arg(long)]
        discipline: Option<String>,
        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List distinct disciplines and task counts.
    Disciplines,

    /// Manage materials requested for tasks.
    Material {
        #[command(subcommand)]
        action: MaterialAction,
    },

    /// Manage registered companies.
    Company {
        #[command(subcommand)]
        action: CompanyAction,
    },

    /// Manage registered users.
    User {
        #[command(subcommand)]
        action: UserAction,
    },

    /// Check whether an email is already registered.
    EmailCheck {
        email: String,
    },

    /// Import tasks from a JSON array of remote task rows.
    Import {
        /// Input JSON file path
        input: PathBuf,
    },

    /// Export a week's tasks to CSV.
    Export {
        /// Week to export (default: this week).
        #[arg(long)]
        week: Option<String>,
        /// Output file path (default: pcp_<obra>_<week>.csv)
        #[arg(long, short)]
        output: Option<String>,
    },

    /// Generate shell completion scripts.
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum TaskAction {
    /// Add a task to a reporting week.
    Add {
        description: String,
        #[arg(long)]
        item: Option<String>,
        #[arg(long)]
        sector: Option<String>,
        #[arg(long)]
        discipline: Option<String>,
        #[arg(long)]
        team: Option<String>,
        #[arg(long)]
        responsible: Option<String>,
        #[arg(long)]
        executor: Option<String>,
        /// Reporting week (default: this week).
        #[arg(long)]
        week: Option<String>,
    },

    /// List tasks of a week.
    List {
        /// Week to list (default: this week).
        #[arg(long)]
        week: Option<String>,
        /// Ignore the week and list everything.
        #[arg(long, conflicts_with = "week")]
        all_weeks: bool,
        /// Filter by discipline (exact match).
        #[arg(long)]
        discipline: Option<String>,
        /// Only tasks not marked complete.
        #[arg(long)]
        pending: bool,
    },

    /// Show a task in detail.
    View {
        id: u64,
    },

    /// Set the status recorded for one day.
    Status {
        id: u64,
        #[arg(value_enum)]
        day: DayOfWeek,
        #[arg(value_enum)]
        status: TaskStatus,
    },

    /// Flip the task's overall completion flag.
    Toggle {
        id: u64,
    },

    /// Record why a task was not done. An empty string clears it.
    Cause {
        id: u64,
        cause: String,
    },
}

#[derive(Subcommand)]
pub enum MaterialAction {
    /// Request a material for a task.
    Add {
        task_id: u64,
        description: String,
        #[arg(long)]
        quantity: Option<f64>,
        #[arg(long)]
        unit: Option<String>,
    },
    /// List materials of a task.
    List {
        task_id: u64,
    },
    /// Delete a material by ID.
    Delete {
        id: u64,
    },
}

#[derive(Subcommand)]
pub enum CompanyAction {
    /// Register a company.
    Add {
        name: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
    },
    /// List registered companies.
    List,
}

#[derive(Subcommand)]
pub enum UserAction {
    /// Register a user.
    Add {
        name: String,
        email: String,
        #[arg(long)]
        phone: Option<String>,
    },
    /// List registered users.
    List,
}

/// Resolve optional week input to a Monday, defaulting to this week.
pub fn resolve_week(input: Option<&str>, today: NaiveDate) -> Result<NaiveDate> {
    match input {
        None => Ok(reference_week(None, today)),
        Some(s) => parse_week_input(s, today).ok_or_else(|| {
            AppError::Validation(format!(
                "unrecognised week '{s}'. \
                 Use YYYY-MM-DD, 'this', 'last', 'next', 'in Nw' or 'Nw ago'."
            ))
        }),
    }
}

fn load_task<S: TaskStore + ?Sized>(store: &S, obra_id: &str, id: u64) -> Result<Task> {
    store
        .fetch_tasks(obra_id)?
        .into_iter()
        .find(|t| t.id == id)
        .ok_or_else(|| AppError::not_found("Task", id))
}

fn clean(s: Option<String>) -> String {
    s.map(|v| v.trim().to_string()).unwrap_or_default()
}

/// List obras in the data directory with their task counts.
pub fn cmd_obras(ctx: &AppContext) -> Result<()> {
    let obras = discover_obras(&ctx.data_dir)?;
    if obras.is_empty() {
        println!("No obras found in {}", ctx.data_dir.display());
        return Ok(());
    }
    println!("  {:<24} {}", "Obra", "Tasks");
    for obra in obras {
        let db = obra.open_database()?;
        let marker = if obra.id == ctx.obra.id { "*" } else { " " };
        println!("{} {:<24} {}", marker, truncate(&obra.id, 24), db.tasks.len());
    }
    Ok(())
}

/// Add a new task to the current obra.
pub fn cmd_task_add(
    ctx: &AppContext,
    description: String,
    item: Option<String>,
    sector: Option<String>,
    discipline: Option<String>,
    team: Option<String>,
    responsible: Option<String>,
    executor: Option<String>,
    week: Option<String>,
) -> Result<u64> {
    let week = resolve_week(week.as_deref(), Local::now().date_naive())?;
    let mut db = ctx.obra.open_database()?;

    let now = Utc::now().timestamp();
    let mut task = Task::new(db.next_id(), &ctx.obra.id, description.trim(), now);
    task.item = clean(item);
    task.sector = clean(sector);
    task.discipline = clean(discipline);
    task.team = clean(team);
    task.responsible = clean(responsible);
    task.executor = clean(executor);
    task.week_start_date = Some(week);

    let task = db.create_task(task)?;
    let week_label = safe_format_date(Some(&week.to_string()), &ctx.config.date_pattern, "-");
    println!("Added task {} to week of {}", task.id, week_label);
    Ok(task.id)
}

/// List tasks of a week with optional filters.
pub fn cmd_task_list(
    ctx: &AppContext,
    week: Option<String>,
    all_weeks: bool,
    discipline: Option<String>,
    pending: bool,
) -> Result<()> {
    let today = Local::now().date_naive();
    let db = ctx.obra.open_database()?;
    let mut tasks = db.fetch_tasks(&ctx.obra.id)?;
    if !all_weeks {
        let week = resolve_week(week.as_deref(), today)?;
        tasks = filter_tasks_by_week(&tasks, week);
    }
    tasks.retain(|t| {
        if let Some(ref d) = discipline {
            if &t.discipline != d {
                return false;
            }
        }
        !(pending && t.is_fully_completed)
    });
    tasks.sort_by_key(|t| (t.reporting_week(), t.id));
    print_table(&tasks);
    Ok(())
}

/// Print tasks with their daily breakdown.
///
/// A `!` before the ID marks a task whose week has ended without completion.
pub fn print_table(tasks: &[Task]) {
    let days: Vec<&str> = DayOfWeek::ALL.iter().map(|d| d.short_label()).collect();
    println!(
        "{:<6} {:<12} {:<12} {:<14} {:<3} {:<3} {:<3} {:<3} {:<3} {:<3} {:<3} {:<5} {}",
        "ID", "Discipline", "Sector", "Responsible",
        days[0], days[1], days[2], days[3], days[4], days[5], days[6],
        "Done", "Description"
    );
    for t in tasks {
        let (_, week_end) = week_range(t.reporting_week());
        let late = !t.is_fully_completed && is_date_overdue(Some(&week_end.to_string()));
        let id = format!("{}{}", if late { "!" } else { "" }, t.id);
        let cells: Vec<&str> = DayOfWeek::ALL
            .iter()
            .map(|&d| t.status_on(d).map(format_task_status).unwrap_or(" "))
            .collect();
        println!(
            "{:<6} {:<12} {:<12} {:<14} {:<3} {:<3} {:<3} {:<3} {:<3} {:<3} {:<3} {:<5} {}",
            id,
            truncate(or_not_defined(&t.discipline), 12),
            truncate(or_not_defined(&t.sector), 12),
            truncate(or_not_defined(&t.responsible), 14),
            cells[0], cells[1], cells[2], cells[3], cells[4], cells[5], cells[6],
            if t.is_fully_completed { "yes" } else { "no" },
            t.description
        );
    }
}

/// View detailed information about a specific task.
pub fn cmd_task_view(ctx: &AppContext, id: u64) -> Result<()> {
    let db = ctx.obra.open_database()?;
    let task = load_task(&db, &ctx.obra.id, id)?;
    let pattern = &ctx.config.date_pattern;
    let week = task.reporting_week().to_string();
    let relative = match get_days_from_today(Some(&week)) {
        Some(0) => "starts today".to_string(),
        Some(n) if n > 0 => format!("starts in {n}d"),
        Some(n) => format!("started {}d ago", -n),
        None => "-".to_string(),
    };

    println!("ID:           {}", task.id);
    println!("Obra:         {}", task.obra_id);
    println!("Description:  {}", task.description);
    println!("Item:         {}", if task.item.is_empty() { "-" } else { task.item.as_str() });
    println!("Sector:       {}", or_not_defined(&task.sector));
    println!("Discipline:   {}", or_not_defined(&task.discipline));
    println!("Team:         {}", or_not_defined(&task.team));
    println!("Responsible:  {}", or_not_defined(&task.responsible));
    println!("Executor:     {}", or_not_defined(&task.executor));
    println!("Week:         {} ({})", safe_format_date(Some(&week), pattern, "-"), relative);
    println!("Completed:    {}", if task.is_fully_completed { "yes" } else { "no" });
    println!("Cause:        {}", task.cause_if_not_done.as_deref().unwrap_or("-"));
    let created = Utc
        .timestamp_opt(task.created_at_utc, 0)
        .single()
        .map(|d| d.to_rfc3339())
        .unwrap_or_else(|| "-".into());
    println!("Created UTC:  {}", created);
    println!("Daily status:");
    for entry in &task.daily_status {
        println!("  {:<4} {}", entry.day.short_label(), format_task_status(entry.status));
    }
    if task.all_days_done() && !task.is_fully_completed {
        println!("Note: every day is done but the task is not marked complete.");
    }

    let materials = db.list(task.id)?;
    if !materials.is_empty() {
        println!("Materials:");
        for m in materials {
            let quantity = format_quantity(m.quantity, m.unit.as_deref());
            println!("  #{} {}{}", m.id, m.description, quantity);
        }
    }
    Ok(())
}

fn format_quantity(quantity: Option<f64>, unit: Option<&str>) -> String {
    match (quantity, unit) {
        (Some(q), Some(u)) => format!(" ({q} {u})"),
        (Some(q), None) => format!(" ({q})"),
        (None, Some(u)) => format!(" ({u})"),
        (None, None) => String::new(),
    }
}

/// Apply a status change to one day of a task.
pub fn cmd_task_status(
    ctx: &AppContext,
    id: u64,
    day: DayOfWeek,
    status: TaskStatus,
) -> Result<()> {
    let mut db = ctx.obra.open_database()?;
    let task = load_task(&db, &ctx.obra.id, id)?;
    let mut next = task.with_status(day, status);
    next.updated_at_utc = Utc::now().timestamp();
    db.update_task(&next)?;
    println!("Task {}: {} set to {}", id, day.short_label(), format_task_status(status));
    Ok(())
}

/// Flip a task's completion flag.
pub fn cmd_task_toggle(ctx: &AppContext, id: u64) -> Result<()> {
    let mut db = ctx.obra.open_database()?;
    let mut next = load_task(&db, &ctx.obra.id, id)?.toggled();
    next.updated_at_utc = Utc::now().timestamp();
    db.update_task(&next)?;
    let state = if next.is_fully_completed { "complete" } else { "incomplete" };
    println!("Task {} marked {}", id, state);
    Ok(())
}

/// Set or clear the non-completion cause of a task.
pub fn cmd_task_cause(ctx: &AppContext, id: u64, cause: String) -> Result<()> {
    let mut db = ctx.obra.open_database()?;
    let mut next = load_task(&db, &ctx.obra.id, id)?.with_cause(&cause);
    next.updated_at_utc = Utc::now().timestamp();
    db.update_task(&next)?;
    match next.cause_if_not_done {
        Some(c) => println!("Task {} cause: {}", id, c),
        None => println!("Task {} cause cleared", id),
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct CauseCount {
    pub cause: String,
    pub count: usize,
}

/// PCP figures for one obra and week, ready to print.
#[derive(Debug, Serialize)]
pub struct PcpReport {
    pub obra: String,
    pub week_start: NaiveDate,
    pub discipline: Option<String>,
    #[serde(flatten)]
    pub breakdown: PcpBreakdown,
    pub causes: Vec<CauseCount>,
}

/// Compute the PCP report for a week, optionally restricted to one discipline.
pub fn build_pcp_report<S: TaskStore + ?Sized>(
    store: &S,
    obra_id: &str,
    week_start: NaiveDate,
    discipline: Option<String>,
) -> Result<PcpReport> {
    let mut tasks = filter_tasks_by_week(&store.fetch_tasks(obra_id)?, week_start);
    if let Some(ref d) = discipline {
        tasks.retain(|t| &t.discipline == d);
    }
    Ok(PcpReport {
        obra: obra_id.to_string(),
        week_start,
        discipline,
        breakdown: breakdown(&tasks),
        causes: cause_ranking(&tasks)
            .into_iter()
            .map(|(cause, count)| CauseCount { cause, count })
            .collect(),
    })
}

/// Render a report as plain text.
pub fn render_pcp_report(report: &PcpReport, date_pattern: &str) -> String {
    let mut out = String::new();
    let week = safe_format_date(Some(&report.week_start.to_string()), date_pattern, "-");
    out.push_str(&format!("PCP {} - week of {}\n", report.obra, week));
    if let Some(ref d) = report.discipline {
        out.push_str(&format!("Discipline: {}\n", d));
    }
    let o = &report.breakdown.overall;
    out.push_str(&format!(
        "Overall: {}% ({}/{})\n",
        o.percentage, o.completed_tasks, o.total_tasks
    ));
    if !report.breakdown.disciplines.is_empty() {
        out.push_str("By discipline:\n");
        for d in &report.breakdown.disciplines {
            out.push_str(&format!(
                "  {:<20} {:>3}% ({}/{})\n",
                truncate(or_not_defined(&d.name), 20),
                d.percentage,
                d.completed_tasks,
                d.total_tasks
            ));
        }
    }
    if !report.causes.is_empty() {
        out.push_str("Causes of non-completion:\n");
        for c in &report.causes {
            out.push_str(&format!("  {:<30} {}\n", truncate(&c.cause, 30), c.count));
        }
    }
    out
}

/// Print the PCP report for a week.
pub fn cmd_pcp(
    ctx: &AppContext,
    week: Option<String>,
    discipline: Option<String>,
    json: bool,
) -> Result<()> {
    let week = resolve_week(week.as_deref(), Local::now().date_naive())?;
    let db = ctx.obra.open_database()?;
    let report = build_pcp_report(&db, &ctx.obra.id, week, discipline)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render_pcp_report(&report, &ctx.config.date_pattern));
    }
    Ok(())
}

/// List all distinct disciplines with task counts.
pub fn cmd_disciplines(ctx: &AppContext) -> Result<()> {
    let db = ctx.obra.open_database()?;
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for t in db.fetch_tasks(&ctx.obra.id)? {
        *counts.entry(or_not_defined(&t.discipline).to_string()).or_default() += 1;
    }
    println!("{:<20} {}", "Discipline", "Count");
    for (d, c) in counts {
        println!("{:<20} {}", truncate(&d, 20), c);
    }
    Ok(())
}

/// Handle material commands.
pub fn cmd_material(ctx: &AppContext, action: MaterialAction) -> Result<()> {
    let mut db = ctx.obra.open_database()?;
    match action {
        MaterialAction::Add { task_id, description, quantity, unit } => {
            let data = NewMaterial { task_id: Some(task_id), description, quantity, unit };
            let m = create_material(&mut db, data)?;
            println!("Added material {} to task {}", m.id, m.task_id);
        }
        MaterialAction::List { task_id } => {
            load_task(&db, &ctx.obra.id, task_id)?;
            let materials = db.list(task_id)?;
            if materials.is_empty() {
                println!("No materials for task {}.", task_id);
            }
            for m in materials {
                let quantity = format_quantity(m.quantity, m.unit.as_deref());
                println!("{:<5} {}{}", m.id, m.description, quantity);
            }
        }
        MaterialAction::Delete { id } => {
            db.delete(id)?;
            println!("Deleted material {}", id);
        }
    }
    Ok(())
}

/// Handle company commands.
pub fn cmd_company(ctx: &AppContext, action: CompanyAction) -> Result<()> {
    let mut dir = Directory::open(&ctx.data_dir)?;
    match action {
        CompanyAction::Add { name, email, phone } => {
            let c = dir.add_company(&name, email, phone)?;
            println!("Added company {} ({})", c.id, c.name);
        }
        CompanyAction::List => {
            println!("{:<5} {:<30} {:<28} {}", "ID", "Name", "Email", "Phone");
            for c in &dir.companies {
                println!(
                    "{:<5} {:<30} {:<28} {}",
                    c.id,
                    truncate(&c.name, 30),
                    c.email.as_deref().unwrap_or("-"),
                    c.phone.as_deref().map(format_phone).unwrap_or_else(|| "-".into())
                );
            }
        }
    }
    Ok(())
}

/// Handle user commands.
pub fn cmd_user(ctx: &AppContext, action: UserAction) -> Result<()> {
    let mut dir = Directory::open(&ctx.data_dir)?;
    match action {
        UserAction::Add { name, email, phone } => {
            let u = dir.add_user(&capitalize_words(&name), &email, phone)?;
            println!("Added user {} ({})", u.id, u.email);
        }
        UserAction::List => {
            println!("{:<5} {:<30} {:<28} {}", "ID", "Name", "Email", "Phone");
            for u in &dir.users {
                println!(
                    "{:<5} {:<30} {:<28} {}",
                    u.id,
                    truncate(&u.name, 30),
                    u.email,
                    u.phone.as_deref().map(format_phone).unwrap_or_else(|| "-".into())
                );
            }
        }
    }
    Ok(())
}

/// Report whether an email is registered and where.
pub fn cmd_email_check(ctx: &AppContext, email: String) -> Result<()> {
    let dir = Directory::open(&ctx.data_dir)?;
    let result = check_email_exists(&dir, &email);
    match result.source {
        Some(source) if result.exists => println!("{} is registered ({})", email.trim(), source),
        _ => println!("{} is not registered", email.trim()),
    }
    Ok(())
}

/// Import remote task rows into the current obra. Nothing is written if any row is invalid.
pub fn cmd_import(ctx: &AppContext, input: PathBuf) -> Result<()> {
    let json = std::fs::read_to_string(&input)?;
    let decoded = decode_tasks(&json, &ctx.obra.id)?;
    let before = decoded.len();
    // Rows may name the obra by display name ("Torre A") or by id ("torre_a").
    let tasks: Vec<Task> = decoded
        .into_iter()
        .filter(|t| sanitize_obra_name(&t.obra_id) == ctx.obra.id)
        .map(|t| Task { obra_id: ctx.obra.id.clone(), ..t })
        .collect();
    let skipped = before - tasks.len();
    if skipped > 0 {
        tracing::warn!(skipped, obra = %ctx.obra.id, "skipped rows belonging to other obras");
    }
    let mut db = ctx.obra.open_database()?;
    let (inserted, replaced) = db.upsert_all(tasks)?;
    println!(
        "Imported {} new and {} updated task(s) from {}",
        inserted,
        replaced,
        input.display()
    );
    if skipped > 0 {
        println!("Skipped {} row(s) belonging to other obras", skipped);
    }
    Ok(())
}

/// Quote a CSV field when it contains separators, quotes or newlines.
fn escape_csv(s: &str) -> String {
    if s.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Build CSV content for a set of tasks.
pub fn tasks_to_csv(tasks: &[Task]) -> String {
    let mut csv = String::from(
        "ID,Item,Description,Sector,Discipline,Team,Responsible,Executor,\
         Mon,Tue,Wed,Thu,Fri,Sat,Sun,Completed,Cause,WeekStart\n",
    );
    for t in tasks {
        let mut fields: Vec<String> = vec![
            t.id.to_string(),
            escape_csv(&t.item),
            escape_csv(&t.description),
            escape_csv(&t.sector),
            escape_csv(&t.discipline),
            escape_csv(&t.team),
            escape_csv(&t.responsible),
            escape_csv(&t.executor),
        ];
        for day in DayOfWeek::ALL {
            fields.push(t.status_on(day).map(format_task_status).unwrap_or("").to_string());
        }
        fields.push(if t.is_fully_completed { "yes".into() } else { "no".into() });
        fields.push(escape_csv(t.cause_if_not_done.as_deref().unwrap_or("")));
        fields.push(t.week_start_date.map(|d| d.to_string()).unwrap_or_default());
        csv.push_str(&fields.join(","));
        csv.push('\n');
    }
    csv
}

/// Export a week's tasks to a CSV file.
pub fn cmd_export(ctx: &AppContext, week: Option<String>, output: Option<String>) -> Result<()> {
    let week = resolve_week(week.as_deref(), Local::now().date_naive())?;
    let db = ctx.obra.open_database()?;
    let tasks = filter_tasks_by_week(&db.fetch_tasks(&ctx.obra.id)?, week);
    let output = output.unwrap_or_else(|| format!("pcp_{}_{}.csv", ctx.obra.id, week));
    std::fs::write(&output, tasks_to_csv(&tasks))?;
    println!("Exported {} task(s) to {}", tasks.len(), output);
    Ok(())
}

/// Generate shell completion scripts.
pub fn cmd_completions(shell: Shell) {
    use clap::CommandFactory;
    use crate::cli::Cli;

    let mut app = Cli::command();
    let app_name = app.get_name().to_string();
    generate(shell, &mut app, app_name, &mut std::io::stdout());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(tmp: &tempfile::TempDir) -> AppContext {
        AppContext::build(Some(tmp.path().to_path_buf()), Some("Torre A".into())).unwrap()
    }

    fn add_in_week(ctx: &AppContext, desc: &str, discipline: &str, week: &str) -> u64 {
        let discipline = Some(discipline.into());
        cmd_task_add(ctx, desc.into(), None, None, discipline, None, None, None, Some(week.into()))
            .unwrap()
    }

    fn add(ctx: &AppContext, desc: &str, discipline: &str) -> u64 {
        add_in_week(ctx, desc, discipline, "2024-03-13")
    }

    #[test]
    fn week_resolution() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 14).unwrap();
        let monday = NaiveDate::from_ymd_opt(2024, 3, 11).unwrap();
        assert_eq!(resolve_week(None, today).unwrap(), monday);
        assert!(matches!(resolve_week(Some("whenever"), today), Err(AppError::Validation(_))));
    }

    #[test]
    fn task_lifecycle_through_commands() {
        let tmp = tempfile::tempdir().unwrap();
        let ctx = ctx(&tmp);
        let id = add(&ctx, "Assentar blocos", "Civil");

        cmd_task_status(&ctx, id, DayOfWeek::Monday, TaskStatus::Done).unwrap();
        cmd_task_cause(&ctx, id, "Chuva".into()).unwrap();
        cmd_task_toggle(&ctx, id).unwrap();

        let db = ctx.obra.open_database().unwrap();
        let t = db.get(id).unwrap();
        assert_eq!(t.week_start_date, NaiveDate::from_ymd_opt(2024, 3, 11));
        assert_eq!(t.status_on(DayOfWeek::Monday), Some(TaskStatus::Done));
        assert_eq!(t.status_on(DayOfWeek::Tuesday), Some(TaskStatus::NotApplicable));
        assert_eq!(t.cause_if_not_done.as_deref(), Some("Chuva"));
        assert!(t.is_fully_completed);

        assert!(matches!(cmd_task_toggle(&ctx, 99), Err(AppError::NotFound { .. })));
    }

    #[test]
    fn blank_description_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let ctx = ctx(&tmp);
        let err = cmd_task_add(&ctx, "  ".into(), None, None, None, None, None, None, None);
        assert!(matches!(err, Err(AppError::Validation(_))));
        assert!(ctx.obra.open_database().unwrap().tasks.is_empty());
    }

    #[test]
    fn pcp_report_for_week_and_discipline() {
        let tmp = tempfile::tempdir().unwrap();
        let ctx = ctx(&tmp);
        let a = add(&ctx, "Eletrodutos", "Elétrica");
        add(&ctx, "Quadro", "Elétrica");
        let c = add(&ctx, "Reboco", "Civil");
        add(&ctx, "Contrapiso", "Civil");
        cmd_task_toggle(&ctx, a).unwrap();
        cmd_task_toggle(&ctx, c).unwrap();
        add_in_week(&ctx, "Outra semana", "Civil", "2024-03-20");

        let db = ctx.obra.open_database().unwrap();
        let week = NaiveDate::from_ymd_opt(2024, 3, 11).unwrap();
        let report = build_pcp_report(&db, &ctx.obra.id, week, None).unwrap();
        assert_eq!(report.breakdown.overall.total_tasks, 4);
        assert_eq!(report.breakdown.overall.percentage, 50);
        assert_eq!(report.breakdown.disciplines.len(), 2);

        let text = render_pcp_report(&report, "dd/MM/yyyy");
        assert!(text.contains("week of 11/03/2024"));
        assert!(text.contains("Overall: 50% (2/4)"));

        let civil = build_pcp_report(&db, &ctx.obra.id, week, Some("Civil".into())).unwrap();
        assert_eq!(civil.breakdown.overall.total_tasks, 2);
        assert_eq!(civil.breakdown.overall.completed_tasks, 1);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["overall"]["percentage"], 50);
    }

    #[test]
    fn materials_through_commands() {
        let tmp = tempfile::tempdir().unwrap();
        let ctx = ctx(&tmp);
        let id = add(&ctx, "Concretagem", "Civil");
        let brita = MaterialAction::Add {
            task_id: id,
            description: "Brita".into(),
            quantity: Some(3.0),
            unit: Some("m3".into()),
        };
        cmd_material(&ctx, brita).unwrap();
        let blank = MaterialAction::Add {
            task_id: id,
            description: "".into(),
            quantity: None,
            unit: None,
        };
        let err = cmd_material(&ctx, blank);
        assert!(matches!(err, Err(AppError::Validation(_))));
        assert_eq!(ctx.obra.open_database().unwrap().list(id).unwrap().len(), 1);
    }

    #[test]
    fn import_is_all_or_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let ctx = ctx(&tmp);
        let bad = tmp.path().join("bad.json");
        std::fs::write(
            &bad,
            r#"[{"id": 1, "description": "ok", "created_at": "2024-03-11"},
                {"description": "no id"}]"#,
        )
        .unwrap();
        assert!(cmd_import(&ctx, bad).is_err());
        assert!(ctx.obra.open_database().unwrap().tasks.is_empty());

        let good = tmp.path().join("good.json");
        std::fs::write(
            &good,
            r#"[{"id": 1, "description": "ok", "created_at": "2024-03-11",
                 "weekStartDate": "2024-03-11"},
                {"id": 2, "obraId": "outra", "description": "elsewhere",
                 "created_at": "2024-03-11"}]"#,
        )
        .unwrap();
        cmd_import(&ctx, good).unwrap();
        let db = ctx.obra.open_database().unwrap();
        assert_eq!(db.tasks.len(), 1);
        assert_eq!(db.tasks[0].obra_id, "torre_a");
    }

    #[test]
    fn import_accepts_obra_display_name() {
        let tmp = tempfile::tempdir().unwrap();
        let ctx = ctx(&tmp);
        let rows = tmp.path().join("rows.json");
        std::fs::write(
            &rows,
            r#"[{"id": 7, "obraId": "Torre A", "description": "Reboco",
                 "created_at": "2024-03-11"}]"#,
        )
        .unwrap();
        cmd_import(&ctx, rows).unwrap();
        let db = ctx.obra.open_database().unwrap();
        assert_eq!(db.tasks.len(), 1);
        assert_eq!(db.tasks[0].id, 7);
        assert_eq!(db.tasks[0].obra_id, "torre_a");
    }

    #[test]
    fn csv_quotes_fields() {
        let mut t = Task::new(1, "o", "Laje, 2º pavimento", 0).with_cause("Falta de \"aço\"");
        t.week_start_date = NaiveDate::from_ymd_opt(2024, 3, 11);
        let csv = tasks_to_csv(&[t]);
        let row = csv.lines().nth(1).unwrap();
        assert!(row.contains("\"Laje, 2º pavimento\""));
        assert!(row.contains("\"Falta de \"\"aço\"\"\""));
        assert!(row.ends_with(",no,\"Falta de \"\"aço\"\"\",2024-03-11"));
    }

    #[test]
    fn csv_quotes_carriage_returns() {
        assert_eq!(escape_csv("linha\rnova"), "\"linha\rnova\"");
        assert_eq!(escape_csv("simples"), "simples");
    }
}
