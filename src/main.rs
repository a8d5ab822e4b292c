use clap::Parser;
use tracing_subscriber::EnvFilter;

use obra_pcp::cli::Cli;
use obra_pcp::cmd::*;
use obra_pcp::config::AppContext;
use obra_pcp::Result;

fn main() {
    // Logs go to stderr so reports on stdout stay clean.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    // Completions don't need a data directory.
    if let Commands::Completions { shell } = cli.command {
        cmd_completions(shell);
        return;
    }

    if let Err(e) = run(cli) {
        tracing::error!(error = %e, "command failed");
        eprintln!("{e}");
        std::process::exit(if e.is_user_error() { 2 } else { 1 });
    }
}

fn run(cli: Cli) -> Result<()> {
    let ctx = AppContext::build(cli.data_dir, cli.obra)?;

    match cli.command {
        Commands::Completions { .. } => unreachable!("completions handled before context setup"),

        Commands::Obras => cmd_obras(&ctx),

        Commands::Task { action } => match action {
            TaskAction::Add {
                description,
                item,
                sector,
                discipline,
                team,
                responsible,
                executor,
                week,
            } => cmd_task_add(
                &ctx,
                description,
                item,
                sector,
                discipline,
                team,
                responsible,
                executor,
                week,
            )
            .map(|_| ()),
            TaskAction::List { week, all_weeks, discipline, pending } => {
                cmd_task_list(&ctx, week, all_weeks, discipline, pending)
            }
            TaskAction::View { id } => cmd_task_view(&ctx, id),
            TaskAction::Status { id, day, status } => cmd_task_status(&ctx, id, day, status),
            TaskAction::Toggle { id } => cmd_task_toggle(&ctx, id),
            TaskAction::Cause { id, cause } => cmd_task_cause(&ctx, id, cause),
        },

        Commands::Pcp { week, discipline, json } => cmd_pcp(&ctx, week, discipline, json),

        Commands::Disciplines => cmd_disciplines(&ctx),

        Commands::Material { action } => cmd_material(&ctx, action),

        Commands::Company { action } => cmd_company(&ctx, action),

        Commands::User { action } => cmd_user(&ctx, action),

        Commands::EmailCheck { email } => cmd_email_check(&ctx, email),

        Commands::Import { input } => cmd_import(&ctx, input),

        Commands::Export { week, output } => cmd_export(&ctx, week, output),
    }
}
