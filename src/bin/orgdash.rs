use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use orgdash::{AnalyticsAggregator, AnalyticsResult, Config, Forest, MetricSet, Role};

#[derive(Parser)]
#[command(name = "orgdash", about = "Hierarchy-scoped team analytics")]
struct Cli {
    /// Config file path (default: ~/.orgdash/config.json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Increase logging verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch every source and print the dashboard snapshot
    Report {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Metrics restricted to what a role may see
    Metrics {
        /// Role: ADMIN, CEO, MANAGER, TEAM_LEAD or MEMBER
        #[arg(long)]
        role: String,
        /// Id of the viewing user
        #[arg(long)]
        user: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Describe a role's data scope and dashboard metrics
    Scope {
        role: String,
    },
    /// List everyone who reports to a user, directly or indirectly
    Subordinates {
        user_id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the org chart
    Org,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Get a config value
    Get { key: String },
    /// Set a config value
    Set { key: String, value: String },
    /// List all config values
    List,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config_path = match cli.config {
        Some(path) => path,
        None => Config::default_path()?,
    };

    match cli.command {
        Commands::Config { action } => {
            handle_config(&config_path, action)?;
        }
        Commands::Scope { role } => {
            let role = Role::normalize(&role);
            println!("{role}");
            println!("  Scope:   {}", role.scope_description());
            println!("  Metrics:");
            for label in role.specific_metrics() {
                println!("    - {label}");
            }
        }
        command => {
            let mut config = Config::load_from(&config_path)?;
            config.apply_env();
            let aggregator = AnalyticsAggregator::from_config(&config)?;
            handle_live(&aggregator, command).await?;
        }
    }

    Ok(())
}

async fn handle_live(
    aggregator: &AnalyticsAggregator<orgdash::HttpApiClient>,
    command: Commands,
) -> anyhow::Result<()> {
    match command {
        Commands::Report { json } => {
            let result = aggregator.fetch_all().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&*result)?);
            } else {
                print_report(&result);
            }
        }
        Commands::Metrics { role, user, json } => {
            let role = Role::normalize(&role);
            let m = aggregator.scoped_metrics(role, &user).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&m)?);
            } else {
                print_metric_set(&m);
            }
        }
        Commands::Subordinates { user_id, json } => {
            let result = aggregator.fetch_all().await?;
            let users = result
                .users
                .data
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("User list unavailable: {}", result.users.error.as_deref().unwrap_or("unknown error")))?;
            let forest = Forest::build(users);
            if forest.get(&user_id).is_none() {
                anyhow::bail!("Unknown user: {user_id}");
            }
            let subs = forest.subordinates(&user_id);
            if json {
                println!("{}", serde_json::to_string_pretty(&subs)?);
            } else if subs.is_empty() {
                println!("{user_id} has no reports.");
            } else {
                println!("{} reports under {user_id}:", subs.len());
                for u in subs {
                    println!("  {} ({}) [{}]", u.name, u.role, u.id);
                }
            }
        }
        Commands::Org => {
            let result = aggregator.fetch_all().await?;
            let users = result
                .users
                .data
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("User list unavailable: {}", result.users.error.as_deref().unwrap_or("unknown error")))?;
            let forest = Forest::build(users);
            if forest.is_empty() {
                println!("No users.");
            }
            for line in forest.render_tree() {
                println!("{line}");
            }
        }
        Commands::Scope { .. } | Commands::Config { .. } => {}
    }
    Ok(())
}

fn handle_config(path: &Path, action: ConfigAction) -> anyhow::Result<()> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load_from(path)?;
            match config.get(&key)? {
                Some(v) => println!("{key} = {v}"),
                None => println!("{key} is not set"),
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load_from(path)?;
            config.set(&key, &value)?;
            config.save_to(path)?;
            println!("Set {key}");
        }
        ConfigAction::List => {
            let config = Config::load_from(path)?;
            for (key, value) in config.entries() {
                println!("{key} = {value}");
            }
        }
    }
    Ok(())
}

fn print_report(r: &AnalyticsResult) {
    println!("Dashboard ({})", r.created_at.format("%Y-%m-%d %H:%M UTC"));
    for source in r.failed_sources() {
        eprintln!("  warning: {source} unavailable");
    }

    if let Some(o) = r.overview.data.as_ref() {
        println!("  Overview:");
        println!("    Users:    {}", o.total_users);
        println!("    Projects: {}", o.total_projects);
        println!("    Tasks:    {}", o.total_tasks);
        println!("    Teams:    {}", o.total_teams);
    }

    if let Some(s) = r.task_stats.as_ref() {
        println!("  Tasks:");
        println!("    Total:       {}", s.total);
        println!("    Completed:   {} ({}%)", s.completed, s.completion_rate);
        println!("    In progress: {}", s.in_progress);
        println!("    Overdue:     {}", s.overdue);
        println!("  By status:");
        for b in &s.status_histogram {
            println!("    {:<14} {}", b.name, b.value);
        }
    }

    if let Some(progress) = r.project_progress.as_ref() {
        println!("  Projects:");
        for p in progress {
            println!("    {:<24} {}/{} ({}%)", p.name, p.completed, p.total, p.percentage);
        }
    }

    if let Some(series) = r.activity.as_ref() {
        println!("  Activity:");
        println!("    {:<8} {:>7} {:>9} {:>6}", "Day", "Created", "Completed", "Active");
        for p in series {
            println!("    {:<8} {:>7} {:>9} {:>6}", p.label, p.created, p.completed, p.active_users);
        }
    }

    if let Some(users) = r.user_performance.as_ref() {
        println!("  People:");
        for u in users.iter().filter(|u| u.assigned > 0) {
            println!(
                "    {:<24} {}/{} done, {} overdue ({}%)",
                u.name, u.completed, u.assigned, u.overdue, u.completion_rate
            );
        }
    }

    if let Some(teams) = r.team_performance.as_ref() {
        println!("  Teams:");
        for t in teams {
            println!(
                "    {:<24} {}/{} done, {} overdue ({}%)",
                t.name, t.completed, t.total_tasks, t.overdue, t.completion_rate
            );
        }
    }
}

fn print_metric_set(m: &MetricSet) {
    println!("Metrics: {} as {}", m.user_id, m.role);
    match m.users_in_scope {
        Some(n) => println!("  Users in scope: {n}"),
        None => println!("  Users in scope: everyone"),
    }
    println!("  Tasks:       {}", m.total_tasks);
    println!("  Completed:   {} ({}%)", m.completed_tasks, m.completion_rate);
    println!("  Overdue:     {}", m.overdue_count);
    println!("  Escalations: {}", m.escalation_count);
    println!("  Projects:    {}", m.project_count);
    println!("  Teams:       {}", m.team_count);
    if !m.labels.is_empty() {
        println!("  Dashboard: {}", m.labels.join(", "));
    }
}
