// CLI module - command-line argument parsing and handlers
//
// Every page of the web front-end has a subcommand here. Handlers drive
// the `App` controller and print results; notifications queued by the
// controller are printed by main after the handler returns.

use anyhow::{anyhow, bail, Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use std::process::Command;
use unicode_width::UnicodeWidthStr;

use crate::analysis::{AnalysisOutcome, Classification, PredictionSource};
use crate::app::App;
use crate::auth::validation::age_on;
use crate::auth::{PasswordStrength, SignupForm};
use crate::charts::{DistributionChart, RiskGauge};
use crate::config::{Config, VERSION};
use crate::logging::LogBuffer;
use crate::notify::{dim, heading};
use crate::stats::{insights, DashboardStats, Period};
use crate::store::Analysis;
use crate::util::{format_date, initials, truncate_file_name, FILE_NAME_WIDTH};

/// ParkinsonDetect - motion-pattern screening from the terminal
#[derive(Parser)]
#[command(name = "pdetect")]
#[command(version = VERSION)]
#[command(
    about = "Submit wearable motion recordings for Parkinson's screening and track results",
    long_about = None
)]
pub struct Cli {
    /// Defaults to the dashboard
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create an account (logs in and remembers the session)
    Signup {
        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        email: Option<String>,

        /// Date of birth
        #[arg(long, value_name = "YYYY-MM-DD")]
        dob: Option<String>,

        /// Optional medical record identifier
        #[arg(long)]
        medical_id: Option<String>,

        /// Password (prompted when omitted)
        #[arg(long)]
        password: Option<String>,

        /// Accept the terms of use without prompting
        #[arg(long)]
        accept_terms: bool,
    },

    /// Log in
    Login {
        #[arg(long)]
        email: Option<String>,

        /// Password (prompted when omitted)
        #[arg(long)]
        password: Option<String>,

        /// Keep the session across reboots
        #[arg(long)]
        remember: bool,
    },

    /// Log out and forget the stored session
    Logout,

    /// Show the logged-in user
    Whoami,

    /// Edit profile details
    Profile {
        #[arg(long)]
        name: Option<String>,

        #[arg(long, conflicts_with = "clear_medical_id")]
        medical_id: Option<String>,

        /// Remove the stored medical identifier
        #[arg(long)]
        clear_medical_id: bool,
    },

    /// Submit a .zip recording for analysis
    Analyze {
        /// Recording archive (.zip, at most 50 MB)
        file: PathBuf,

        /// Save the result to your history
        #[arg(long)]
        save: bool,

        /// Write a JSON report of the result
        #[arg(long, value_name = "PATH")]
        report: Option<PathBuf>,
    },

    /// List saved analyses
    History {
        #[arg(long, value_enum, default_value_t = Period::All)]
        period: Period,
    },

    /// Summary statistics and insights
    Stats {
        #[arg(long, value_enum, default_value_t = Period::All)]
        period: Period,

        /// Print the statistics as JSON
        #[arg(long)]
        json: bool,
    },

    /// Open the terminal dashboard
    Dashboard {
        #[arg(long, value_enum)]
        period: Option<Period>,
    },

    /// Write reports and data exports
    Export {
        #[command(subcommand)]
        target: ExportTarget,
    },

    /// Delete every saved analysis
    ClearHistory {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// Delete the account and its analyses
    DeleteAccount {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// Change the account password
    Password {
        /// Current password (prompted when omitted)
        #[arg(long)]
        current: Option<String>,

        /// New password (prompted with confirmation when omitted)
        #[arg(long)]
        new: Option<String>,
    },

    /// Manage configuration
    Config(ConfigArgs),
}

impl Commands {
    /// Whether this command takes over the terminal
    pub fn is_dashboard(&self) -> bool {
        matches!(self, Self::Dashboard { .. })
    }
}

impl Default for Commands {
    fn default() -> Self {
        Self::Dashboard { period: None }
    }
}

#[derive(Subcommand)]
pub enum ExportTarget {
    /// JSON report of a saved analysis (the latest when no id is given)
    Report {
        id: Option<String>,

        #[arg(long, value_name = "PATH")]
        out: Option<PathBuf>,
    },

    /// Profile, analyses and statistics as JSON
    Profile {
        #[arg(long, value_name = "PATH")]
        out: Option<PathBuf>,
    },

    /// Analysis history as CSV
    History {
        #[arg(long, value_enum, default_value_t = Period::All)]
        period: Period,

        #[arg(long, value_name = "PATH")]
        out: Option<PathBuf>,
    },
}

#[derive(Args)]
pub struct ConfigArgs {
    /// Show effective configuration
    #[arg(long)]
    show: bool,

    /// Reset config file to defaults
    #[arg(long)]
    reset: bool,

    /// Open config file in $EDITOR
    #[arg(long)]
    edit: bool,

    /// Update config with new defaults (preserves user values)
    #[arg(long)]
    update: bool,

    /// Show config file path
    #[arg(long)]
    path: bool,
}

// ─────────────────────────────────────────────────────────────────────────────
// Dispatch
// ─────────────────────────────────────────────────────────────────────────────

/// Run one command against the controller
pub async fn run(command: Commands, app: &mut App, logs: LogBuffer) -> Result<()> {
    match command {
        Commands::Signup {
            name,
            email,
            dob,
            medical_id,
            password,
            accept_terms,
        } => handle_signup(app, name, email, dob, medical_id, password, accept_terms),
        Commands::Login {
            email,
            password,
            remember,
        } => handle_login(app, email, password, remember),
        Commands::Logout => Ok(app.logout()?),
        Commands::Whoami => handle_whoami(app),
        Commands::Profile {
            name,
            medical_id,
            clear_medical_id,
        } => handle_profile(app, name, medical_id, clear_medical_id),
        Commands::Analyze { file, save, report } => {
            handle_analyze(app, file, save, report).await
        }
        Commands::History { period } => handle_history(app, period),
        Commands::Stats { period, json } => handle_stats(app, period, json),
        Commands::Dashboard { period } => {
            let period = period.unwrap_or(app.config().dashboard.default_period);
            crate::tui::run_dashboard(app, logs, period).await
        }
        Commands::Export { target } => handle_export(app, target),
        Commands::ClearHistory { yes } => handle_clear_history(app, yes),
        Commands::DeleteAccount { yes } => handle_delete_account(app, yes),
        Commands::Password { current, new } => handle_password(app, current, new),
        Commands::Config(args) => {
            handle_config(&args);
            Ok(())
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Prompts
// ─────────────────────────────────────────────────────────────────────────────

fn prompt(label: &str) -> Result<String> {
    eprint!("{}: ", label);
    io::stderr().flush()?;

    let mut input = String::new();
    let read = io::stdin()
        .read_line(&mut input)
        .context("Failed to read from stdin")?;
    if read == 0 {
        bail!("No input for '{}'", label);
    }
    Ok(input.trim_end_matches(['\r', '\n']).to_string())
}

/// Use the flag value or ask for it
fn value_or_prompt(value: Option<String>, label: &str) -> Result<String> {
    match value {
        Some(v) => Ok(v),
        None => prompt(label),
    }
}

fn confirm(question: &str) -> Result<bool> {
    let answer = prompt(&format!("{} [y/N]", question))?;
    Ok(answer.trim().eq_ignore_ascii_case("y"))
}

fn print_strength(password: &str) {
    let strength = PasswordStrength::evaluate(password);
    eprintln!(
        "  Strength: {} ({}%){}",
        strength.level.as_str(),
        strength.score,
        if strength.missing.is_empty() {
            String::new()
        } else {
            format!(" - {}", strength.describe())
        }
    );
}

/// Pad to `width` display columns
fn pad(text: &str, width: usize) -> String {
    let fill = width.saturating_sub(text.width());
    format!("{}{}", text, " ".repeat(fill))
}

fn color_stdout() -> bool {
    io::stdout().is_terminal()
}

// ─────────────────────────────────────────────────────────────────────────────
// Accounts
// ─────────────────────────────────────────────────────────────────────────────

fn handle_signup(
    app: &mut App,
    name: Option<String>,
    email: Option<String>,
    dob: Option<String>,
    medical_id: Option<String>,
    password: Option<String>,
    accept_terms: bool,
) -> Result<()> {
    let name = value_or_prompt(name, "Full name")?;
    let email = value_or_prompt(email, "Email")?;
    let date_of_birth = value_or_prompt(dob, "Date of birth (YYYY-MM-DD)")?;
    let medical_id = match medical_id {
        Some(id) => Some(id),
        None if io::stdin().is_terminal() => {
            Some(prompt("Medical ID (optional)")?).filter(|id| !id.trim().is_empty())
        }
        None => None,
    };

    let (password, confirm_password) = match password {
        Some(p) => (p.clone(), p),
        None => {
            let p = prompt("Password")?;
            print_strength(&p);
            (p, prompt("Confirm password")?)
        }
    };

    let accepted_terms =
        accept_terms || confirm("Do you accept the terms of use and privacy policy?")?;

    let form = SignupForm {
        name,
        email,
        date_of_birth,
        password,
        confirm_password,
        accepted_terms,
        medical_id,
    };
    let user = app.signup(&form)?;
    println!("  Logged in as {} <{}>", user.name, user.email);
    Ok(())
}

fn handle_login(
    app: &mut App,
    email: Option<String>,
    password: Option<String>,
    remember: bool,
) -> Result<()> {
    let email = value_or_prompt(email, "Email")?;
    let password = value_or_prompt(password, "Password")?;
    app.login(&email, &password, remember)?;
    Ok(())
}

fn handle_whoami(app: &App) -> Result<()> {
    let color = color_stdout();
    let Some(session) = app.state().session.clone() else {
        println!("Not logged in. Run `pdetect login` or `pdetect signup`.");
        return Ok(());
    };
    let user = &session.user;
    let today = Utc::now().date_naive();

    println!(
        "{}",
        heading(&format!("[{}] {}", initials(&user.name), user.name), color)
    );
    let rows = [
        ("Email", user.email.clone()),
        ("Age", age_on(user.date_of_birth, today).to_string()),
        ("Member since", format_date(user.join_date)),
        (
            "Medical ID",
            user.medical_id.clone().unwrap_or_else(|| "-".to_string()),
        ),
        ("Analyses", user.profile.total_analyses.to_string()),
        (
            "Average score",
            if user.profile.total_analyses > 0 {
                format!("{:.3}", user.profile.average_score)
            } else {
                "-".to_string()
            },
        ),
        (
            "Session",
            format!(
                "{} until {}",
                session.scope().as_str(),
                session.expires_at.format("%Y-%m-%d %H:%M UTC")
            ),
        ),
    ];
    for (label, value) in rows {
        println!("  {} {}", dim(&pad(label, 14), color), value);
    }
    Ok(())
}

fn handle_profile(
    app: &mut App,
    name: Option<String>,
    medical_id: Option<String>,
    clear_medical_id: bool,
) -> Result<()> {
    let medical_id = if clear_medical_id {
        Some(None)
    } else {
        medical_id.map(Some)
    };
    if name.is_none() && medical_id.is_none() {
        bail!("Nothing to update (use --name, --medical-id or --clear-medical-id)");
    }
    app.update_profile(name, medical_id)?;
    Ok(())
}

fn handle_password(app: &mut App, current: Option<String>, new: Option<String>) -> Result<()> {
    app.current_user()?;
    let current = value_or_prompt(current, "Current password")?;
    let (new_password, confirm_password) = match new {
        Some(p) => (p.clone(), p),
        None => {
            let p = prompt("New password")?;
            print_strength(&p);
            (p, prompt("Confirm new password")?)
        }
    };
    app.change_password(&current, &new_password, &confirm_password)?;
    Ok(())
}

fn handle_delete_account(app: &mut App, yes: bool) -> Result<()> {
    let user = app.current_user()?.clone();
    if !yes
        && !confirm(&format!(
            "Delete the account {} and all its analyses?",
            user.email
        ))?
    {
        println!("Aborted.");
        return Ok(());
    }
    app.delete_account()?;
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Analysis
// ─────────────────────────────────────────────────────────────────────────────

fn format_size(bytes: u64) -> String {
    match bytes {
        0..=1023 => format!("{} B", bytes),
        1024..=1_048_575 => format!("{:.1} KB", bytes as f64 / 1024.0),
        _ => format!("{:.1} MB", bytes as f64 / 1_048_576.0),
    }
}

fn print_outcome(outcome: &AnalysisOutcome) {
    let color = color_stdout();
    let title = if outcome.is_demo() {
        "Analysis complete (demo data)"
    } else {
        "Analysis complete"
    };
    println!("{}", heading(title, color));

    let rows = [
        (
            "File",
            format!(
                "{} ({})",
                truncate_file_name(&outcome.file_name, FILE_NAME_WIDTH),
                format_size(outcome.file_size)
            ),
        ),
        (
            "Score",
            format!(
                "{:.4} (threshold {:.4})",
                outcome.prediction.score, outcome.prediction.threshold
            ),
        ),
        ("Result", outcome.classification.headline().to_string()),
        ("Windows", outcome.prediction.windows.to_string()),
        (
            "Time",
            format!("{:.2} s", outcome.elapsed_ms as f64 / 1000.0),
        ),
    ];
    for (label, value) in rows {
        println!("  {} {}", dim(&pad(label, 10), color), value);
    }
    if let Some(cause) = &outcome.fallback_cause {
        println!("  {} {}", dim(&pad("Cause", 10), color), cause);
    }
}

async fn handle_analyze(
    app: &mut App,
    file: PathBuf,
    save: bool,
    report: Option<PathBuf>,
) -> Result<()> {
    app.current_user()?;
    let upload = app.select_file(&file)?;
    eprintln!(
        "  Uploading {} ({})...",
        upload.file_name,
        format_size(upload.size)
    );

    let outcome = app.analyze().await?;
    print_outcome(&outcome);

    if save {
        app.save_result()?;
    }
    if let Some(path) = report {
        app.export_report(None, Some(&path))?;
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// History and statistics
// ─────────────────────────────────────────────────────────────────────────────

fn print_history(analyses: &[Analysis]) {
    let color = color_stdout();
    println!(
        "{}",
        heading(
            &format!(
                "  {} {} {} {} {} {}",
                pad("Date", 10),
                pad("File", FILE_NAME_WIDTH),
                pad("Score", 8),
                pad("Result", 8),
                pad("Win", 4),
                "Id"
            ),
            color
        )
    );
    // Newest first, as in the history table
    for analysis in analyses.iter().rev() {
        let windows = if analysis.windows > 0 {
            analysis.windows.to_string()
        } else {
            "-".to_string()
        };
        let result = if analysis.source == PredictionSource::Demo {
            format!("{}*", analysis.result.as_str())
        } else {
            analysis.result.as_str().to_string()
        };
        println!(
            "  {} {} {} {} {} {}",
            pad(&format_date(analysis.timestamp), 10),
            pad(
                &truncate_file_name(&analysis.file_name, FILE_NAME_WIDTH),
                FILE_NAME_WIDTH
            ),
            pad(&format!("{:.3}", analysis.score), 8),
            pad(&result, 8),
            pad(&windows, 4),
            dim(&analysis.id, color)
        );
    }
    if analyses
        .iter()
        .any(|a| a.source == PredictionSource::Demo)
    {
        println!("  {}", dim("* demo result", color));
    }
}

fn handle_history(app: &App, period: Period) -> Result<()> {
    let analyses = app.history(period)?;
    if analyses.is_empty() {
        println!("No analyses ({}).", period.label());
        return Ok(());
    }
    print_history(&analyses);
    Ok(())
}

fn print_stats(stats: &DashboardStats, analyses: &[Analysis], period: Period) {
    let color = color_stdout();
    println!("{}", heading(&format!("Statistics - {}", period.label()), color));

    let trend = match stats.score_trend {
        Some(trend) => format!("{} ({:+.1}%)", trend.label(), stats.trend_percent),
        None => "-".to_string(),
    };
    let mut rows = vec![
        ("Analyses", stats.total_analyses.to_string()),
        ("This month", stats.this_month.to_string()),
        ("Average score", format!("{:.3}", stats.average_score)),
        (
            "Healthy",
            format!("{} ({}%)", stats.healthy_count, stats.healthy_percent),
        ),
        (
            "At risk",
            format!("{} ({}%)", stats.at_risk_count, stats.at_risk_percent),
        ),
        (
            "Lowest score",
            stats
                .lowest_score
                .map(|s| format!("{:.3}", s))
                .unwrap_or_else(|| "-".to_string()),
        ),
        (
            "Last analysis",
            stats
                .last_analysis
                .map(format_date)
                .unwrap_or_else(|| "-".to_string()),
        ),
        ("Trend", trend),
    ];
    if let Some(summary) = &stats.summary {
        rows.push(("Consistency", format!("{:.0}%", summary.consistency_score())));
    }
    if let Some(gauge) = RiskGauge::from_history(analyses) {
        rows.push((
            "Latest",
            format!("{} ({:.0}% of threshold)", gauge.status(), gauge.percent),
        ));
    }
    for (label, value) in rows {
        println!("  {} {}", dim(&pad(label, 14), color), value);
    }

    let distribution = DistributionChart::from_history(analyses);
    if distribution.total() > 0 {
        println!(
            "  {} healthy {:.1}% / at risk {:.1}%",
            dim(&pad("Distribution", 14), color),
            distribution.percent(Classification::Healthy),
            distribution.percent(Classification::AtRisk)
        );
    }

    println!();
    println!("{}", heading("Insights", color));
    for insight in insights(analyses) {
        println!("  - {}", insight.message);
    }
}

fn handle_stats(app: &App, period: Period, json: bool) -> Result<()> {
    let analyses = app.history(period)?;
    let stats = DashboardStats::compute(&analyses, Utc::now());
    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        print_stats(&stats, &analyses, period);
    }
    Ok(())
}

fn handle_clear_history(app: &mut App, yes: bool) -> Result<()> {
    app.current_user()?;
    if !yes && !confirm("Delete every saved analysis?")? {
        println!("Aborted.");
        return Ok(());
    }
    app.clear_history()?;
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Exports
// ─────────────────────────────────────────────────────────────────────────────

fn handle_export(app: &mut App, target: ExportTarget) -> Result<()> {
    match target {
        ExportTarget::Report { id, out } => {
            let id = match id {
                Some(id) => id,
                None => app
                    .history(Period::All)?
                    .last()
                    .map(|a| a.id.clone())
                    .ok_or_else(|| anyhow!("No saved analyses to report on"))?,
            };
            app.export_report(Some(&id), out.as_deref())?;
        }
        ExportTarget::Profile { out } => {
            app.export_profile(out.as_deref())?;
        }
        ExportTarget::History { period, out } => {
            app.export_history(period, out.as_deref())?;
        }
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Config
// ─────────────────────────────────────────────────────────────────────────────

/// Handle `pdetect config`. Runs before the config is loaded so a broken
/// file can still be reset.
pub fn handle_config(args: &ConfigArgs) {
    if args.path {
        handle_config_path();
    } else if args.show {
        handle_config_show();
    } else if args.reset {
        handle_config_reset();
    } else if args.edit {
        handle_config_edit();
    } else if args.update {
        handle_config_update();
    } else {
        println!("Usage: pdetect config [--show|--reset|--edit|--update|--path]");
        println!();
        println!("Options:");
        println!("  --show    Display effective configuration");
        println!("  --reset   Reset config file to defaults");
        println!("  --edit    Open config file in $EDITOR");
        println!("  --update  Update config with new defaults (preserves user values)");
        println!("  --path    Show config file path");
    }
}

fn handle_config_path() {
    match Config::config_path() {
        Some(path) => println!("{}", path.display()),
        None => {
            eprintln!("Error: Could not determine config path");
            std::process::exit(1);
        }
    }
}

fn handle_config_show() {
    let config = Config::from_env();

    println!("# Effective configuration (env > file > defaults)");
    println!();
    println!("[api]");
    println!("predict_url = {:?}", config.api.predict_url());
    println!("timeout_secs = {}", config.api.timeout_secs);
    println!(
        "token = {}",
        if config.api.token.is_some() {
            "\"<set>\""
        } else {
            "\"<unset>\""
        }
    );
    println!("demo_fallback = {}", config.api.demo_fallback);
    println!("demo_delay_ms = {}", config.api.demo_delay_ms);
    println!();
    println!("[storage]");
    println!(
        "data_dir = {:?}",
        config.storage.data_dir.display().to_string()
    );
    if let Some(seed) = &config.storage.seed_dir {
        println!("seed_dir = {:?}", seed.display().to_string());
    }
    println!();
    println!("[session]");
    println!("ephemeral_hours = {}", config.session.ephemeral_hours);
    println!();
    println!("[security]");
    println!("pbkdf2_iterations = {}", config.security.pbkdf2_iterations);
    println!();
    println!("[logging]");
    println!("level = {:?}", config.logging.level);
    println!("file_enabled = {}", config.logging.file_enabled);
    println!();
    println!("[dashboard]");
    println!("default_period = {:?}", config.dashboard.default_period.as_str());
    println!("tick_ms = {}", config.dashboard.tick_ms);

    println!();
    if let Some(path) = Config::config_path() {
        if path.exists() {
            println!("# Source: {}", path.display());
        } else {
            println!("# Source: defaults (no config file)");
        }
    }
}

fn handle_config_reset() {
    let Some(path) = Config::config_path() else {
        eprintln!("Error: Could not determine config path");
        std::process::exit(1);
    };

    if path.exists() {
        match confirm(&format!(
            "Config file exists at {}. Overwrite?",
            path.display()
        )) {
            Ok(true) => {}
            Ok(false) => {
                println!("Aborted.");
                return;
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    }

    if let Err(e) = Config::default().save() {
        eprintln!("Error writing config: {}", e);
        std::process::exit(1);
    }

    println!("Config reset to defaults: {}", path.display());
}

fn handle_config_edit() {
    let Some(path) = Config::config_path() else {
        eprintln!("Error: Could not determine config path");
        std::process::exit(1);
    };

    if !path.exists() {
        Config::ensure_config_exists();
        println!("Created new config file: {}", path.display());
    }

    let editor = std::env::var("EDITOR")
        .or_else(|_| std::env::var("VISUAL"))
        .unwrap_or_else(|_| {
            if cfg!(windows) {
                "notepad".to_string()
            } else {
                "nano".to_string()
            }
        });

    println!("Opening {} with {}", path.display(), editor);

    match Command::new(&editor).arg(&path).status() {
        Ok(s) if s.success() => {}
        Ok(s) => {
            eprintln!("Editor exited with status: {}", s);
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Failed to launch editor '{}': {}", editor, e);
            eprintln!("Set $EDITOR environment variable to your preferred editor");
            std::process::exit(1);
        }
    }
}

fn handle_config_update() {
    let Some(path) = Config::config_path() else {
        eprintln!("Error: Could not determine config path");
        std::process::exit(1);
    };

    if !path.exists() {
        Config::ensure_config_exists();
        println!("Created new config file: {}", path.display());
        return;
    }

    let backup_path = path.with_extension("toml.bak");
    if let Err(e) = std::fs::copy(&path, &backup_path) {
        eprintln!("Warning: Could not create backup: {}", e);
    } else {
        println!("Backup created: {}", backup_path.display());
    }

    // File values only; PDETECT_* overrides stay in the environment
    if let Err(e) = Config::from_config_file().save() {
        eprintln!("Error writing config: {}", e);
        std::process::exit(1);
    }

    println!("Config updated with latest structure: {}", path.display());
    println!("Your values have been preserved.");
}
