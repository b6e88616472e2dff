mod api;
mod browser;
mod card;
mod config;
mod format;
mod logging;
mod models;
mod skills;
mod tui;
mod view;

use anyhow::{anyhow, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Instant;

use api::{HttpApi, SavedJobsApi};
use card::JobCard;
use config::Config;
use models::SortKey;
use view::{BannerKind, SavedJobsView, NOTES_PLACEHOLDER};

#[derive(Parser)]
#[command(name = "shortlist")]
#[command(about = "Review, annotate, and prune your saved job postings")]
struct Cli {
    /// Path to config file (defaults to the per-user config location)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config file
    Init,

    /// List saved jobs
    List {
        /// Case-insensitive filter on title, company or notes
        #[arg(short, long)]
        query: Option<String>,

        /// Sort order
        #[arg(short, long, value_enum)]
        sort: Option<SortKey>,
    },

    /// Show one saved job as a card
    Show {
        /// Saved record ID
        record_id: String,
    },

    /// Remove a job from saved
    Unsave {
        /// Job ID (not the record ID)
        job_id: String,
    },

    /// Replace the notes on a saved job
    Notes {
        /// Saved record ID
        record_id: String,

        /// New notes text (empty clears them)
        text: String,
    },

    /// Remove several saved jobs at once
    Remove {
        /// Saved record IDs
        #[arg(required = true)]
        record_ids: Vec<String>,
    },

    /// Interactive terminal browser
    Browse {
        /// Initial filter
        #[arg(short, long)]
        query: Option<String>,

        /// Initial sort order
        #[arg(short, long, value_enum)]
        sort: Option<SortKey>,
    },
}

/// Prints a success banner; turns an error banner into a failing exit.
fn finish<A: SavedJobsApi>(view: &SavedJobsView<A>) -> Result<()> {
    match view.banner(Instant::now()) {
        Some(banner) if banner.kind == BannerKind::Error => Err(anyhow!("{}", banner.text)),
        Some(banner) => {
            println!("{}", banner.text);
            Ok(())
        }
        None => Ok(()),
    }
}

async fn open_view(cfg: &Config, sort: Option<SortKey>) -> Result<SavedJobsView<HttpApi>> {
    let api = HttpApi::new(cfg)?;
    let mut view = SavedJobsView::new(api, sort.unwrap_or(cfg.ui.default_sort), cfg.banner_ttl());
    view.load().await;
    // A failed load leaves an error banner and nothing to act on
    if let Some(banner) = view.banner(Instant::now()) {
        if banner.kind == BannerKind::Error {
            return Err(anyhow!("{}", banner.text));
        }
    }
    Ok(view)
}

fn print_list<A: SavedJobsApi>(view: &SavedJobsView<A>) {
    println!("{}", view.header());
    if let Some(empty) = view.empty_state() {
        println!("{}", empty.title);
        println!("{}", empty.hint);
        return;
    }

    println!("{:<26} {:<32} {:<22} {:<12}", "ID", "TITLE", "COMPANY", "SAVED");
    println!("{}", "-".repeat(94));
    for record in view.state().filtered() {
        println!(
            "{:<26} {:<32} {:<22} {:<12}",
            format::truncate(&record.id, 24),
            format::truncate(record.job_data.title(), 30),
            format::truncate(record.job_data.employer(), 20),
            record.saved_at.format("%Y-%m-%d")
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Init = cli.command {
        let path = cli.config.clone().unwrap_or_else(Config::default_path);
        if Config::write_default(&path)? {
            println!("Config written to {}", path.display());
        } else {
            println!("Config already exists at {}", path.display());
        }
        println!(
            "Add your session token there or export {}.",
            config::SESSION_TOKEN_ENV
        );
        return Ok(());
    }

    let cfg = Config::resolve(cli.config.as_deref())?;
    let log_file = matches!(cli.command, Commands::Browse { .. })
        .then(|| Config::data_dir().join("shortlist.log"));
    logging::init(&cfg, cli.log_level.as_deref(), log_file.as_deref())?;

    match cli.command {
        // Written before any config is resolved
        Commands::Init => {}

        Commands::List { query, sort } => {
            let mut view = open_view(&cfg, sort).await?;
            if let Some(query) = query {
                view.set_query(query);
            }
            print_list(&view);
        }

        Commands::Show { record_id } => {
            let view = open_view(&cfg, None).await?;
            let record = view
                .state()
                .record(&record_id)
                .ok_or_else(|| anyhow!("Saved job '{}' not found", record_id))?;

            let card = JobCard::new(record.job_data.clone())
                .saved(true)
                .show_match_score(cfg.ui.show_match_score);
            println!("{}", tui::card_text(&card.view(Utc::now())));
            if let Some(link) = &record.job_data.job_apply_link {
                println!("Apply: {}", link);
            }
            println!();
            println!("Notes:");
            match record.notes.as_deref().filter(|n| !n.is_empty()) {
                Some(notes) => println!("{}", notes),
                None => println!("{}", NOTES_PLACEHOLDER),
            }
            println!();
            println!("{}", format::saved_at(record.saved_at));
        }

        Commands::Unsave { job_id } => {
            let mut view = open_view(&cfg, None).await?;
            view.unsave(&job_id).await;
            finish(&view)?;
        }

        Commands::Notes { record_id, text } => {
            let mut view = open_view(&cfg, None).await?;
            if view.state().record(&record_id).is_none() {
                return Err(anyhow!("Saved job '{}' not found", record_id));
            }
            view.update_notes(&record_id, &text).await;
            finish(&view)?;
        }

        Commands::Remove { record_ids } => {
            let mut view = open_view(&cfg, None).await?;
            for record_id in &record_ids {
                if view.state().record(record_id).is_none() {
                    return Err(anyhow!("Saved job '{}' not found", record_id));
                }
                if !view.state().is_selected(record_id) {
                    view.toggle_selection(record_id);
                }
            }
            println!("{}", view.selection_summary());
            let outcome = view.bulk_delete().await;
            for job_id in &outcome.failed {
                eprintln!("  failed: job {}", job_id);
            }
            finish(&view)?;
        }

        Commands::Browse { query, sort } => {
            let mut view = open_view(&cfg, sort).await?;
            if let Some(query) = query {
                view.set_query(query);
            }
            tui::run_browse(view, &cfg.ui).await?;
        }
    }

    Ok(())
}
