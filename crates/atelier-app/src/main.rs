//! Atelier application binary - composition root.
//!
//! Ties the crates together into a single executable:
//! 1. Parse CLI arguments and resolve the configuration
//! 2. Initialize tracing
//! 3. Open the SQLite database and run migrations
//! 4. Build the shared repository facade
//! 5. Dispatch the requested inspection command

mod cli;

use std::fmt::Debug;
use std::path::Path;
use std::sync::Arc;

use clap::Parser;

use atelier_core::config::AtelierConfig;
use atelier_core::error::Result;
use atelier_storage::{AppRepository, Database, Record, Repository};

use cli::{CliArgs, Command, EntityKind};

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();

    let config_path = args.resolve_config_path();
    let mut config = AtelierConfig::load_or_default(&config_path);
    if let Some(data_dir) = args.resolve_data_dir() {
        config.general.data_dir = data_dir;
    }
    if let Some(log_level) = args.resolve_log_level() {
        config.general.log_level = log_level;
    }

    init_tracing(&config.general.log_level);

    let db_path = Path::new(&config.general.data_dir).join(&config.storage.db_file);
    let db = match Database::new(&db_path) {
        Ok(db) => Arc::new(db),
        Err(e) => {
            eprintln!("atelier: failed to open database: {}", e);
            std::process::exit(1);
        }
    };

    let repo = AppRepository::new(db);

    if let Err(e) = dispatch(&repo, &config, args.command).await {
        eprintln!("atelier: {}", e);
        std::process::exit(1);
    }
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter =
        EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn dispatch(repo: &AppRepository, config: &AtelierConfig, command: Command) -> Result<()> {
    match command {
        Command::Recent { kind, limit } => {
            let limit = limit.unwrap_or(config.storage.default_recent_limit);
            match kind {
                EntityKind::Works => print_recent(&repo.works, limit).await,
                EntityKind::Personas => print_recent(&repo.personas, limit).await,
                EntityKind::StudyCards => print_recent(&repo.study_cards, limit).await,
                EntityKind::Topics => print_recent(&repo.topics, limit).await,
                EntityKind::Observations => print_recent(&repo.observations, limit).await,
                EntityKind::CustomRoutes => print_recent(&repo.custom_routes, limit).await,
                EntityKind::Settings => print_recent(&repo.settings, limit).await,
                EntityKind::RunLogs => print_recent(&repo.run_logs, limit).await,
                EntityKind::PracticeSessions => {
                    print_recent(&repo.practice_sessions, limit).await
                }
                EntityKind::Comparisons => print_recent(&repo.comparisons, limit).await,
                EntityKind::Experiments => print_recent(&repo.experiments, limit).await,
                EntityKind::RevisionSessions => {
                    print_recent(&repo.revision_sessions, limit).await
                }
            }
        }
        Command::Search { kind, query } => match kind {
            EntityKind::Works => print_search(&repo.works, &query).await,
            EntityKind::Personas => print_search(&repo.personas, &query).await,
            EntityKind::StudyCards => print_search(&repo.study_cards, &query).await,
            EntityKind::Topics => print_search(&repo.topics, &query).await,
            EntityKind::Observations => print_search(&repo.observations, &query).await,
            EntityKind::CustomRoutes => print_search(&repo.custom_routes, &query).await,
            EntityKind::Settings => print_search(&repo.settings, &query).await,
            EntityKind::RunLogs => print_search(&repo.run_logs, &query).await,
            EntityKind::PracticeSessions => print_search(&repo.practice_sessions, &query).await,
            EntityKind::Comparisons => print_search(&repo.comparisons, &query).await,
            EntityKind::Experiments => print_search(&repo.experiments, &query).await,
            EntityKind::RevisionSessions => print_search(&repo.revision_sessions, &query).await,
        },
        Command::Watch { kind } => match kind {
            EntityKind::Works => follow(&repo.works).await,
            EntityKind::Personas => follow(&repo.personas).await,
            EntityKind::StudyCards => follow(&repo.study_cards).await,
            EntityKind::Topics => follow(&repo.topics).await,
            EntityKind::Observations => follow(&repo.observations).await,
            EntityKind::CustomRoutes => follow(&repo.custom_routes).await,
            EntityKind::Settings => follow(&repo.settings).await,
            EntityKind::RunLogs => follow(&repo.run_logs).await,
            EntityKind::PracticeSessions => follow(&repo.practice_sessions).await,
            EntityKind::Comparisons => follow(&repo.comparisons).await,
            EntityKind::Experiments => follow(&repo.experiments).await,
            EntityKind::RevisionSessions => follow(&repo.revision_sessions).await,
        },
        Command::Stats => {
            let stats = repo.stats().await?;
            println!("works:             {}", stats.works);
            println!("personas:          {}", stats.personas);
            println!("study cards:       {}", stats.study_cards);
            println!("topics:            {}", stats.topics);
            println!("observations:      {}", stats.observations);
            println!("custom routes:     {}", stats.custom_routes);
            println!("settings:          {}", stats.settings);
            println!("run logs:          {}", stats.run_logs);
            println!("practice sessions: {}", stats.practice_sessions);
            println!("comparisons:       {}", stats.comparisons);
            println!("experiments:       {}", stats.experiments);
            println!("revision sessions: {}", stats.revision_sessions);
            println!("total:             {}", stats.total());
            Ok(())
        }
    }
}

async fn print_recent<R: Record + Debug>(repo: &Repository<R>, limit: u32) -> Result<()> {
    let records = repo.get_recent(limit).await?;
    if records.is_empty() {
        println!("(empty)");
        return Ok(());
    }
    for record in records {
        println!("{:?}", record);
    }
    Ok(())
}

async fn print_search<R: Record + Debug>(repo: &Repository<R>, query: &str) -> Result<()> {
    let mut watcher = repo.search(query);
    if let Some(snapshot) = watcher.next().await {
        let records = snapshot?;
        if records.is_empty() {
            println!("(no matches)");
            return Ok(());
        }
        for record in records {
            println!("{:?}", record);
        }
    }
    Ok(())
}

async fn follow<R: Record + Debug>(repo: &Repository<R>) -> Result<()> {
    let mut watcher = repo.observe_all();
    while let Some(snapshot) = watcher.next().await {
        let records = snapshot?;
        tracing::info!(count = records.len(), "snapshot");
        for record in &records {
            println!("{:?}", record);
        }
        println!("-- {} record(s), waiting for changes (Ctrl-C to stop)", records.len());
    }
    Ok(())
}
