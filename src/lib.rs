pub mod config;
pub mod db;
pub mod entities;
pub mod scheduler;
pub mod services;

use std::sync::Arc;
use tokio::signal;
use tokio::sync::RwLock;

use chrono::{Datelike, Utc};
pub use config::Config;
use db::Store;
use scheduler::{AppState, Scheduler};
use services::DailyQuizGenerator;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

pub async fn run() -> anyhow::Result<()> {
    let config = Config::load()?;
    config.validate()?;

    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let fmt_layer = tracing_subscriber::fmt::layer();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_help();
        return Ok(());
    }

    match args[1].as_str() {
        "daemon" | "-d" | "--daemon" => run_daemon(config).await,

        "generate" | "g" => cmd_generate(&config).await,

        "today" | "t" => cmd_today(&config).await,

        "reset-cooldown" => {
            let subject = args.get(2).map(String::as_str);
            cmd_reset_cooldown(&config, subject).await
        }

        "subjects" | "ls" => cmd_subjects(&config).await,

        "init" | "--init" => {
            Config::create_default_if_missing()?;
            println!("✓ Config file created. Edit config.toml and run again.");
            Ok(())
        }

        "help" | "-h" | "--help" => {
            print_help();
            Ok(())
        }

        _ => {
            println!("Unknown command: {}", args[1]);
            println!();
            print_help();
            Ok(())
        }
    }
}

fn print_help() {
    println!("Dailyquiz - Daily Quiz Generator");
    println!("Selects a topic-diverse daily question set per subject");
    println!();
    println!("USAGE:");
    println!("  dailyquiz <COMMAND> [OPTIONS]");
    println!();
    println!("COMMANDS:");
    println!("  generate, g            Generate today's quiz (no-op if it exists)");
    println!("  today, t               Show today's quiz, generating it if needed");
    println!("  subjects, ls           List subjects with question pool counts");
    println!("  reset-cooldown [name]  Make questions eligible again (all, or one subject)");
    println!("  daemon                 Run the daily scheduler in the foreground");
    println!("  init                   Create default config file");
    println!("  help                   Show this help message");
    println!();
    println!("EXAMPLES:");
    println!("  dailyquiz generate                # One-shot generation for today");
    println!("  dailyquiz today                   # Print today's quiz");
    println!("  dailyquiz reset-cooldown Physics  # Clear cooldown for one subject");
    println!("  dailyquiz daemon                  # Generate automatically every day");
    println!();
    println!("CONFIG:");
    println!("  Edit config.toml to set the weekday/subject table, cooldown, and schedule.");
}

async fn cmd_generate(config: &Config) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;
    let generator = DailyQuizGenerator::new(store, config.quiz.clone());

    let selection = generator.generate().await?;

    if selection.is_empty() {
        println!("No questions available to generate today's quiz.");
    } else {
        println!("✓ Generated today's quiz ({} questions)", selection.len());
    }

    Ok(())
}

async fn cmd_today(config: &Config) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;
    let generator = DailyQuizGenerator::new(store.clone(), config.quiz.clone());

    // Lazy trigger: make sure today's quiz exists before reading it back.
    generator.generate().await?;

    let today = Utc::now().date_naive();
    let Some(quiz) = store.quiz_for_date(today).await? else {
        println!("No quiz available for {} (no eligible questions).", today);
        return Ok(());
    };

    println!(
        "Daily quiz for {} ({} questions)",
        quiz.date,
        quiz.questions.len()
    );
    println!("{:-<70}", "");

    for (i, question) in quiz.questions.iter().enumerate() {
        println!("{:>2}. [{}] {}", i + 1, question.topic, question.text);
        if question.choice_count > 0 {
            println!("    {} choices", question.choice_count);
        }
    }

    Ok(())
}

async fn cmd_reset_cooldown(config: &Config, subject: Option<&str>) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;

    let count = store.reset_cooldown(subject).await?;

    match subject {
        Some(name) if count == 0 => {
            println!("No questions found for subject '{}'", name);
        }
        Some(name) => {
            println!("✓ Reset the cooldown for {} questions in '{}'", count, name);
        }
        None => {
            println!("✓ Reset the cooldown for all {} questions", count);
        }
    }

    Ok(())
}

async fn cmd_subjects(config: &Config) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;

    let subjects = store.list_subjects().await?;

    if subjects.is_empty() {
        println!("No subjects in the question store.");
        return Ok(());
    }

    let now = Utc::now();
    let cutoff = now - chrono::Duration::days(config.quiz.cooldown_days);
    let today_subject = config.quiz.subject_for(now.date_naive().weekday()).to_string();

    println!("Subjects ({} total)", subjects.len());
    println!("{:-<70}", "");

    for subject in subjects {
        let total = store.question_count_for_subject(subject.id).await?;
        let eligible = store.eligible_count_for_subject(subject.id, cutoff).await?;
        let marker = if subject.name == today_subject {
            "  ← today"
        } else {
            ""
        };

        println!("• {}{}", subject.name, marker);
        println!("  Questions: {} total | {} eligible", total, eligible);
    }

    Ok(())
}

async fn run_daemon(config: Config) -> anyhow::Result<()> {
    info!(
        "Dailyquiz v{} starting in daemon mode...",
        env!("CARGO_PKG_VERSION")
    );

    let state = Arc::new(RwLock::new(AppState::new(config.clone()).await?));
    let scheduler = Scheduler::new(Arc::clone(&state), config.scheduler.clone());

    // Cover the window between the last cron fire and startup.
    scheduler.run_once().await?;

    let scheduler_handle = {
        let sched = scheduler;
        tokio::spawn(async move {
            if let Err(e) = sched.start().await {
                error!("Scheduler error: {}", e);
            }
        })
    };

    info!("Daemon running. Press Ctrl+C to stop.");

    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Shutdown signal received");
        }
        Err(e) => {
            error!("Error listening for shutdown: {}", e);
        }
    }

    scheduler_handle.abort();
    info!("Daemon stopped");

    Ok(())
}
