use anyhow::Result;
use colored::*;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::env;
use std::process::ExitCode;
use std::sync::Arc;

use scmwatch::dirty::NoUnsavedWork;
use scmwatch::notify::{ConsoleNotifier, LogNotifier};
use scmwatch::{Engine, EngineConfig, Notifier, SyncAction, ui};

mod args;
use args::{CliArgs, Command, usage};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    ui::init_logging();

    let args = match CliArgs::parse() {
        Ok(args) => args,
        Err(e) => {
            ui::error(format!("error: {e}"));
            eprintln!("{}", usage());
            return Ok(ExitCode::from(2));
        }
    };

    let dir = match &args.dir {
        Some(dir) => dir.clone(),
        None => env::current_dir()?,
    };
    let mut config = EngineConfig::load(&dir)?;
    if let Some(provider) = &args.provider {
        config.preferred_provider = Some(provider.clone());
    }

    let notifier: Arc<dyn Notifier> = if args.quiet {
        Arc::new(LogNotifier)
    } else {
        Arc::new(ConsoleNotifier)
    };
    let mut engine = Engine::with_os_tools(&dir, config, notifier, Arc::new(NoUnsavedWork));
    let cwd = dir.display().to_string();

    match args.command {
        Command::Status => {
            let snapshot = engine.refresh_now().await;
            if args.json_output {
                println!("{}", serde_json::to_string_pretty(&*snapshot)?);
            } else {
                ui::header(&snapshot, &cwd);
                ui::status_line(&engine.status_label());
                if let Some(err) = snapshot.error_kind() {
                    ui::warn(err.to_string());
                    if !err.is_recoverable() {
                        return Ok(ExitCode::FAILURE);
                    }
                }
            }
        }
        Command::Summary => {
            engine.refresh_now().await;
            ui::info_full(engine.build_status_summary());
        }
        Command::Watch => {
            let snapshot = engine.refresh_now().await;
            ui::header(&snapshot, &cwd);
            ui::status_line(&engine.status_label());
            if engine.auto_fetch_enabled() {
                ui::info("Auto fetch is on.");
            }
            engine
                .run(async {
                    let _ = tokio::signal::ctrl_c().await;
                })
                .await;
            ui::goodbye();
        }
        Command::Action(action) => return run_action(&mut engine, action, args.yes).await,
    }

    Ok(ExitCode::SUCCESS)
}

async fn run_action(engine: &mut Engine, action: SyncAction, assume_yes: bool) -> Result<ExitCode> {
    engine.refresh_now().await;

    if engine.is_enabled(action)
        && !assume_yes
        && let Some(prompt) = action.confirmation_prompt()
        && !confirm(prompt)?
    {
        ui::info("Cancelled.");
        return Ok(ExitCode::SUCCESS);
    }

    // A closed gate or missing backend is reported through the notifier.
    if engine.run_action(action).is_err() {
        return Ok(ExitCode::FAILURE);
    }
    ui::running_command(&format!("{} {}", action.backend(), action.args().join(" ")));

    let result = engine.wait_for_command().await;
    if engine.is_probe_in_flight() {
        engine.wait_for_probe().await;
    }
    ui::status_line(&engine.status_label());

    Ok(if result.succeeded() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn confirm(prompt: &str) -> Result<bool> {
    let mut rl = DefaultEditor::new()?;
    match rl.readline(&format!("{} {prompt} [y/N] ", "?".yellow().bold())) {
        Ok(line) => Ok(matches!(
            line.trim().to_ascii_lowercase().as_str(),
            "y" | "yes"
        )),
        Err(ReadlineError::Interrupted | ReadlineError::Eof) => Ok(false),
        Err(e) => Err(e.into()),
    }
}
