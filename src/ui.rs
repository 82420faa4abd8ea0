use colored::*;

use crate::sanitize;
use crate::status::StatusSnapshot;

/// Environment variable that enables machine-readable JSON logs when set to "1" or "true".
const MACHINE_LOG_ENV: &str = "SCMWATCH_MACHINE_LOG";

pub fn init_logging() {
    // Internal logs are opt-in via RUST_LOG. Console output stays separate.
    let mut builder = env_logger::Builder::from_default_env();
    if std::env::var("RUST_LOG").is_err() {
        builder.filter_level(log::LevelFilter::Warn);
    }
    let _ = builder.try_init();
}

fn machine_log_enabled() -> bool {
    matches!(
        std::env::var(MACHINE_LOG_ENV)
            .ok()
            .as_deref()
            .map(str::to_ascii_lowercase)
            .as_deref(),
        Some("1") | Some("true")
    )
}

fn emit_machine_event(kind: &str, data: serde_json::Value) {
    if !machine_log_enabled() {
        return;
    }

    let event = serde_json::json!({
        "kind": kind,
        "data": data,
    });

    if let Ok(line) = serde_json::to_string(&event) {
        eprintln!("{line}");
    }
}

pub fn info(msg: impl AsRef<str>) {
    let raw = msg.as_ref();
    println!("{}", sanitize::sanitize_preview_for_console(raw));
    emit_machine_event("info", serde_json::json!({ "message": raw }));
}

/// Full text, sanitized but never truncated.
pub fn info_full(msg: impl AsRef<str>) {
    println!("{}", sanitize::sanitize_for_console(msg.as_ref()));
}

pub fn warn(msg: impl AsRef<str>) {
    let raw = msg.as_ref();
    eprintln!("{}", sanitize::sanitize_preview_for_console(raw).yellow());
    emit_machine_event("warn", serde_json::json!({ "message": raw }));
}

pub fn error(msg: impl AsRef<str>) {
    let raw = msg.as_ref();
    eprintln!("{}", sanitize::sanitize_preview_for_console(raw).red());
    emit_machine_event("error", serde_json::json!({ "message": raw }));
}

pub fn header(snapshot: &StatusSnapshot, cwd: &str) {
    let d = sanitize::sanitize_preview_for_console(cwd);
    let branch = if snapshot.branch.is_empty() {
        &snapshot.workspace_name
    } else {
        &snapshot.branch
    };
    let b = sanitize::sanitize_preview_for_console(branch);

    println!(
        "{} {} | {} | {}",
        ">>".bold(),
        "scmwatch".bold(),
        format!("{}/{b}", snapshot.provider.label()).cyan(),
        d.dimmed()
    );
    emit_machine_event(
        "header",
        serde_json::json!({
            "provider": snapshot.provider,
            "branch": branch,
            "cwd": cwd,
        }),
    );
}

/// One status label line, e.g. while watching.
pub fn status_line(label: &str) {
    let safe = sanitize::sanitize_preview_for_console(label);
    println!("{} {}", "●".blue().bold(), safe);
    emit_machine_event("status", serde_json::json!({ "label": label }));
}

pub fn notice_ok(message: &str) {
    let safe = sanitize::sanitize_preview_for_console(message);
    println!("  {} {}", "└─".green(), safe.green());
    emit_machine_event("notice_ok", serde_json::json!({ "message": message }));
}

pub fn notice_err(message: &str) {
    let safe = sanitize::sanitize_preview_for_console(message);
    eprintln!("  {} {}", "└─".red(), safe.red());
    emit_machine_event("notice_err", serde_json::json!({ "message": message }));
}

pub fn running_command(command: &str) {
    let safe = sanitize::sanitize_preview_for_console(command);
    println!("{} Running: {}", "●".dimmed(), safe.dimmed());
    emit_machine_event("running_command", serde_json::json!({ "command": command }));
}

pub fn goodbye() {
    println!("\n{}", "Stopped watching.".dimmed());
    emit_machine_event("goodbye", serde_json::json!({}));
}
