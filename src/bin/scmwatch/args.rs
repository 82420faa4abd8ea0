use anyhow::{Result, anyhow};
use std::env;
use std::path::PathBuf;

use scmwatch::SyncAction;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Status,
    Summary,
    Watch,
    Action(SyncAction),
}

#[derive(Debug, Clone)]
pub struct CliArgs {
    pub command: Command,
    pub dir: Option<PathBuf>,     // -C
    pub provider: Option<String>, // --provider
    pub yes: bool,                // -y/--yes
    pub quiet: bool,              // -q/--quiet
    pub json_output: bool,        // --json
}

impl CliArgs {
    pub fn parse() -> Result<Self> {
        let args: Vec<String> = env::args().collect();
        Self::parse_from(&args[1..])
    }

    /// Parse from a slice of arguments (for testing)
    pub fn parse_from(args: &[String]) -> Result<Self> {
        let mut command = None;
        let mut result = CliArgs {
            command: Command::Status,
            dir: None,
            provider: None,
            yes: false,
            quiet: false,
            json_output: false,
        };

        let mut i = 0;
        while i < args.len() {
            let arg = &args[i];

            match arg.as_str() {
                "-C" => {
                    i += 1;
                    if i >= args.len() {
                        return Err(anyhow!("{arg} requires a value"));
                    }
                    result.dir = Some(PathBuf::from(&args[i]));
                }
                "--provider" => {
                    i += 1;
                    if i >= args.len() {
                        return Err(anyhow!("{arg} requires a value"));
                    }
                    result.provider = Some(args[i].clone());
                }
                "-y" | "--yes" => result.yes = true,
                "-q" | "--quiet" => result.quiet = true,
                "--json" => result.json_output = true,
                name if !name.starts_with('-') => {
                    if command.is_some() {
                        return Err(anyhow!("Unexpected argument: {name}"));
                    }
                    command = Some(parse_command(name)?);
                }
                unknown => {
                    return Err(anyhow!("Unknown argument: {unknown}"));
                }
            }

            i += 1;
        }

        result.command = command.unwrap_or(Command::Status);
        if result.json_output && result.command != Command::Status {
            return Err(anyhow!("--json is only supported by `status`"));
        }
        Ok(result)
    }
}

fn parse_command(name: &str) -> Result<Command> {
    Ok(match name {
        "status" => Command::Status,
        "summary" => Command::Summary,
        "watch" => Command::Watch,
        "fetch" => Command::Action(SyncAction::Fetch),
        "pull" => Command::Action(SyncAction::Pull),
        "push" => Command::Action(SyncAction::Push),
        "update" => Command::Action(SyncAction::Update),
        other => return Err(anyhow!("Unknown command: {other}")),
    })
}

pub fn usage() -> &'static str {
    "usage: scmwatch [status [--json] | summary | watch | fetch | pull | push | update]\n\
     \x20      [-C <dir>] [--provider <git|plastic>] [-y|--yes] [-q|--quiet]"
}
