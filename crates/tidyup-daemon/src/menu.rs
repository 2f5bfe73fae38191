//! Text menu commands read from stdin.
//!
//! Stands in for the tray menu: each line is one command, arguments are
//! split shell-style so paths with spaces can be quoted.
//!
//! ```text
//! startup                                   # toggle start on login
//! watch ~/Downloads "/Volumes/Old Stuff" 24
//! threshold ~/Downloads 48
//! unwatch ~/Downloads
//! check /Users/me/Downloads/a.zip
//! ignore /Users/me/Downloads/a.zip
//! list
//! quit
//! ```

use tidyup_core::{DirectoryEntry, Intent};

pub const HELP: &str = "commands: startup | quit | list | watch <dir> <dest> <hours> | \
unwatch <dir> | threshold <dir> <hours> | check <file> | ignore <file>";

fn parse_hours(value: &str) -> Result<u64, String> {
    value
        .parse::<u64>()
        .map_err(|_| format!("hours must be a non-negative integer, got '{value}'"))
}

fn expect_args<'a>(
    command: &str,
    args: &'a [String],
    count: usize,
) -> Result<&'a [String], String> {
    if args.len() == count {
        Ok(args)
    } else {
        Err(format!(
            "'{command}' takes {count} argument(s), got {}",
            args.len()
        ))
    }
}

/// Parse one input line.
///
/// Returns `Ok(None)` for blank lines and `# comments`.
pub fn parse_command(line: &str) -> Result<Option<Intent>, String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let words = shlex::split(line).ok_or_else(|| "unbalanced quotes".to_string())?;
    let Some((command, args)) = words.split_first() else {
        return Ok(None);
    };

    let intent = match command.as_str() {
        "startup" => {
            expect_args(command, args, 0)?;
            Intent::ToggleStartup
        }
        "quit" | "exit" => {
            expect_args(command, args, 0)?;
            Intent::Quit
        }
        "list" => {
            expect_args(command, args, 0)?;
            Intent::ListState
        }
        "watch" => {
            let args = expect_args(command, args, 3)?;
            Intent::Watch(DirectoryEntry::new(
                args[0].as_str(),
                args[1].as_str(),
                parse_hours(&args[2])?,
            ))
        }
        "unwatch" => {
            let args = expect_args(command, args, 1)?;
            Intent::Unwatch {
                watch_path: args[0].clone(),
            }
        }
        "threshold" => {
            let args = expect_args(command, args, 2)?;
            Intent::SetAgeThreshold {
                watch_path: args[0].clone(),
                hours: parse_hours(&args[1])?,
            }
        }
        "check" => {
            let args = expect_args(command, args, 1)?;
            Intent::RecordCheck {
                path: args[0].clone(),
            }
        }
        "ignore" => {
            let args = expect_args(command, args, 1)?;
            Intent::Ignore {
                path: args[0].clone(),
            }
        }
        other => return Err(format!("unknown command '{other}'")),
    };

    Ok(Some(intent))
}
