//! Chat-style command parsing.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::Serialize;

use super::error::LifecycleError;
use crate::job::{OptionFlags, SourceId};

pub const CREATE_USAGE: &str = "/create [-o] [-m] <id>";
pub const CANCEL_USAGE: &str = "/cancel <id>";

/// `/name` or `/name@bot`, then the arguments.
static COMMAND_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^/(\w+)(?:@\w+)?(?:\s+(.*))?$").unwrap());

/// A parsed requester message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum ChatCommand {
    Create { source_id: SourceId, flags: OptionFlags },
    Cancel { source_id: SourceId },
    /// Reply to a merge-indices question.
    MergeIndices { indices: Vec<u32> },
    /// Reply to a cancel confirmation.
    Confirm { yes: bool },
}

/// Parses a message.
///
/// Commands take their source id as the last argument. Plain replies are
/// either y/n or whitespace-separated indices; non-numeric words in an
/// index reply are skipped.
pub fn parse_command(text: &str) -> Result<ChatCommand, LifecycleError> {
    let text = text.trim();

    if let Some(caps) = COMMAND_RE.captures(text) {
        let name = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        let args: Vec<&str> = caps
            .get(2)
            .map(|m| m.as_str().split_whitespace().collect())
            .unwrap_or_default();
        return match name {
            "create" => parse_create(&args),
            "cancel" => parse_cancel(&args),
            other => Err(LifecycleError::invalid_input(format!(
                "unknown command /{}",
                other
            ))),
        };
    }
    if text.starts_with('/') {
        return Err(LifecycleError::invalid_input("malformed command"));
    }

    match text.to_lowercase().as_str() {
        "y" | "yes" => return Ok(ChatCommand::Confirm { yes: true }),
        "n" | "no" => return Ok(ChatCommand::Confirm { yes: false }),
        _ => {}
    }

    let indices: Vec<u32> = text
        .split_whitespace()
        .filter_map(|word| word.parse().ok())
        .collect();
    if indices.is_empty() {
        return Err(LifecycleError::invalid_input(
            "expected y/n or numbers such as 1 3 5",
        ));
    }
    Ok(ChatCommand::MergeIndices { indices })
}

fn parse_create(args: &[&str]) -> Result<ChatCommand, LifecycleError> {
    let (last, options) = args
        .split_last()
        .ok_or(LifecycleError::Usage(CREATE_USAGE))?;
    let source_id = parse_source_id(last).ok_or(LifecycleError::Usage(CREATE_USAGE))?;

    let mut flags = OptionFlags::default();
    for option in options {
        match *option {
            "-o" => flags.overwrite = true,
            "-m" => flags.merge = true,
            _ => return Err(LifecycleError::Usage(CREATE_USAGE)),
        }
    }
    Ok(ChatCommand::Create { source_id, flags })
}

fn parse_cancel(args: &[&str]) -> Result<ChatCommand, LifecycleError> {
    match args {
        [id] => parse_source_id(id)
            .map(|source_id| ChatCommand::Cancel { source_id })
            .ok_or(LifecycleError::Usage(CANCEL_USAGE)),
        _ => Err(LifecycleError::Usage(CANCEL_USAGE)),
    }
}

fn parse_source_id(word: &str) -> Option<SourceId> {
    if word.bytes().all(|b| b.is_ascii_digit()) {
        word.parse().ok()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_create() {
        assert_eq!(
            parse_command("/create 138771").unwrap(),
            ChatCommand::Create {
                source_id: 138771,
                flags: OptionFlags::default()
            }
        );

        let parsed = parse_command("/create@forge_bot -m -o 42").unwrap();
        assert_eq!(
            parsed,
            ChatCommand::Create {
                source_id: 42,
                flags: OptionFlags {
                    overwrite: true,
                    merge: true
                }
            }
        );
    }

    #[test]
    fn test_create_usage_errors() {
        for text in ["/create", "/create abc", "/create -x 42", "/create 42 -m"] {
            assert_eq!(
                parse_command(text).unwrap_err(),
                LifecycleError::Usage(CREATE_USAGE),
                "{}",
                text
            );
        }
    }

    #[test]
    fn test_parse_cancel() {
        assert_eq!(
            parse_command("/cancel 9").unwrap(),
            ChatCommand::Cancel { source_id: 9 }
        );
        assert_eq!(
            parse_command("/cancel").unwrap_err(),
            LifecycleError::Usage(CANCEL_USAGE)
        );
        assert_eq!(
            parse_command("/cancel 9 10").unwrap_err(),
            LifecycleError::Usage(CANCEL_USAGE)
        );
    }

    #[test]
    fn test_parse_replies() {
        assert_eq!(
            parse_command(" Y ").unwrap(),
            ChatCommand::Confirm { yes: true }
        );
        assert_eq!(
            parse_command("n").unwrap(),
            ChatCommand::Confirm { yes: false }
        );
        assert_eq!(
            parse_command("1 3 x 5").unwrap(),
            ChatCommand::MergeIndices {
                indices: vec![1, 3, 5]
            }
        );
    }

    #[test]
    fn test_unknown_input() {
        assert!(matches!(
            parse_command("/start").unwrap_err(),
            LifecycleError::InvalidInput(_)
        ));
        assert!(matches!(
            parse_command("hello").unwrap_err(),
            LifecycleError::InvalidInput(_)
        ));
    }
}
