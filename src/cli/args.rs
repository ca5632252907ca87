//! Command-line argument parsing for the donkin binary.

/// Parsed CLI command to execute.
#[derive(Debug, Clone, PartialEq)]
pub enum CliCommand {
    /// Show version information
    Version,
    /// Show usage
    Help,
    /// Send one prompt and stream the reply
    Run(RunArgs),
}

/// Options for [`CliCommand::Run`]. Flags override environment values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunArgs {
    pub endpoint: Option<String>,
    pub thread_id: Option<String>,
    /// Prompt words joined by spaces; empty means read stdin
    pub prompt: String,
}

/// Argument errors, reported with the usage text.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgsError {
    MissingValue(String),
    UnknownFlag(String),
}

impl std::fmt::Display for ArgsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArgsError::MissingValue(flag) => write!(f, "{} requires a value", flag),
            ArgsError::UnknownFlag(flag) => write!(f, "unknown option: {}", flag),
        }
    }
}

impl std::error::Error for ArgsError {}

pub const USAGE: &str = "\
Usage: donkin [OPTIONS] [PROMPT]...

Send PROMPT to the chat endpoint and stream the reply to stdout.
Reasoning is written to stderr. Reads the prompt from stdin when none
is given.

Options:
  -e, --endpoint <URL>   Chat endpoint (env: DONKIN_ENDPOINT)
  -t, --thread <ID>      Continue a thread (env: DONKIN_THREAD_ID)
  -V, --version          Print version
  -h, --help             Print this help
";

/// Parse command-line arguments and return the appropriate command.
///
/// # Examples
///
/// ```
/// use donkin::cli::args::{parse_args, CliCommand};
///
/// let args = vec!["donkin".to_string(), "--version".to_string()];
/// assert_eq!(parse_args(args.into_iter()), Ok(CliCommand::Version));
/// ```
pub fn parse_args<I>(args: I) -> Result<CliCommand, ArgsError>
where
    I: Iterator<Item = String>,
{
    let mut run = RunArgs::default();
    let mut words: Vec<String> = Vec::new();
    // Skip the program name
    let mut args = args.skip(1);

    while let Some(arg) = args.next() {
        if !words.is_empty() {
            words.push(arg);
            continue;
        }
        match arg.as_str() {
            "--version" | "-V" => return Ok(CliCommand::Version),
            "--help" | "-h" => return Ok(CliCommand::Help),
            "--endpoint" | "-e" => {
                run.endpoint = Some(args.next().ok_or(ArgsError::MissingValue(arg))?);
            }
            "--thread" | "-t" => {
                run.thread_id = Some(args.next().ok_or(ArgsError::MissingValue(arg))?);
            }
            "--" => words.extend(args.by_ref()),
            flag if flag.starts_with('-') && flag.len() > 1 => {
                return Err(ArgsError::UnknownFlag(arg));
            }
            _ => words.push(arg),
        }
    }

    run.prompt = words.join(" ");
    Ok(CliCommand::Run(run))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<CliCommand, ArgsError> {
        let mut all = vec!["donkin".to_string()];
        all.extend(args.iter().map(|a| a.to_string()));
        parse_args(all.into_iter())
    }

    #[test]
    fn test_parse_version_flag() {
        assert_eq!(parse(&["--version"]), Ok(CliCommand::Version));
        assert_eq!(parse(&["-V"]), Ok(CliCommand::Version));
    }

    #[test]
    fn test_parse_help_flag() {
        assert_eq!(parse(&["-h"]), Ok(CliCommand::Help));
    }

    #[test]
    fn test_parse_no_args() {
        assert_eq!(parse(&[]), Ok(CliCommand::Run(RunArgs::default())));
    }

    #[test]
    fn test_parse_prompt_and_flags() {
        let cmd = parse(&["-e", "http://h/chat", "--thread", "t1", "what", "is", "rust"]).unwrap();
        assert_eq!(
            cmd,
            CliCommand::Run(RunArgs {
                endpoint: Some("http://h/chat".to_string()),
                thread_id: Some("t1".to_string()),
                prompt: "what is rust".to_string(),
            })
        );
    }

    #[test]
    fn test_flags_after_prompt_are_words() {
        let cmd = parse(&["explain", "-V"]).unwrap();
        match cmd {
            CliCommand::Run(run) => assert_eq!(run.prompt, "explain -V"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_double_dash() {
        let cmd = parse(&["--", "--not-a-flag"]).unwrap();
        match cmd {
            CliCommand::Run(run) => assert_eq!(run.prompt, "--not-a-flag"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_missing_value() {
        assert_eq!(
            parse(&["--endpoint"]),
            Err(ArgsError::MissingValue("--endpoint".to_string()))
        );
    }

    #[test]
    fn test_parse_unknown_flag() {
        assert_eq!(
            parse(&["--unknown"]),
            Err(ArgsError::UnknownFlag("--unknown".to_string()))
        );
    }
}
