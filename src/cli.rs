//! Command-line parsing
//!
//! Accepts `--name value` and `--name=value` for every option that takes a
//! value.

use std::path::PathBuf;

use meshpack_format::IndexRebase;

pub const USAGE: &str = "\
Usage: meshpack --source <file> --out <file> [options]
       meshpack --inspect <file>

Allowed options:
  --help                      show this help message
  --source <file>             file to be imported (.gltf, .glb, .obj)
  --out <file>                exported file name
  --inspect <file>            print the contents of an exported file
  --config <file>             settings file (default: <config dir>/meshpack/settings.toml)
  --index-rebase <mode>       index-base (default) or vertex-base
  --no-report                 do not print the mesh report
  --verbose                   enable debug logging";

/// Errors produced while parsing the command line.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum CliError {
    #[error("unknown option '{0}'")]
    UnknownOption(String),

    #[error("option '--{0}' requires a value")]
    MissingValue(String),

    #[error("option '--{0}' does not take a value")]
    UnexpectedValue(String),

    #[error("invalid value for '--{option}': {message}")]
    InvalidValue { option: String, message: String },

    #[error("unexpected argument '{0}'")]
    UnexpectedArgument(String),
}

/// Parsed command-line options.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliArgs {
    pub help: bool,
    pub source: Option<PathBuf>,
    pub out: Option<PathBuf>,
    pub inspect: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub index_rebase: Option<IndexRebase>,
    pub no_report: bool,
    pub verbose: bool,
}

/// What the process should do with the parsed options.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Help,
    Inspect(PathBuf),
    Convert { source: PathBuf, out: PathBuf },
    /// Required options are missing; each entry is a diagnostic line.
    Incomplete(Vec<&'static str>),
}

impl CliArgs {
    /// Parse arguments (without the program name).
    pub fn parse(args: &[String]) -> Result<Self, CliError> {
        let mut parsed = CliArgs::default();
        let mut iter = args.iter();

        while let Some(arg) = iter.next() {
            if arg == "-h" {
                parsed.help = true;
                continue;
            }
            if arg == "-v" {
                parsed.verbose = true;
                continue;
            }

            let Some(option) = arg.strip_prefix("--") else {
                return Err(CliError::UnexpectedArgument(arg.clone()));
            };

            let (name, inline_value) = match option.split_once('=') {
                Some((name, value)) => (name, Some(value.to_string())),
                None => (option, None),
            };

            match name {
                "help" | "verbose" | "no-report" => {
                    if inline_value.is_some() {
                        return Err(CliError::UnexpectedValue(name.to_string()));
                    }
                    match name {
                        "help" => parsed.help = true,
                        "verbose" => parsed.verbose = true,
                        _ => parsed.no_report = true,
                    }
                }
                "source" | "out" | "inspect" | "config" | "index-rebase" => {
                    let value = match inline_value {
                        Some(value) => value,
                        None => iter
                            .next()
                            .cloned()
                            .ok_or_else(|| CliError::MissingValue(name.to_string()))?,
                    };
                    if value.is_empty() {
                        return Err(CliError::MissingValue(name.to_string()));
                    }
                    match name {
                        "source" => parsed.source = Some(PathBuf::from(value)),
                        "out" => parsed.out = Some(PathBuf::from(value)),
                        "inspect" => parsed.inspect = Some(PathBuf::from(value)),
                        "config" => parsed.config = Some(PathBuf::from(value)),
                        _ => {
                            let rebase = value.parse::<IndexRebase>().map_err(|message| {
                                CliError::InvalidValue {
                                    option: name.to_string(),
                                    message,
                                }
                            })?;
                            parsed.index_rebase = Some(rebase);
                        }
                    }
                }
                _ => return Err(CliError::UnknownOption(arg.clone())),
            }
        }

        Ok(parsed)
    }

    /// Decide what to run. Help wins over everything, then inspection,
    /// then conversion.
    pub fn command(&self) -> Command {
        if self.help {
            return Command::Help;
        }
        if let Some(path) = &self.inspect {
            return Command::Inspect(path.clone());
        }

        match (&self.source, &self.out) {
            (Some(source), Some(out)) => Command::Convert {
                source: source.clone(),
                out: out.clone(),
            },
            (source, out) => {
                let mut missing = Vec::new();
                if source.is_none() {
                    missing.push("Source was not set.");
                }
                if out.is_none() {
                    missing.push("Output was not set.");
                }
                Command::Incomplete(missing)
            }
        }
    }
}
