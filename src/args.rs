//! Command-line argument parsing.
//!
//! A hand-rolled parser for the handful of flags the binary accepts. Unknown
//! arguments show the help text and exit with an error status.

/// What the parsed command line asks the binary to do.
#[derive(Debug, PartialEq)]
pub enum CliAction {
    /// Run the controller.
    Run {
        config_path: Option<String>,
        quiet: bool,
    },
    /// Display help information and exit.
    ShowHelp,
    /// Display version information and exit.
    ShowVersion,
    /// Show help due to unknown arguments and exit with an error status.
    ShowHelpDueToError,
}

pub struct ParsedArgs {
    pub action: CliAction,
}

impl ParsedArgs {
    /// Parse command-line arguments (including the program name in position
    /// zero, as `std::env::args()` yields them).
    pub fn parse<I, S>(args: I) -> ParsedArgs
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut config_path: Option<String> = None;
        let mut quiet = false;
        let mut display_help = false;
        let mut display_version = false;
        let mut unknown_arg_found = false;

        let args_vec: Vec<String> = args
            .into_iter()
            .skip(1)
            .map(|s| s.as_ref().to_string())
            .collect();

        let mut idx = 0;
        while idx < args_vec.len() {
            match args_vec[idx].as_str() {
                "-h" | "--help" => display_help = true,
                "-V" | "--version" => display_version = true,
                "-q" | "--quiet" => quiet = true,
                "-c" | "--config" => {
                    if idx + 1 < args_vec.len() {
                        config_path = Some(args_vec[idx + 1].clone());
                        idx += 1;
                    } else {
                        unknown_arg_found = true;
                    }
                }
                _ => unknown_arg_found = true,
            }
            idx += 1;
        }

        let action = if display_help {
            CliAction::ShowHelp
        } else if display_version {
            CliAction::ShowVersion
        } else if unknown_arg_found {
            CliAction::ShowHelpDueToError
        } else {
            CliAction::Run { config_path, quiet }
        };

        ParsedArgs { action }
    }
}

/// Displays version information using logger methods.
pub fn display_version_info() {
    log_version!();
    log_pipe!();
    println!("╹ {}", env!("CARGO_PKG_DESCRIPTION"));
}

/// Displays the help message using logger methods.
pub fn display_help() {
    log_version!();
    log_block_start!(env!("CARGO_PKG_DESCRIPTION"));
    log_block_start!("Usage:");
    log_indented!("coopr [OPTIONS]");
    log_block_start!("Options:");
    log_indented!("-c, --config <file>    Use a custom configuration file");
    log_indented!("-q, --quiet            Suppress log output");
    log_indented!("-h, --help             Print help information");
    log_indented!("-V, --version          Print version information");
    log_end!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_args_runs_with_defaults() {
        let parsed = ParsedArgs::parse(["coopr"]);
        assert_eq!(
            parsed.action,
            CliAction::Run {
                config_path: None,
                quiet: false,
            }
        );
    }

    #[test]
    fn help_flag_wins() {
        let parsed = ParsedArgs::parse(["coopr", "--help"]);
        assert_eq!(parsed.action, CliAction::ShowHelp);
        let parsed = ParsedArgs::parse(["coopr", "-q", "-h"]);
        assert_eq!(parsed.action, CliAction::ShowHelp);
    }

    #[test]
    fn version_flag() {
        let parsed = ParsedArgs::parse(["coopr", "-V"]);
        assert_eq!(parsed.action, CliAction::ShowVersion);
    }

    #[test]
    fn config_flag_takes_a_path() {
        let parsed = ParsedArgs::parse(["coopr", "--config", "/tmp/coopr.toml", "--quiet"]);
        assert_eq!(
            parsed.action,
            CliAction::Run {
                config_path: Some("/tmp/coopr.toml".to_string()),
                quiet: true,
            }
        );
    }

    #[test]
    fn config_flag_without_value_is_an_error() {
        let parsed = ParsedArgs::parse(["coopr", "--config"]);
        assert_eq!(parsed.action, CliAction::ShowHelpDueToError);
    }

    #[test]
    fn unknown_argument_is_an_error() {
        let parsed = ParsedArgs::parse(["coopr", "--bogus"]);
        assert_eq!(parsed.action, CliAction::ShowHelpDueToError);
    }
}
