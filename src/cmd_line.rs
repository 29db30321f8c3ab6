//! Command line options that are used across applications.

use std::path::PathBuf;

use clap::{crate_version, App, Arg, ArgMatches};
use tracing_subscriber::EnvFilter;

use crate::errors::HydroGridErr;

/// How much the tools log when `RUST_LOG` is not set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verbosity {
    /// Warnings and errors only.
    Quiet,
    /// Progress messages.
    Normal,
    /// Per file detail.
    Verbose,
}

impl Verbosity {
    /// The default log filter for this level.
    pub fn default_filter(self) -> &'static str {
        match self {
            Verbosity::Quiet => "hydro_grid=warn",
            Verbosity::Normal => "hydro_grid=info",
            Verbosity::Verbose => "hydro_grid=debug",
        }
    }
}

/// Struct to package up command line arguments.
#[derive(Clone, Copy, Debug)]
pub struct CommonCmdLineArgs {
    verbosity: Verbosity,
}

impl<'a, 'b> CommonCmdLineArgs {
    /// Create a new app with the options every tool shares.
    pub fn new_app(app_name: &'static str, about: &'static str) -> App<'a, 'b> {
        App::new(app_name)
            .about(about)
            .version(crate_version!())
            .arg(
                Arg::with_name("quiet")
                    .short("q")
                    .long("quiet")
                    .conflicts_with("verbose")
                    .help("Only log warnings and errors."),
            )
            .arg(
                Arg::with_name("verbose")
                    .long("verbose")
                    .help("Log per file detail."),
            )
            .after_help(concat!(
                "Logging goes to stderr. The RUST_LOG environment variable, if set, ",
                "overrides the --quiet and --verbose options."
            ))
    }

    /// Process an `App` to get the parsed values out of it and the matches object so an application
    /// can continue with further argument parsing. Installs the log subscriber.
    pub fn matches(app: App<'a, 'b>) -> (Self, ArgMatches<'a>) {
        let matches = app.get_matches();

        let verbosity = if matches.is_present("quiet") {
            Verbosity::Quiet
        } else if matches.is_present("verbose") {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        };

        let cmd_line_opts = CommonCmdLineArgs { verbosity };
        cmd_line_opts.init_logging();

        (cmd_line_opts, matches)
    }

    fn init_logging(&self) {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.verbosity.default_filter()));

        // Fails only if a subscriber is already installed.
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init();
    }
}

/// Get a path argument that clap has already checked is present.
pub fn path_arg(matches: &ArgMatches, name: &str) -> Result<PathBuf, HydroGridErr> {
    matches
        .value_of_os(name)
        .map(PathBuf::from)
        .ok_or_else(|| HydroGridErr::MissingArgument(name.to_owned()))
}

/// Get a string argument that clap has already checked is present.
pub fn string_arg(matches: &ArgMatches, name: &str) -> Result<String, HydroGridErr> {
    matches
        .value_of(name)
        .map(str::to_owned)
        .ok_or_else(|| HydroGridErr::MissingArgument(name.to_owned()))
}

/// Get a string argument, falling back to `default`.
pub fn str_arg(matches: &ArgMatches, name: &str, default: &str) -> String {
    matches.value_of(name).unwrap_or(default).to_owned()
}
