//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;
use envtpl_render::{InputSource, OutputDestination};

/// Render a template with the environment as its context.
///
/// Every environment variable is available by name, e.g. `{[ HOME ]}`.
/// A value may reference the final value of another variable as `%NAME%`.
#[derive(Debug, Clone, Parser)]
#[command(name = "envtpl", version, about, long_about = None)]
pub struct Args {
    /// Template file (default: stdin)
    #[arg(short = 'i', long = "in", visible_alias = "input", value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Output file, written only if rendering succeeds (default: stdout)
    #[arg(short = 'o', long = "out", visible_alias = "output", value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Print debug diagnostics to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

/// What a single run reads and writes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunConfig {
    pub input: InputSource,
    pub output: OutputDestination,
}

impl From<Args> for RunConfig {
    fn from(args: Args) -> Self {
        Self {
            input: InputSource::from_path(args.input),
            output: OutputDestination::from_path(args.output),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_is_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn defaults_to_stdin_and_stdout() {
        let args = Args::try_parse_from(["envtpl"]).unwrap();
        assert!(!args.verbose);
        assert_eq!(RunConfig::from(args), RunConfig::default());
    }

    #[test]
    fn short_flags() {
        let args = Args::try_parse_from(["envtpl", "-i", "job.tpl", "-o", "job.nomad", "-v"])
            .unwrap();
        assert!(args.verbose);
        let config = RunConfig::from(args);
        assert_eq!(config.input, InputSource::File("job.tpl".into()));
        assert_eq!(config.output, OutputDestination::File("job.nomad".into()));
    }

    #[test]
    fn long_flags_and_aliases() {
        let args = Args::try_parse_from(["envtpl", "--in", "a.tpl", "--output", "b.out"]).unwrap();
        assert_eq!(args.input, Some(PathBuf::from("a.tpl")));
        assert_eq!(args.output, Some(PathBuf::from("b.out")));

        let args = Args::try_parse_from(["envtpl", "--input=c.tpl", "--out=d.out"]).unwrap();
        assert_eq!(args.input, Some(PathBuf::from("c.tpl")));
        assert_eq!(args.output, Some(PathBuf::from("d.out")));
    }

    #[test]
    fn unknown_flag_is_usage_error() {
        let err = Args::try_parse_from(["envtpl", "--bogus"]).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
