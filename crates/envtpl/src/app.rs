//! The render pipeline behind the `envtpl` command.
//!
//! environment -> context -> template -> output, with the output written only
//! once rendering has fully succeeded.

use anyhow::{anyhow, Context, Result};
use envtpl_render::env::{EnvReader, StdinReader};
use envtpl_render::{render_input, ContextBuilder};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::cli::RunConfig;

/// Environment variable holding an `EnvFilter` directive for diagnostics.
pub const LOG_ENV: &str = "ENVTPL_LOG";

/// Installs the stderr subscriber.
///
/// `ENVTPL_LOG` wins when set; otherwise the level is `warn`, or `debug` with
/// `--verbose`.
pub fn init_logging(verbose: bool) -> Result<()> {
    let log_level = if verbose { "debug" } else { "warn" };
    let env_filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init()
        .map_err(|err| anyhow!("cannot initialize logging: {}", err))?;

    debug!("Logging initialized with level: {}", log_level);
    Ok(())
}

/// Builds the context from `env` and renders the configured template.
pub fn render_to_string<R, S>(config: &RunConfig, env: R, stdin: &S) -> Result<String>
where
    R: EnvReader,
    S: StdinReader,
{
    let context = ContextBuilder::with_reader(env).build();
    render_input(&config.input, stdin, context)
        .with_context(|| format!("failed to render {}", config.input.template_name()))
}

/// Renders and writes the result to the configured destination.
pub fn run<R, S>(config: &RunConfig, env: R, stdin: &S) -> Result<()>
where
    R: EnvReader,
    S: StdinReader,
{
    let rendered = render_to_string(config, env, stdin)?;
    config.output.write_text(&rendered)?;
    debug!(output = ?config.output, "wrote rendered output");
    Ok(())
}
