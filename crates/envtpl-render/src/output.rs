//! Template source and rendered-output destination.
//!
//! [`InputSource`] is where the template text comes from (a file or stdin),
//! [`OutputDestination`] is where the rendered text goes (a file or stdout).
//! Both release their handles before returning, on success and on error.

use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::env::StdinReader;
use crate::error::RenderError;

/// Name given to templates read from stdin.
pub const STDIN_TEMPLATE_NAME: &str = "<stdin>";

/// Source of the template text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum InputSource {
    /// Read from standard input
    #[default]
    Stdin,
    /// Read a specific file
    File(PathBuf),
}

impl InputSource {
    /// Builds a source from an optional path; `None` means stdin.
    pub fn from_path(path: Option<PathBuf>) -> Self {
        path.map(InputSource::File).unwrap_or_default()
    }

    /// Reads the whole template.
    pub fn read_with<S: StdinReader>(&self, stdin: &S) -> Result<String, RenderError> {
        match self {
            InputSource::Stdin => {
                if stdin.is_terminal() {
                    debug!("reading template from an interactive terminal");
                }
                stdin.read_to_string().map_err(|source| RenderError::Input {
                    path: STDIN_TEMPLATE_NAME.to_string(),
                    source,
                })
            }
            InputSource::File(path) => {
                std::fs::read_to_string(path).map_err(|source| RenderError::Input {
                    path: path.display().to_string(),
                    source,
                })
            }
        }
    }

    /// Name under which the template is registered with the engine.
    pub fn template_name(&self) -> String {
        match self {
            InputSource::Stdin => STDIN_TEMPLATE_NAME.to_string(),
            InputSource::File(path) => path.display().to_string(),
        }
    }

    /// Directory that `include` statements resolve against, if any.
    pub fn base_dir(&self) -> Option<&Path> {
        match self {
            InputSource::Stdin => None,
            InputSource::File(path) => Some(
                path.parent()
                    .filter(|p| !p.as_os_str().is_empty())
                    .unwrap_or_else(|| Path::new(".")),
            ),
        }
    }
}

/// Destination for rendered output.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OutputDestination {
    /// Write to standard output
    #[default]
    Stdout,
    /// Write to a specific file (created or truncated)
    File(PathBuf),
}

impl OutputDestination {
    /// Builds a destination from an optional path; `None` means stdout.
    pub fn from_path(path: Option<PathBuf>) -> Self {
        path.map(OutputDestination::File).unwrap_or_default()
    }

    /// Writes the rendered text exactly as produced.
    pub fn write_text(&self, content: &str) -> Result<(), RenderError> {
        match self {
            OutputDestination::Stdout => {
                let stdout = std::io::stdout();
                let mut handle = stdout.lock();
                handle
                    .write_all(content.as_bytes())
                    .and_then(|_| handle.flush())
                    .map_err(|source| RenderError::Output {
                        path: "<stdout>".to_string(),
                        source,
                    })
            }
            OutputDestination::File(path) => validate_path(path)
                .and_then(|_| std::fs::write(path, content))
                .map_err(|source| RenderError::Output {
                    path: path.display().to_string(),
                    source,
                }),
        }
    }
}

/// Validates that a file path's parent directory exists.
fn validate_path(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Parent directory does not exist: {}", parent.display()),
            ));
        }
    }
    Ok(())
}
