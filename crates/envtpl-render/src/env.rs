//! Environment abstractions for testability.
//!
//! The context builder and the render driver never touch the process
//! environment or stdin directly. They go through [`EnvReader`] and
//! [`StdinReader`], so tests can run against deterministic mocks.

use std::io::{self, IsTerminal, Read};

use tracing::debug;

/// Abstraction over the environment variable table.
pub trait EnvReader: Send + Sync {
    /// Snapshot every `(name, value)` pair, in enumeration order.
    fn vars(&self) -> Vec<(String, String)>;
}

/// Abstraction over stdin reading.
pub trait StdinReader: Send + Sync {
    /// Check if stdin is a terminal (TTY).
    fn is_terminal(&self) -> bool;

    /// Read all content from stdin.
    fn read_to_string(&self) -> io::Result<String>;
}

// === Real implementations ===

/// Real environment variable reader.
///
/// Names or values that are not valid UTF-8 are converted lossily rather than
/// dropped, so every variable visible to the process ends up in the snapshot.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealEnv;

impl EnvReader for RealEnv {
    fn vars(&self) -> Vec<(String, String)> {
        std::env::vars_os()
            .map(|(name, value)| {
                if name.to_str().is_none() || value.to_str().is_none() {
                    debug!(name = ?name, "environment entry is not valid UTF-8, converting lossily");
                }
                (
                    name.to_string_lossy().into_owned(),
                    value.to_string_lossy().into_owned(),
                )
            })
            .collect()
    }
}

/// Real stdin reader using std::io.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealStdin;

impl StdinReader for RealStdin {
    fn is_terminal(&self) -> bool {
        std::io::stdin().is_terminal()
    }

    fn read_to_string(&self) -> io::Result<String> {
        let mut buffer = String::new();
        std::io::stdin().lock().read_to_string(&mut buffer)?;
        Ok(buffer)
    }
}

// === Mock implementations for testing ===

/// Mock environment for testing.
///
/// Keeps insertion order so tests can check that enumeration order does not
/// influence the built context. Setting an existing name replaces its value in
/// place.
#[derive(Debug, Clone, Default)]
pub struct MockEnv {
    vars: Vec<(String, String)>,
}

impl MockEnv {
    /// Create an empty mock environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an environment variable.
    pub fn with_var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        match self.vars.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.vars.push((name, value)),
        }
        self
    }
}

impl EnvReader for MockEnv {
    fn vars(&self) -> Vec<(String, String)> {
        self.vars.clone()
    }
}

/// Mock stdin reader for testing.
#[derive(Debug, Clone)]
pub struct MockStdin {
    is_terminal: bool,
    content: Option<String>,
}

impl MockStdin {
    /// Create a mock that simulates a terminal (no piped input).
    pub fn terminal() -> Self {
        Self {
            is_terminal: true,
            content: None,
        }
    }

    /// Create a mock that simulates piped input.
    pub fn piped(content: impl Into<String>) -> Self {
        Self {
            is_terminal: false,
            content: Some(content.into()),
        }
    }

    /// Create a mock whose read always fails.
    pub fn broken() -> Self {
        Self {
            is_terminal: false,
            content: None,
        }
    }
}

impl StdinReader for MockStdin {
    fn is_terminal(&self) -> bool {
        self.is_terminal
    }

    fn read_to_string(&self) -> io::Result<String> {
        match (&self.content, self.is_terminal) {
            (Some(content), _) => Ok(content.clone()),
            (None, true) => Ok(String::new()),
            (None, false) => Err(io::Error::new(io::ErrorKind::BrokenPipe, "stdin closed")),
        }
    }
}
