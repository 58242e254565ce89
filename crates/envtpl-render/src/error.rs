//! Error types for template rendering.
//!
//! [`RenderError`] covers everything that is fatal to a run: unreadable input,
//! unwritable output, template syntax errors and render-time failures.
//! Recoverable data problems (a missing file behind `LoadFile`, a bad `Filter`
//! pattern) are not errors; they are logged and produce empty values.

use std::io;

/// Error type for template rendering operations.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The template source could not be read.
    #[error("cannot read template {path}")]
    Input {
        path: String,
        #[source]
        source: io::Error,
    },

    /// The rendered output could not be written.
    #[error("cannot write output {path}")]
    Output {
        path: String,
        #[source]
        source: io::Error,
    },

    /// Template syntax error or compilation failure.
    #[error("error parsing template")]
    Parse(#[source] minijinja::Error),

    /// Template not found (root template or an `include`).
    #[error("template not found")]
    TemplateNotFound(#[source] minijinja::Error),

    /// Failure while executing the template.
    #[error("error generating output")]
    Render(#[source] minijinja::Error),

    /// Invalid engine configuration (e.g. delimiters).
    #[error("invalid template configuration: {0}")]
    Config(String),
}

impl RenderError {
    /// Wraps an error raised while compiling a template.
    pub fn parse(err: minijinja::Error) -> Self {
        match err.kind() {
            minijinja::ErrorKind::TemplateNotFound => RenderError::TemplateNotFound(err),
            _ => RenderError::Parse(err),
        }
    }
}

impl From<minijinja::Error> for RenderError {
    fn from(err: minijinja::Error) -> Self {
        use minijinja::ErrorKind;

        match err.kind() {
            ErrorKind::TemplateNotFound => RenderError::TemplateNotFound(err),
            ErrorKind::SyntaxError | ErrorKind::BadEscape => RenderError::Parse(err),
            _ => RenderError::Render(err),
        }
    }
}
