//! Environment-driven template rendering.
//!
//! `envtpl-render` turns the process environment into a template context and
//! renders text templates against it. It is the library behind the `envtpl`
//! command, which generates deployment descriptors and configuration files
//! from environment variables.
//!
//! # Quick Start
//!
//! ```
//! use envtpl_render::{render, ContextBuilder, MockEnv};
//!
//! let env = MockEnv::new()
//!     .with_var("NAME", "world")
//!     .with_var("GREETING", "Hello %NAME%");
//! let context = ContextBuilder::with_reader(env).build();
//!
//! let out = render("{[ GREETING ]}! ({[ NAME.ToBase64() ]})", context).unwrap();
//! assert_eq!(out, "Hello world! (d29ybGQ=)");
//! ```
//!
//! # Template Language
//!
//! Templates are Jinja, with `{[ ]}` delimiters: `{[ NAME ]}` (not the Go-style
//! `{[ .NAME ]}`), `{[% for f in Filter("^FILE_").Values() %]}...{[% endfor %]}`.
//! Looping over a context yields names; `.Values()` yields values and
//! `| items` yields pairs.
//!
//! # Architecture
//!
//! ```text
//! EnvReader ──► ContextBuilder ──► TemplateContext ──► MiniJinjaEngine ──► OutputDestination
//!  (vars)      (%NAME% expansion)   (ExtendedString     ({[ ]} syntax,
//!                                    values, Filter)     helper library)
//! ```
//!
//! - [`expand`]: late expansion of `%NAME%` markers against the raw snapshot
//! - [`value`]: [`ExtendedString`] and its template methods
//! - [`context`]: [`TemplateContext`], [`ContextBuilder`] and regex filtering
//! - [`template`]: the engine, the helper library and render entry points
//! - [`output`]: where templates come from and where output goes
//!
//! # Testing
//!
//! Everything that touches the process goes through [`env::EnvReader`] and
//! [`env::StdinReader`], so tests can use [`MockEnv`] and [`MockStdin`].

pub mod context;
pub mod env;
mod error;
pub mod expand;
pub mod output;
pub mod template;
pub mod value;

pub use context::{ContextBuilder, TemplateContext};
pub use error::RenderError;
pub use output::{InputSource, OutputDestination, STDIN_TEMPLATE_NAME};
pub use template::{render, render_input, MiniJinjaEngine, TemplateEngine};
pub use value::ExtendedString;

// Re-export mock types for testing
pub use env::{MockEnv, MockStdin};
