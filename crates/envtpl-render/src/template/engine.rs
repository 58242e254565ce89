//! Template engine abstraction.
//!
//! This module defines the [`TemplateEngine`] trait used by the render driver.
//! The implementation is [`MiniJinjaEngine`], configured for envtpl's syntax:
//!
//! | Construct | Delimiters |
//! |-----------|------------|
//! | expression | `{[ ... ]}` |
//! | statement | `{[% ... %]}` |
//! | comment | `{[# ... #]}` |
//!
//! Plain `{{ }}` passes through untouched, so generated documents may contain
//! other template languages (Helm charts, Nomad job files) verbatim.
//!
//! A reference to a name that is not in the context is the zero value: it
//! renders as empty text, chained lookups like `{[ MISSING.field ]}` stay empty,
//! and value methods run on the empty string (`{[ MISSING.LoadFile() ]}` is
//! blank, `MISSING.Split(",")` is one empty element).
//!
//! Context values are plain strings, so `==`, `in`, `length` and the built-in
//! string filters work on them directly.

use std::path::Path;

use minijinja::syntax::SyntaxConfig;
use minijinja::{path_loader, AutoEscape, Environment, UndefinedBehavior, Value};
use tracing::debug;

use crate::context::TemplateContext;
use crate::error::RenderError;

use super::filters::{register_filters, register_functions, value_methods};

/// Opening and closing delimiters for expressions.
pub const VARIABLE_DELIMITERS: (&str, &str) = ("{[", "]}");
/// Opening and closing delimiters for statements.
pub const BLOCK_DELIMITERS: (&str, &str) = ("{[%", "%]}");
/// Opening and closing delimiters for comments.
pub const COMMENT_DELIMITERS: (&str, &str) = ("{[#", "#]}");

/// A template engine that renders templates against one bound context.
pub trait TemplateEngine {
    /// Compiles and renders a template string in one step.
    fn render_template(&self, source: &str) -> Result<String, RenderError>;

    /// Compiles a named template and caches it for [`render_named`](Self::render_named).
    fn add_template(&mut self, name: &str, source: &str) -> Result<(), RenderError>;

    /// Renders a previously registered (or loader-provided) template.
    fn render_named(&self, name: &str) -> Result<String, RenderError>;

    /// Checks if a template with the given name exists.
    fn has_template(&self, name: &str) -> bool;
}

/// Builds the delimiter configuration shared by every engine.
pub fn syntax() -> Result<SyntaxConfig, RenderError> {
    SyntaxConfig::builder()
        .block_delimiters(BLOCK_DELIMITERS.0, BLOCK_DELIMITERS.1)
        .variable_delimiters(VARIABLE_DELIMITERS.0, VARIABLE_DELIMITERS.1)
        .comment_delimiters(COMMENT_DELIMITERS.0, COMMENT_DELIMITERS.1)
        .build()
        .map_err(|err| RenderError::Config(err.to_string()))
}

/// MiniJinja-based template engine.
///
/// Output is never escaped and a trailing newline in the template is kept, so
/// the rendered document is byte-for-byte what the template describes.
///
/// # Example
///
/// ```rust
/// use envtpl_render::context::ContextBuilder;
/// use envtpl_render::env::MockEnv;
/// use envtpl_render::template::{MiniJinjaEngine, TemplateEngine};
///
/// let context = ContextBuilder::with_reader(MockEnv::new().with_var("NAME", "world")).build();
/// let engine = MiniJinjaEngine::new(context).unwrap();
///
/// assert_eq!(engine.render_template("Hello {[ NAME ]}!").unwrap(), "Hello world!");
/// assert_eq!(engine.render_template("{[ UNSET ]}|{{ raw }}").unwrap(), "|{{ raw }}");
/// ```
pub struct MiniJinjaEngine {
    env: Environment<'static>,
    context: TemplateContext,
}

impl MiniJinjaEngine {
    /// Creates an engine bound to `context` with all helpers registered.
    pub fn new(context: TemplateContext) -> Result<Self, RenderError> {
        let mut env = Environment::new();
        env.set_syntax(syntax()?);
        env.set_undefined_behavior(UndefinedBehavior::Chainable);
        env.set_auto_escape_callback(|_| AutoEscape::None);
        env.set_keep_trailing_newline(true);
        env.set_unknown_method_callback(value_methods);
        register_filters(&mut env);
        register_functions(&mut env, &context);
        Ok(Self { env, context })
    }

    /// Resolves `include`/`import` statements relative to `dir`.
    pub fn with_template_dir(mut self, dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        debug!(dir = %dir.display(), "resolving includes from directory");
        self.env.set_loader(path_loader(dir));
        self
    }

    /// The context every render uses as its root.
    pub fn context(&self) -> &TemplateContext {
        &self.context
    }

    /// Returns a reference to the underlying MiniJinja environment.
    pub fn environment(&self) -> &Environment<'static> {
        &self.env
    }

    /// Returns a mutable reference to the underlying MiniJinja environment.
    ///
    /// This allows callers to register extra filters or functions.
    pub fn environment_mut(&mut self) -> &mut Environment<'static> {
        &mut self.env
    }

    fn root(&self) -> Value {
        Value::from(self.context.clone())
    }
}

impl TemplateEngine for MiniJinjaEngine {
    fn render_template(&self, source: &str) -> Result<String, RenderError> {
        let tmpl = self
            .env
            .template_from_str(source)
            .map_err(RenderError::parse)?;
        Ok(tmpl.render(self.root())?)
    }

    fn add_template(&mut self, name: &str, source: &str) -> Result<(), RenderError> {
        self.env
            .add_template_owned(name.to_string(), source.to_string())
            .map_err(RenderError::parse)
    }

    fn render_named(&self, name: &str) -> Result<String, RenderError> {
        let tmpl = self.env.get_template(name).map_err(RenderError::parse)?;
        Ok(tmpl.render(self.root())?)
    }

    fn has_template(&self, name: &str) -> bool {
        self.env.get_template(name).is_ok()
    }
}
