//! Template rendering.
//!
//! [`MiniJinjaEngine`] wraps a minijinja environment configured with envtpl's
//! delimiters, the zero-value policy for missing keys and the helper library
//! from [`filters`]. Every engine is bound to one [`TemplateContext`], which is
//! both the root of every render and the target of the global `Filter(...)`.
//!
//! ## Which Render Function?
//!
//! | Function | Use When |
//! |----------|----------|
//! | [`render`] | You already have the template text |
//! | [`render_input`] | Reading from an [`InputSource`], with `include` support for files |
//! | [`MiniJinjaEngine`] | Registering extra templates, filters or functions |

mod engine;
pub mod filters;

pub use engine::{
    syntax, MiniJinjaEngine, TemplateEngine, BLOCK_DELIMITERS, COMMENT_DELIMITERS,
    VARIABLE_DELIMITERS,
};
pub use filters::value_methods;

use tracing::debug;

use crate::context::TemplateContext;
use crate::env::StdinReader;
use crate::error::RenderError;
use crate::output::InputSource;

/// Renders template text against `context`.
pub fn render(source: &str, context: TemplateContext) -> Result<String, RenderError> {
    MiniJinjaEngine::new(context)?.render_template(source)
}

/// Reads the template from `input` and renders it against `context`.
///
/// File templates are registered under their path and may `include` siblings
/// from their own directory.
pub fn render_input<S: StdinReader>(
    input: &InputSource,
    stdin: &S,
    context: TemplateContext,
) -> Result<String, RenderError> {
    let source = input.read_with(stdin)?;
    let name = input.template_name();
    debug!(template = %name, bytes = source.len(), "read template");

    let mut engine = MiniJinjaEngine::new(context)?;
    if let Some(dir) = input.base_dir() {
        engine = engine.with_template_dir(dir);
    }
    engine.add_template(&name, &source)?;
    let rendered = engine.render_named(&name)?;
    debug!(template = %name, bytes = rendered.len(), "rendered template");
    Ok(rendered)
}
