//! The template context: environment variable name to [`ExtendedString`].
//!
//! [`ContextBuilder`] reads an environment snapshot through an [`EnvReader`],
//! resolves `%NAME%` markers (see [`crate::expand`]) and produces a
//! [`TemplateContext`]. The context is read-only afterwards.
//!
//! Inside templates the context is the root object, so every variable is a
//! top-level name. It also exposes methods to discover families of variables:
//!
//! ```text
//! {[% for secret in Filter("^VAULT_SECRET_\d+$").Values() %]}
//!   - {[ secret.LoadFile().ToJSON() ]}
//! {[% endfor %]}
//!
//! {[% for name, path in Filter("^FILE_") | items %]}{[ name ]}={[ path ]}{[% endfor %]}
//! ```
//!
//! Iteration is always in ascending key order. Looping over a context directly
//! (`{[% for f in Filter("^FILE_") %]}`) yields its *names*, like any mapping;
//! use `.Values()` for the values or `| items` for pairs.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use minijinja::value::{from_args, Enumerator, Object, ObjectRepr, Value};
use minijinja::{Error, ErrorKind, State};
use regex::Regex;
use tracing::{debug, warn};

use crate::env::{EnvReader, RealEnv};
use crate::expand::Snapshot;
use crate::value::{arg_text, no_args, ExtendedString};

/// The complete mapping handed to the template engine for one render.
///
/// Cloning shares the underlying map.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct TemplateContext {
    entries: Arc<BTreeMap<String, ExtendedString>>,
}

impl TemplateContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&ExtendedString> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries in ascending key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ExtendedString)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Returns the entries whose key matches `pattern`.
    ///
    /// The pattern is not anchored for you; use `^...$` to match whole keys.
    /// An invalid pattern is logged and yields an empty context so a single bad
    /// filter cannot abort a render.
    pub fn filter(&self, pattern: &str) -> TemplateContext {
        match self.try_filter(pattern) {
            Ok(filtered) => filtered,
            Err(err) => {
                warn!(pattern, error = %err, "invalid pattern");
                TemplateContext::new()
            }
        }
    }

    /// Like [`filter`](Self::filter) but reports an invalid pattern.
    pub fn try_filter(&self, pattern: &str) -> Result<TemplateContext, regex::Error> {
        let exp = Regex::new(pattern)?;
        Ok(self
            .iter()
            .filter(|(key, _)| exp.is_match(key))
            .map(|(key, value)| (key.to_owned(), value.clone()))
            .collect())
    }
}

impl FromIterator<(String, ExtendedString)> for TemplateContext {
    fn from_iter<I: IntoIterator<Item = (String, ExtendedString)>>(iter: I) -> Self {
        Self {
            entries: Arc::new(iter.into_iter().collect()),
        }
    }
}

impl fmt::Debug for TemplateContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries.iter()).finish()
    }
}

impl From<TemplateContext> for Value {
    fn from(context: TemplateContext) -> Self {
        Value::from_object(context)
    }
}

impl Object for TemplateContext {
    fn repr(self: &Arc<Self>) -> ObjectRepr {
        ObjectRepr::Map
    }

    fn get_value(self: &Arc<Self>, key: &Value) -> Option<Value> {
        self.get(key.as_str()?).cloned().map(Value::from)
    }

    fn enumerate(self: &Arc<Self>) -> Enumerator {
        Enumerator::Values(self.keys().map(Value::from).collect())
    }

    fn enumerator_len(self: &Arc<Self>) -> Option<usize> {
        Some(self.len())
    }

    fn call_method(
        self: &Arc<Self>,
        _state: &State,
        name: &str,
        args: &[Value],
    ) -> Result<Value, Error> {
        match name {
            "Filter" => {
                let (pattern,): (Value,) = from_args(args)?;
                Ok(Value::from(self.filter(&arg_text(&pattern))))
            }
            "Keys" => {
                no_args(name, args)?;
                Ok(Value::from(self.keys().map(Value::from).collect::<Vec<_>>()))
            }
            "Values" => {
                no_args(name, args)?;
                Ok(Value::from(
                    self.entries.values().cloned().map(Value::from).collect::<Vec<_>>(),
                ))
            }
            _ => Err(Error::new(
                ErrorKind::UnknownMethod,
                format!("context has no method '{}'", name),
            )),
        }
    }
}

/// Builds a [`TemplateContext`] from the environment.
///
/// # Testing
///
/// Use [`ContextBuilder::with_reader`] to build from a mock environment:
///
/// ```
/// use envtpl_render::context::ContextBuilder;
/// use envtpl_render::env::MockEnv;
///
/// let env = MockEnv::new()
///     .with_var("DATA", "%BASE%/data")
///     .with_var("BASE", "/srv");
/// let context = ContextBuilder::with_reader(env).build();
/// assert_eq!(context.get("DATA").unwrap().as_str(), "/srv/data");
/// ```
#[derive(Clone)]
pub struct ContextBuilder<R: EnvReader = RealEnv> {
    reader: Arc<R>,
}

impl ContextBuilder<RealEnv> {
    /// Create a builder over the real process environment.
    pub fn new() -> Self {
        Self {
            reader: Arc::new(RealEnv),
        }
    }
}

impl Default for ContextBuilder<RealEnv> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: EnvReader> ContextBuilder<R> {
    /// Create a builder with a custom environment reader.
    pub fn with_reader(reader: R) -> Self {
        Self {
            reader: Arc::new(reader),
        }
    }

    /// Snapshots the environment and late-expands every value against it.
    pub fn build(&self) -> TemplateContext {
        let vars = self.reader.vars();
        let snapshot = Snapshot::new(vars.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        let context: TemplateContext = vars
            .iter()
            .map(|(name, raw)| (name.clone(), ExtendedString::new(snapshot.expand(raw))))
            .collect();
        debug!(variables = context.len(), "built template context");
        context
    }
}
