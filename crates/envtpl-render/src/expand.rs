//! Late expansion of `%NAME%` markers.
//!
//! Values in the environment have already gone through the shell's own
//! expansion by the time envtpl starts. A value that needs the *final* value of
//! another variable (one that may be reassigned after it) embeds `%NAME%`
//! instead, and envtpl resolves it here:
//!
//! ```text
//! BASE=/srv/a
//! DATA=%BASE%/data      # -> /srv/b/data
//! BASE=/srv/b
//! ```
//!
//! Resolution always reads the raw snapshot, never partially expanded values,
//! so it is a single pass with no recursion: substituted text is not scanned
//! again, processing order is irrelevant, and a variable that references itself
//! receives its own raw text.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// `%NAME%` where NAME is ASCII word characters and hyphens.
static MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"%([A-Za-z0-9_-]+)%").expect("a valid marker expression"));

/// Raw environment values keyed by name.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    values: HashMap<String, String>,
}

impl Snapshot {
    /// Builds a snapshot from `(name, value)` pairs. Later duplicates win.
    pub fn new<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: vars
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Resolves every `%NAME%` marker in `raw` against this snapshot.
    ///
    /// Unknown names resolve to empty text. Anything that is not a well-formed
    /// marker is kept literally.
    pub fn expand(&self, raw: &str) -> String {
        MARKER
            .replace_all(raw, |caps: &Captures<'_>| {
                self.get(&caps[1]).unwrap_or_default().to_owned()
            })
            .into_owned()
    }
}
