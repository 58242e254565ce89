//! MiniJinja filter and function registration.
//!
//! MiniJinja already ships the generic helpers (`upper`, `lower`, `trim`,
//! `replace`, `default`, `join`, `length`, `tojson`, `indent`, ...). This module
//! adds the pieces deployment templates need on top of those:
//!
//! - pipe-syntax versions of the [`ExtendedString`] methods, usable on any
//!   string (`{[ "ca.pem" | load_relative_file(CERT_DIR) ]}`)
//! - encoding and prefix/suffix helpers (`b64enc`, `b64dec`, `trim_prefix`, ...)
//! - regular expression helpers (`regex_replace`, `regex_match`)
//! - context functions bound to one [`TemplateContext`] (`Filter`, `env`)
//! - [`value_methods`], the unknown-method hook that gives every string the
//!   [`ExtendedString`] methods (`{[ CERT.LoadFile() ]}`)

use std::fmt::Write as _;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::Utc;
use minijinja::{Environment, Error, ErrorKind, State, Value};
use minijinja_contrib::pycompat;
use regex::Regex;

use crate::context::TemplateContext;
use crate::value::{arg_text, sequence, ExtendedString};

/// Format used by `now()` when none is given.
pub const DEFAULT_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

fn extended(value: &Value) -> ExtendedString {
    ExtendedString::new(arg_text(value))
}

fn compile(pattern: &str) -> Result<Regex, Error> {
    Regex::new(pattern).map_err(|err| {
        Error::new(
            ErrorKind::InvalidOperation,
            format!("invalid regular expression {:?}", pattern),
        )
        .with_source(err)
    })
}

fn decode_base64(value: Value) -> Result<Value, Error> {
    let bytes = BASE64.decode(arg_text(&value).trim()).map_err(|err| {
        Error::new(ErrorKind::InvalidOperation, "b64dec: invalid base64 input").with_source(err)
    })?;
    let text = String::from_utf8(bytes)
        .unwrap_or_else(|err| String::from_utf8_lossy(err.as_bytes()).into_owned());
    Ok(Value::from(ExtendedString::new(text)))
}

/// Unknown-method hook resolving `Split`, `Fields`, `LoadFile`,
/// `LoadRelativeFile`, `ToJSON`, `ToBase64` and `String` on string values.
///
/// A missing name is the zero value: its methods run on the empty string, so
/// `{[ OPTIONAL.LoadFile() ]}` renders blank instead of failing. Any other
/// method falls through to minijinja's Python-compatible string methods
/// (`upper`, `startswith`, `split`, ...).
pub fn value_methods(
    state: &State,
    value: &Value,
    method: &str,
    args: &[Value],
) -> Result<Value, Error> {
    let receiver = if value.is_undefined() || value.is_none() {
        ExtendedString::empty()
    } else if let Some(text) = value.as_str() {
        ExtendedString::from(text)
    } else {
        return pycompat::unknown_method_callback(state, value, method, args);
    };

    match receiver.call_method(method, args) {
        Err(err) if err.kind() == ErrorKind::UnknownMethod => {
            pycompat::unknown_method_callback(state, value, method, args)
        }
        result => result,
    }
}

/// Registers all value filters on a minijinja environment.
pub fn register_filters(env: &mut Environment<'static>) {
    // Filter to append a newline to the value.
    // Usage: {[ content | nl ]} outputs content followed by \n
    env.add_filter("nl", |value: Value| -> String { format!("{}\n", value) });

    env.add_filter("load_file", |value: Value| -> Value {
        Value::from(extended(&value).load_file())
    });
    env.add_filter("load_relative_file", |value: Value, base: Value| -> Value {
        Value::from(extended(&value).load_relative_file(&arg_text(&base)))
    });
    env.add_filter("fields", |value: Value| -> Value {
        sequence(extended(&value).fields())
    });
    env.add_filter("split_on", |value: Value, sep: Value| -> Value {
        sequence(extended(&value).split(&arg_text(&sep)))
    });
    env.add_filter("to_json", |value: Value| -> Value {
        Value::from(extended(&value).to_json())
    });
    env.add_filter("b64enc", |value: Value| -> Value {
        Value::from(extended(&value).to_base64())
    });
    env.add_filter("b64dec", decode_base64);

    env.add_filter("trim_prefix", |value: Value, prefix: Value| -> String {
        let text = arg_text(&value);
        let prefix = arg_text(&prefix);
        text.strip_prefix(prefix.as_str())
            .map(ToOwned::to_owned)
            .unwrap_or(text)
    });
    env.add_filter("trim_suffix", |value: Value, suffix: Value| -> String {
        let text = arg_text(&value);
        let suffix = arg_text(&suffix);
        text.strip_suffix(suffix.as_str())
            .map(ToOwned::to_owned)
            .unwrap_or(text)
    });
    env.add_filter("has_prefix", |value: Value, prefix: Value| -> bool {
        arg_text(&value).starts_with(arg_text(&prefix).as_str())
    });
    env.add_filter("has_suffix", |value: Value, suffix: Value| -> bool {
        arg_text(&value).ends_with(arg_text(&suffix).as_str())
    });
    env.add_filter("quote", |value: Value| -> String {
        let text = arg_text(&value);
        let mut quoted = String::with_capacity(text.len() + 2);
        quoted.push('"');
        for c in text.chars() {
            if c == '"' || c == '\\' {
                quoted.push('\\');
            }
            quoted.push(c);
        }
        quoted.push('"');
        quoted
    });

    // {[ VERSION | regex_replace("^v", "") ]}
    env.add_filter(
        "regex_replace",
        |value: Value, pattern: Value, replacement: Option<Value>| -> Result<String, Error> {
            let search = compile(&arg_text(&pattern))?;
            let replacement = replacement.map(|r| arg_text(&r)).unwrap_or_default();
            Ok(search
                .replace_all(&arg_text(&value), replacement.as_str())
                .into_owned())
        },
    );
}

/// Registers global functions, binding `Filter` and `env` to `context`.
pub fn register_functions(env: &mut Environment<'static>, context: &TemplateContext) {
    let root = context.clone();
    env.add_function("Filter", move |pattern: Value| -> Value {
        Value::from(root.filter(&arg_text(&pattern)))
    });

    // Reads the built context, so late expansion applies here too.
    let root = context.clone();
    env.add_function("env", move |name: Value, default: Option<Value>| -> Value {
        match root.get(&arg_text(&name)) {
            Some(value) => Value::from(value.clone()),
            None => default
                .map(|d| Value::from(extended(&d)))
                .unwrap_or_else(|| Value::from(ExtendedString::empty())),
        }
    });

    env.add_function("b64dec", decode_base64);

    env.add_function("now", |format: Option<Value>| -> Result<String, Error> {
        let format = format
            .map(|f| arg_text(&f))
            .unwrap_or_else(|| DEFAULT_TIME_FORMAT.to_string());
        let mut out = String::new();
        write!(out, "{}", Utc::now().format(&format)).map_err(|_| {
            Error::new(
                ErrorKind::InvalidOperation,
                format!("now: invalid time format {:?}", format),
            )
        })?;
        Ok(out)
    });

    env.add_function(
        "regex_match",
        |pattern: Value, text: Value| -> Result<bool, Error> {
            Ok(compile(&arg_text(&pattern))?.is_match(&arg_text(&text)))
        },
    );
}
