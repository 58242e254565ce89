//! The string value type exposed to templates.
//!
//! Every entry of a [`TemplateContext`](crate::context::TemplateContext) is an
//! [`ExtendedString`]: an immutable string with a handful of methods that
//! templates can call directly on the value.
//!
//! Inside the engine the value is an ordinary string, so `==`, `in`, `length`
//! and the string filters behave as usual. The methods below are resolved by the
//! engine's unknown-method hook (see [`crate::template::value_methods`]), which
//! also applies them to string literals, and to missing names as if they were
//! the empty string.
//!
//! | Method | Result |
//! |--------|--------|
//! | `Split(sep)` | sequence of values split on the literal separator |
//! | `Fields()` | sequence of values split on runs of whitespace |
//! | `LoadFile()` | content of the file named by the value |
//! | `LoadRelativeFile(base)` | content of `base` + separator + value |
//! | `ToJSON()` | the value as a quoted JSON string literal |
//! | `ToBase64()` | standard padded base64 of the value's bytes |
//! | `String()` | the value as a plain template string |
//!
//! ```text
//! {[ CONFIG_PATH.LoadFile().ToJSON() ]}
//! {[% for host in HOSTS.Fields() %]}server {[ host ]};{[% endfor %]}
//! ```
//!
//! File loading and JSON encoding never abort a render. A failure is logged
//! with `tracing::warn!` and the operation yields an empty value, so the broken
//! field shows up blank in the generated document.

use std::fmt;
use std::path::MAIN_SEPARATOR;
use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use minijinja::value::{from_args, Value};
use minijinja::{Error, ErrorKind};
use tracing::warn;

/// An immutable string with template-callable helper operations.
///
/// Cloning is cheap: the text is shared.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ExtendedString(Arc<str>);

impl ExtendedString {
    /// Creates a value from anything that converts into a string.
    pub fn new(text: impl Into<String>) -> Self {
        Self(Arc::from(text.into()))
    }

    /// Returns an empty value.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns the underlying text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Splits on every occurrence of `sep`.
    ///
    /// An empty separator splits after each character. If both the value and
    /// the separator are empty the result is empty; an empty value with a
    /// non-empty separator yields a single empty element.
    pub fn split(&self, sep: &str) -> Vec<ExtendedString> {
        if sep.is_empty() {
            return self
                .0
                .chars()
                .map(|c| ExtendedString::new(c.to_string()))
                .collect();
        }
        self.0.split(sep).map(ExtendedString::from).collect()
    }

    /// Splits around runs of whitespace, dropping empty pieces.
    pub fn fields(&self) -> Vec<ExtendedString> {
        self.0.split_whitespace().map(ExtendedString::from).collect()
    }

    /// Reads the whole file whose path is this value.
    ///
    /// Returns an empty value (and logs a warning) if the file cannot be read.
    pub fn load_file(&self) -> ExtendedString {
        read_file_lossy(&self.0)
    }

    /// Reads `base_path` joined with this value by the platform separator.
    ///
    /// The join is purely textual: no normalization, no `..` resolution and no
    /// special handling of absolute values.
    pub fn load_relative_file(&self, base_path: &str) -> ExtendedString {
        let full_path = format!("{}{}{}", base_path, MAIN_SEPARATOR, self.0);
        read_file_lossy(&full_path)
    }

    /// Encodes the value as a JSON string literal, quotes included.
    ///
    /// Besides the mandatory JSON escapes, `<`, `>`, `&`, U+2028 and U+2029 are
    /// written as `\uXXXX` so the literal can be embedded anywhere.
    pub fn to_json(&self) -> ExtendedString {
        match serde_json::to_string(self.as_str()) {
            Ok(encoded) => ExtendedString::new(escape_json_sensitive(&encoded)),
            Err(err) => {
                warn!(value = %self.0, error = %err, "cannot convert value to JSON");
                ExtendedString::empty()
            }
        }
    }

    /// Standard (padded, non URL-safe) base64 encoding of the value's bytes.
    pub fn to_base64(&self) -> ExtendedString {
        ExtendedString::new(BASE64.encode(self.0.as_bytes()))
    }
}

fn read_file_lossy(path: &str) -> ExtendedString {
    match std::fs::read(path) {
        Ok(bytes) => match String::from_utf8(bytes) {
            Ok(text) => ExtendedString::new(text),
            Err(err) => ExtendedString::new(String::from_utf8_lossy(err.as_bytes()).into_owned()),
        },
        Err(err) => {
            warn!(path, error = %err, "error reading file");
            ExtendedString::empty()
        }
    }
}

/// Replaces characters that serde_json leaves raw but that are unsafe inside
/// HTML or JavaScript hosts. None of them can occur inside an escape sequence,
/// so a plain character scan is enough.
fn escape_json_sensitive(encoded: &str) -> String {
    let mut out = String::with_capacity(encoded.len());
    for c in encoded.chars() {
        match c {
            '<' => out.push_str("\\u003c"),
            '>' => out.push_str("\\u003e"),
            '&' => out.push_str("\\u0026"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            c => out.push(c),
        }
    }
    out
}

impl fmt::Debug for ExtendedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl fmt::Display for ExtendedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ExtendedString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ExtendedString {
    fn from(text: &str) -> Self {
        Self(Arc::from(text))
    }
}

impl From<String> for ExtendedString {
    fn from(text: String) -> Self {
        Self(Arc::from(text))
    }
}

impl From<ExtendedString> for Value {
    fn from(value: ExtendedString) -> Self {
        Value::from(value.as_str())
    }
}

impl ExtendedString {
    /// Runs the template method `name` on this value.
    ///
    /// Unknown names fail with [`ErrorKind::UnknownMethod`] so the caller can
    /// fall back to other method providers.
    pub fn call_method(&self, name: &str, args: &[Value]) -> Result<Value, Error> {
        match name {
            "Split" => {
                let (sep,): (Value,) = from_args(args)?;
                Ok(sequence(self.split(&arg_text(&sep))))
            }
            "Fields" => {
                no_args(name, args)?;
                Ok(sequence(self.fields()))
            }
            "LoadFile" => {
                no_args(name, args)?;
                Ok(Value::from(self.load_file()))
            }
            // The base may be a literal or another context value.
            "LoadRelativeFile" => {
                let (base,): (Value,) = from_args(args)?;
                Ok(Value::from(self.load_relative_file(&arg_text(&base))))
            }
            "ToJSON" => {
                no_args(name, args)?;
                Ok(Value::from(self.to_json()))
            }
            "ToBase64" => {
                no_args(name, args)?;
                Ok(Value::from(self.to_base64()))
            }
            "String" => {
                no_args(name, args)?;
                Ok(Value::from(self.as_str()))
            }
            _ => Err(Error::new(
                ErrorKind::UnknownMethod,
                format!("string value has no method '{}'", name),
            )),
        }
    }
}

pub(crate) fn no_args(method: &str, args: &[Value]) -> Result<(), Error> {
    if args.is_empty() {
        Ok(())
    } else {
        Err(Error::new(
            ErrorKind::TooManyArguments,
            format!("{}() takes no arguments", method),
        ))
    }
}

/// Converts a list of values into a template sequence of strings.
pub(crate) fn sequence(values: Vec<ExtendedString>) -> Value {
    Value::from(values.into_iter().map(Value::from).collect::<Vec<_>>())
}

/// Reads a template argument as text. Undefined and none read as empty.
pub(crate) fn arg_text(value: &Value) -> String {
    match value.as_str() {
        Some(text) => text.to_owned(),
        None if value.is_undefined() || value.is_none() => String::new(),
        None => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine as _;
    use proptest::prelude::*;

    fn texts(values: &[ExtendedString]) -> Vec<&str> {
        values.iter().map(ExtendedString::as_str).collect()
    }

    #[test]
    fn split_on_separator() {
        let value = ExtendedString::from("a,b,,c");
        assert_eq!(texts(&value.split(",")), vec!["a", "b", "", "c"]);
    }

    #[test]
    fn split_without_separator_returns_receiver() {
        let value = ExtendedString::from("abc");
        assert_eq!(texts(&value.split(";")), vec!["abc"]);
    }

    #[test]
    fn split_empty_separator_per_character() {
        let value = ExtendedString::from("añb");
        assert_eq!(texts(&value.split("")), vec!["a", "ñ", "b"]);
    }

    #[test]
    fn split_both_empty_is_empty() {
        assert!(ExtendedString::empty().split("").is_empty());
    }

    #[test]
    fn split_empty_value_with_separator() {
        assert_eq!(texts(&ExtendedString::empty().split(",")), vec![""]);
    }

    #[test]
    fn fields_discards_whitespace_runs() {
        let value = ExtendedString::from("  one \t two\n\nthree  ");
        assert_eq!(texts(&value.fields()), vec!["one", "two", "three"]);
    }

    #[test]
    fn fields_of_blank_input() {
        assert!(ExtendedString::from(" \t\n ").fields().is_empty());
        assert!(ExtendedString::empty().fields().is_empty());
    }

    #[test]
    fn load_file_reads_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secret.txt");
        std::fs::write(&path, "s3cr3t\n").unwrap();

        let value = ExtendedString::new(path.to_string_lossy());
        assert_eq!(value.load_file().as_str(), "s3cr3t\n");
    }

    #[test]
    fn load_file_missing_is_empty() {
        let value = ExtendedString::from("/definitely/not/here.txt");
        assert!(value.load_file().is_empty());
    }

    #[test]
    fn load_file_directory_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let value = ExtendedString::new(dir.path().to_string_lossy());
        assert!(value.load_file().is_empty());
    }

    #[test]
    fn load_relative_file_joins_base() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("certs")).unwrap();
        std::fs::write(dir.path().join("certs").join("ca.pem"), "PEM").unwrap();

        let value = ExtendedString::new(format!("certs{}ca.pem", MAIN_SEPARATOR));
        let base = dir.path().to_string_lossy();
        assert_eq!(value.load_relative_file(&base).as_str(), "PEM");
    }

    #[test]
    fn load_relative_file_missing_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let value = ExtendedString::from("nope.txt");
        assert!(value.load_relative_file(&dir.path().to_string_lossy()).is_empty());
    }

    #[test]
    fn to_json_quotes_and_escapes() {
        let value = ExtendedString::from("say \"hi\"\n\\ <b>&</b>");
        assert_eq!(
            value.to_json().as_str(),
            r#""say \"hi\"\n\\ \u003cb\u003e\u0026\u003c/b\u003e""#
        );
    }

    #[test]
    fn to_json_keeps_plain_unicode() {
        assert_eq!(ExtendedString::from("café").to_json().as_str(), "\"café\"");
        assert_eq!(
            ExtendedString::from("a\u{2028}b").to_json().as_str(),
            "\"a\\u2028b\""
        );
    }

    #[test]
    fn to_json_control_characters() {
        assert_eq!(
            ExtendedString::from("\u{1}\t").to_json().as_str(),
            "\"\\u0001\\t\""
        );
    }

    #[test]
    fn to_base64_standard_padded() {
        assert_eq!(ExtendedString::from("hello").to_base64().as_str(), "aGVsbG8=");
        assert_eq!(ExtendedString::empty().to_base64().as_str(), "");
    }

    #[test]
    fn value_converts_to_plain_string() {
        let value = Value::from(ExtendedString::from("plain"));
        assert_eq!(value.as_str(), Some("plain"));
        assert_eq!(value, Value::from("plain"));
        assert!(value.is_true());
        assert!(!Value::from(ExtendedString::empty()).is_true());
    }

    #[test]
    fn call_method_dispatches_by_name() {
        let value = ExtendedString::from("a,b");
        let parts = value.call_method("Split", &[Value::from(",")]).unwrap();
        assert_eq!(parts, Value::from(vec![Value::from("a"), Value::from("b")]));
        assert_eq!(
            value.call_method("ToBase64", &[]).unwrap().as_str(),
            Some("YSxi")
        );
        assert_eq!(value.call_method("String", &[]).unwrap().as_str(), Some("a,b"));
    }

    #[test]
    fn call_method_on_empty_value() {
        let empty = ExtendedString::empty();
        assert_eq!(empty.call_method("LoadFile", &[]).unwrap().as_str(), Some(""));
        assert_eq!(empty.call_method("ToBase64", &[]).unwrap().as_str(), Some(""));
        assert_eq!(
            empty.call_method("Split", &[Value::from(",")]).unwrap(),
            Value::from(vec![Value::from("")])
        );
    }

    #[test]
    fn call_method_argument_errors() {
        let value = ExtendedString::from("x");
        assert_eq!(
            value.call_method("Fields", &[Value::from(1)]).unwrap_err().kind(),
            ErrorKind::TooManyArguments
        );
        assert_eq!(
            value.call_method("Split", &[]).unwrap_err().kind(),
            ErrorKind::MissingArgument
        );
        assert_eq!(
            value.call_method("Frobnicate", &[]).unwrap_err().kind(),
            ErrorKind::UnknownMethod
        );
    }

    #[test]
    fn arg_text_reads_undefined_as_empty() {
        assert_eq!(arg_text(&Value::UNDEFINED), "");
        assert_eq!(arg_text(&Value::from(())), "");
        assert_eq!(arg_text(&Value::from(42)), "42");
        assert_eq!(arg_text(&Value::from("s")), "s");
    }

    proptest! {
        #[test]
        fn split_join_inverse(s in ".*", sep in "[,;|]{1,3}") {
            let parts = ExtendedString::new(s.clone()).split(&sep);
            let joined = texts(&parts).join(&sep);
            prop_assert_eq!(joined, s);
        }

        #[test]
        fn split_identity_without_separator(s in "[a-z ]*", sep in "[0-9]{1,2}") {
            let parts = ExtendedString::new(s.clone()).split(&sep);
            prop_assert_eq!(texts(&parts), vec![s.as_str()]);
        }

        #[test]
        fn base64_round_trips(s in ".*") {
            let encoded = ExtendedString::new(s.clone()).to_base64();
            let decoded = BASE64.decode(encoded.as_str()).unwrap();
            prop_assert_eq!(decoded, s.into_bytes());
        }
    }
}
