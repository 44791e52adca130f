//! Workflow command encoding.
//!
//! A command travels as a single line of text:
//!
//! ```text
//! ::<name>[ key1=v1,key2=v2,...]::<payload>
//! ```
//!
//! Property values and the payload are escaped so that neither can break the
//! line apart. Escaping replaces `%` first, so the sequences it inserts are
//! never escaped a second time.

use crate::error::{Error, Result};
use indexmap::IndexMap;
use std::fmt;

/// Delimiter that opens a command and separates it from its payload.
pub const CMD_STRING: &str = "::";

const DATA_ESCAPES: &[(&str, char)] = &[("%25", '%'), ("%0D", '\r'), ("%0A", '\n')];

const PROPERTY_ESCAPES: &[(&str, char)] = &[
    ("%25", '%'),
    ("%0D", '\r'),
    ("%0A", '\n'),
    ("%3A", ':'),
    ("%2C", ','),
];

/// Ordered key/value properties of a command.
///
/// Iteration follows insertion order. Entries whose value is `None` are kept
/// in the map but never encoded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandProperties {
    entries: IndexMap<String, Option<String>>,
}

impl CommandProperties {
    /// Create an empty property map.
    pub fn new() -> Self {
        Self::default()
    }

    /// The single `name=<name>` map used by `set-env`, `set-output` and
    /// `save-state`.
    pub fn named(name: &str) -> Self {
        Self::new().with("name", name)
    }

    /// Add a present value (builder style).
    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.insert(key, Some(value.into()));
        self
    }

    /// Insert or replace an entry. Replacing keeps the original position.
    pub fn insert(&mut self, key: &str, value: Option<String>) {
        self.entries.insert(key.to_string(), value);
    }

    /// Get a present value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).and_then(|v| v.as_deref())
    }

    /// Entries that carry a value, in insertion order.
    pub fn present(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .filter_map(|(k, v)| v.as_deref().map(|v| (k.as_str(), v)))
    }

    /// True when no entry would be encoded.
    pub fn is_blank(&self) -> bool {
        self.present().next().is_none()
    }

    /// Number of entries, including absent ones.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map has no entries at all.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<IndexMap<String, Option<String>>> for CommandProperties {
    fn from(entries: IndexMap<String, Option<String>>) -> Self {
        Self { entries }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for CommandProperties {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), Some(v.into())))
                .collect(),
        }
    }
}

/// A single protocol command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    name: String,
    properties: Option<CommandProperties>,
    message: String,
}

impl Command {
    /// Create a command. The name must not be empty.
    pub fn new(
        name: &str,
        properties: Option<CommandProperties>,
        message: impl Into<String>,
    ) -> Result<Self> {
        if name.is_empty() {
            return Err(Error::InvalidArgument("missing command name".to_string()));
        }

        Ok(Self {
            name: name.to_string(),
            properties,
            message: message.into(),
        })
    }

    /// The command name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The properties, if any were given.
    pub fn properties(&self) -> Option<&CommandProperties> {
        self.properties.as_ref()
    }

    /// The unescaped payload.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Encode into a single protocol line (without line terminator).
    pub fn encode(&self) -> String {
        self.to_string()
    }

    /// Decode a protocol line, as the orchestrator does.
    ///
    /// Returns `None` when the line is not a command, so plain log lines can
    /// be passed through untouched.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim_end_matches(['\r', '\n']);
        let rest = line.strip_prefix(CMD_STRING)?;
        let (head, payload) = rest.split_once(CMD_STRING)?;

        let (name, raw_properties) = match head.split_once(' ') {
            Some((name, props)) => (name, Some(props)),
            None => (head, None),
        };
        if name.is_empty() {
            return None;
        }

        let properties = match raw_properties {
            Some(raw) => {
                let mut properties = CommandProperties::new();
                for entry in raw.split(',').filter(|e| !e.is_empty()) {
                    let (key, value) = entry.split_once('=')?;
                    properties.insert(key, Some(unescape_property(value)));
                }
                Some(properties)
            }
            None => None,
        };

        Some(Self {
            name: name.to_string(),
            properties,
            message: unescape_data(payload),
        })
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(CMD_STRING)?;
        f.write_str(&self.name)?;

        if let Some(properties) = &self.properties {
            for (i, (key, value)) in properties.present().enumerate() {
                f.write_str(if i == 0 { " " } else { "," })?;
                write!(f, "{}={}", key, escape_property(value))?;
            }
        }

        f.write_str(CMD_STRING)?;
        f.write_str(&escape_data(&self.message))
    }
}

/// Encode a command line from its parts.
pub fn encode(name: &str, properties: Option<&CommandProperties>, payload: &str) -> Result<String> {
    Command::new(name, properties.cloned(), payload).map(|cmd| cmd.encode())
}

/// Escape a payload: `%`, CR and LF.
pub fn escape_data(s: &str) -> String {
    s.replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// Escape a property value: everything [`escape_data`] does, plus `:` and `,`.
pub fn escape_property(s: &str) -> String {
    escape_data(s).replace(':', "%3A").replace(',', "%2C")
}

/// Reverse [`escape_data`].
pub fn unescape_data(s: &str) -> String {
    unescape(s, DATA_ESCAPES)
}

/// Reverse [`escape_property`].
pub fn unescape_property(s: &str) -> String {
    unescape(s, PROPERTY_ESCAPES)
}

// Single left-to-right pass, so a decoded `%` never starts another sequence.
fn unescape(s: &str, escapes: &[(&str, char)]) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(idx) = rest.find('%') {
        out.push_str(&rest[..idx]);
        let tail = &rest[idx..];

        match escapes.iter().find(|(seq, _)| tail.starts_with(seq)) {
            Some((seq, ch)) => {
                out.push(*ch);
                rest = &tail[seq.len()..];
            }
            None => {
                out.push('%');
                rest = &tail[1..];
            }
        }
    }

    out.push_str(rest);
    out
}
