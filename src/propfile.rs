// Property File Parser
// Parses and writes simple key = value property files
// One reader serves both the config file and the preference file

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

use thiserror::Error;

/// Parse property file text, invoking `handler` for each key-value pair.
///
/// Keys keep their case. `#` starts a comment that runs to the end of the
/// line. Whitespace around keys and values is trimmed. Lines without `=` are
/// skipped with a warning.
pub fn parse_propfile(data: &str, handler: &mut dyn FnMut(&str, &str)) {
    const NL: u8 = b'\x0A';
    const HASH: u8 = b'#';
    const EQ: u8 = b'=';

    let bytes = data.as_bytes();
    let len = bytes.len();
    let mut i = 0;

    while i < len {
        while i < len && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= len {
            break;
        }

        if bytes[i] == HASH {
            while i < len && bytes[i] != NL {
                i += 1;
            }
            if i < len {
                i += 1;
            }
            continue;
        }

        let key_start = i;
        while i < len && bytes[i] != EQ && bytes[i] != NL && bytes[i] != HASH {
            i += 1;
        }

        if i >= len {
            log::warn!("property file: bare keyword at end of file");
            break;
        }

        if bytes[i] != EQ {
            log::warn!("property file: key without value");
            while i < len && bytes[i] != NL {
                i += 1;
            }
            if i < len {
                i += 1;
            }
            continue;
        }

        let mut key_end = i;
        while key_end > key_start && bytes[key_end - 1].is_ascii_whitespace() {
            key_end -= 1;
        }
        let key = &data[key_start..key_end];

        i += 1;

        while i < len && bytes[i] != HASH && bytes[i] != NL && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        let value_start = i;

        while i < len && bytes[i] != HASH && bytes[i] != NL {
            i += 1;
        }
        let mut value_end = i;

        while value_end > value_start && bytes[value_end - 1].is_ascii_whitespace() {
            value_end -= 1;
        }
        let value = &data[value_start..value_end];

        while i < len && bytes[i] != NL {
            i += 1;
        }
        if i < len {
            i += 1;
        }

        handler(key, value);
    }
}

/// Escape characters that would otherwise end a value early
pub fn escape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '%' => out.push_str("%25"),
            '#' => out.push_str("%23"),
            '\n' => out.push_str("%0A"),
            '\r' => out.push_str("%0D"),
            _ => out.push(c),
        }
    }
    out
}

/// Reverse [`escape_value`]. Unrecognised escapes are kept verbatim.
pub fn unescape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(pos) = rest.find('%') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        let decoded = match tail.get(..3) {
            Some("%25") => Some('%'),
            Some("%23") => Some('#'),
            Some("%0A") => Some('\n'),
            Some("%0D") => Some('\r'),
            _ => None,
        };
        match decoded {
            Some(c) => {
                out.push(c);
                rest = &tail[3..];
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

/// Error type for property file I/O
#[derive(Debug, Error)]
pub enum PropertyError {
    #[error("property file not found")]
    FileNotFound,
    #[error("I/O error on property file: {0}")]
    Io(#[source] io::Error),
}

impl From<io::Error> for PropertyError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => PropertyError::FileNotFound,
            _ => PropertyError::Io(err),
        }
    }
}

/// Property file contents, kept sorted by key
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PropertyFile {
    properties: BTreeMap<String, String>,
}

impl PropertyFile {
    /// Parse property file text. Values are unescaped.
    pub fn parse(content: &str) -> Self {
        let mut properties = BTreeMap::new();
        parse_propfile(content, &mut |key, value| {
            if !key.is_empty() {
                properties.insert(key.to_string(), unescape_value(value));
            }
        });
        Self { properties }
    }

    /// Load a property file from disk
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, PropertyError> {
        let content = fs::read_to_string(path)?;
        Ok(Self::parse(&content))
    }

    /// Render as text, one escaped `key = value` per line
    pub fn render(&self) -> String {
        let mut content = String::new();
        for (key, value) in &self.properties {
            content.push_str(key);
            content.push_str(" = ");
            content.push_str(&escape_value(value));
            content.push('\n');
        }
        content
    }

    /// Save to disk, replacing the file through a temporary sibling so a
    /// failed write never leaves a truncated file behind
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), PropertyError> {
        let path = path.as_ref();
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, self.render())?;
        if let Err(err) = fs::rename(&tmp, path) {
            let _ = fs::remove_file(&tmp);
            return Err(err.into());
        }
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: &str, value: &str) {
        self.properties.insert(key.to_string(), value.to_string());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.properties.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.properties
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
