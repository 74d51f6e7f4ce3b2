//! Struct field tags.
//!
//! A field may carry several tags, one per key, written in the conventional
//! raw form `prototype:"name,omitempty" json:"name"`. The engine reads one
//! key per side (source/target) and interprets its value as
//! `"<label>[,option]..."`; the label `-` skips the field.

use crate::domain::error::DomainError;

/// The full tag set of a struct field: an ordered list of `(key, value)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructTag {
    entries: Vec<(String, String)>,
}

impl StructTag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style entry.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.push((key.into(), value.into()));
        self
    }

    /// Parse the raw `key:"value" key2:"value2"` form.
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let invalid = |reason: &str| DomainError::InvalidTag {
            tag: raw.to_string(),
            reason: reason.to_string(),
        };

        let mut entries = Vec::new();
        let mut rest = raw.trim_start();
        while !rest.is_empty() {
            let colon = rest.find(':').ok_or_else(|| invalid("missing ':'"))?;
            let key = &rest[..colon];
            if key.is_empty() || key.chars().any(|c| c.is_whitespace() || c == '"') {
                return Err(invalid("malformed key"));
            }

            let quoted = &rest[colon + 1..];
            if !quoted.starts_with('"') {
                return Err(invalid("value must be quoted"));
            }

            let mut value = String::new();
            let mut escaped = false;
            let mut end = None;
            for (i, c) in quoted.char_indices().skip(1) {
                if escaped {
                    value.push(c);
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if c == '"' {
                    end = Some(i);
                    break;
                } else {
                    value.push(c);
                }
            }
            let end = end.ok_or_else(|| invalid("unterminated value"))?;

            entries.push((key.to_string(), value));
            rest = quoted[end + 1..].trim_start();
        }

        Ok(Self { entries })
    }

    /// Raw value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Parsed value for `key`.
    pub fn lookup(&self, key: &str) -> Option<TagSpec> {
        self.get(key).map(TagSpec::parse)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One parsed tag value: `"<label>[,option]..."`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagSpec {
    label: Option<String>,
    skip: bool,
    options: Vec<String>,
}

impl TagSpec {
    pub fn parse(value: &str) -> Self {
        if value == "-" {
            return Self {
                label: None,
                skip: true,
                options: Vec::new(),
            };
        }

        let mut parts = value.split(',');
        let label = parts
            .next()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string);
        let options = parts
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(str::to_string)
            .collect();

        Self {
            label,
            skip: false,
            options,
        }
    }

    /// The renamed label, if the tag names one.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn is_skip(&self) -> bool {
        self.skip
    }

    pub fn has_option(&self, option: &str) -> bool {
        self.options.iter().any(|o| o == option)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_multiple_keys() {
        let tag = StructTag::parse(r#"prototype:"name,omitempty" json:"n""#).unwrap();
        assert_eq!(tag.get("prototype"), Some("name,omitempty"));
        assert_eq!(tag.get("json"), Some("n"));
        assert_eq!(tag.get("yaml"), None);
    }

    #[test]
    fn parses_escaped_quotes() {
        let tag = StructTag::parse(r#"k:"a\"b""#).unwrap();
        assert_eq!(tag.get("k"), Some(r#"a"b"#));
    }

    #[test]
    fn rejects_unquoted_value() {
        assert!(StructTag::parse("prototype:name").is_err());
        assert!(StructTag::parse(r#"prototype:"name"#).is_err());
        assert!(StructTag::parse("noseparator").is_err());
    }

    #[test]
    fn spec_label_and_options() {
        let spec = TagSpec::parse("user_id,omitempty");
        assert_eq!(spec.label(), Some("user_id"));
        assert!(spec.has_option("omitempty"));
        assert!(!spec.is_skip());
    }

    #[test]
    fn spec_dash_skips() {
        let spec = TagSpec::parse("-");
        assert!(spec.is_skip());
        assert_eq!(spec.label(), None);
    }

    #[test]
    fn spec_options_without_label() {
        let spec = TagSpec::parse(",omitempty");
        assert_eq!(spec.label(), None);
        assert!(spec.has_option("omitempty"));
    }
}
