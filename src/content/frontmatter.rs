//! Front-matter parsing

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Failure to extract a front-matter block from a source file
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrontMatterError {
    #[error("no front-matter block")]
    Missing,
    #[error("{0}")]
    Malformed(String),
}

/// Accepts a single string or a list of strings; `null` reads as an empty list
fn string_or_vec<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::{self, SeqAccess, Visitor};
    use std::fmt;

    struct StringOrVec;

    impl<'de> Visitor<'de> for StringOrVec {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or a list of strings")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(vec![value.to_string()])
        }

        fn visit_string<E>(self, value: String) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(vec![value])
        }

        fn visit_seq<S>(self, mut seq: S) -> Result<Self::Value, S::Error>
        where
            S: SeqAccess<'de>,
        {
            let mut vec = Vec::new();
            while let Some(item) = seq.next_element::<String>()? {
                vec.push(item);
            }
            Ok(vec)
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Vec::new())
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Vec::new())
        }
    }

    deserializer.deserialize_any(StringOrVec).map(Some)
}

/// Raw front-matter of a post, before validation.
///
/// Every field is optional here so that a missing key can be reported by
/// name instead of as a generic deserialization error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontMatter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(alias = "date", skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,
    #[serde(
        deserialize_with = "string_or_vec",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

impl FrontMatter {
    /// Parse front-matter from content string
    /// Returns (front_matter, body)
    pub fn parse(content: &str) -> Result<(Self, &str), FrontMatterError> {
        let content = content.trim_start_matches('\u{feff}').trim_start();

        if content.starts_with("---") {
            return Self::parse_yaml(content);
        }

        if content.starts_with(";;;") {
            return Self::parse_json(content);
        }

        Err(FrontMatterError::Missing)
    }

    fn parse_yaml(content: &str) -> Result<(Self, &str), FrontMatterError> {
        let rest = &content[3..];
        let rest = rest.trim_start_matches(['\n', '\r']);

        let Some(end_pos) = find_closing_fence(rest) else {
            return Err(FrontMatterError::Missing);
        };

        let yaml_content = &rest[..end_pos];
        let body = &rest[end_pos + 4..];
        let body = body.trim_start_matches(['\n', '\r']);

        // A leading `---` may just be a horizontal rule
        if !has_yaml_structure(yaml_content) {
            return Err(FrontMatterError::Missing);
        }

        serde_yaml::from_str::<FrontMatter>(yaml_content)
            .map(|fm| (fm, body))
            .map_err(|e| FrontMatterError::Malformed(e.to_string()))
    }

    fn parse_json(content: &str) -> Result<(Self, &str), FrontMatterError> {
        let rest = &content[3..];
        let Some(end_pos) = rest.find(";;;") else {
            return Err(FrontMatterError::Malformed(
                "unterminated `;;;` block".to_string(),
            ));
        };

        let json_content = &rest[..end_pos];
        let body = rest[end_pos + 3..].trim_start_matches(['\n', '\r']);

        serde_json::from_str::<FrontMatter>(json_content)
            .map(|fm| (fm, body))
            .map_err(|e| FrontMatterError::Malformed(e.to_string()))
    }
}

/// Offset of the `\n---` that closes a YAML block
fn find_closing_fence(rest: &str) -> Option<usize> {
    if rest.starts_with("---") {
        // Empty block: the opening fence is immediately followed by the closing one
        return None;
    }
    rest.find("\n---")
}

/// Whether a block looks like `key: value` YAML rather than prose
fn has_yaml_structure(block: &str) -> bool {
    block.lines().any(|line| {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return false;
        }
        let Some(colon_pos) = trimmed.find(':') else {
            return false;
        };
        let key = &trimmed[..colon_pos];
        let is_valid_key = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
            && !matches!(key, "http" | "https" | "ftp");
        let after_colon = &trimmed[colon_pos + 1..];
        is_valid_key && (after_colon.is_empty() || after_colon.starts_with(' '))
    })
}
