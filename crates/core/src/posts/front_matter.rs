//! Split a markdown document into its YAML front matter and body.

use serde::{Deserialize, Serialize};

/// A post author: either a bare name or a structured profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Author {
    Name(String),
    Profile {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        picture: Option<String>,
    },
}

/// Recognized front matter keys. Unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrontMatter {
    pub title: Option<String>,
    /// ISO-8601; lexical order is chronological order.
    pub date: Option<String>,
    pub author: Option<Author>,
    pub excerpt: Option<String>,
    pub cover_image: Option<String>,
}

/// A parsed document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub front_matter: FrontMatter,
    pub body: String,
}

const DELIMITER: &str = "---";

/// Parse `raw`. A document without an opening `---` line is all body.
pub fn parse(raw: &str) -> Result<Document, serde_yaml::Error> {
    let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);

    let Some((yaml, body)) = split(raw) else {
        return Ok(Document {
            front_matter: FrontMatter::default(),
            body: raw.to_string(),
        });
    };

    let front_matter = if yaml.trim().is_empty() {
        FrontMatter::default()
    } else {
        serde_yaml::from_str(yaml)?
    };

    Ok(Document {
        front_matter,
        body: body.to_string(),
    })
}

/// Returns `(yaml, body)` when `raw` opens with a delimiter line that is
/// later closed.
fn split(raw: &str) -> Option<(&str, &str)> {
    let first_end = raw.find('\n')?;
    if raw[..first_end].trim_end_matches('\r') != DELIMITER {
        return None;
    }

    let rest = &raw[first_end + 1..];
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        let bare = line.trim_end_matches('\n').trim_end_matches('\r');
        if bare == DELIMITER {
            let yaml = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return Some((yaml, body));
        }
        offset += line.len();
    }
    None
}
