//! RDF terms: IRIs, blank nodes and literals

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An RDF term in subject, predicate, object or context position
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Term {
    /// Absolute IRI, stored without angle brackets
    Iri(String),
    /// Blank node label, stored without the `_:` prefix
    #[serde(rename = "bnode")]
    BlankNode(String),
    /// Literal with optional datatype IRI or language tag
    Literal {
        value: String,
        datatype: Option<String>,
        language: Option<String>,
    },
}

impl Term {
    pub fn iri(iri: impl Into<String>) -> Self {
        Self::Iri(iri.into())
    }

    /// Create a blank node with a fresh, random label
    pub fn blank() -> Self {
        Self::BlankNode(Uuid::new_v4().simple().to_string())
    }

    pub fn blank_labelled(label: impl Into<String>) -> Self {
        Self::BlankNode(label.into())
    }

    /// Plain string literal
    pub fn literal(value: impl Into<String>) -> Self {
        Self::Literal {
            value: value.into(),
            datatype: None,
            language: None,
        }
    }

    pub fn typed_literal(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        Self::Literal {
            value: value.into(),
            datatype: Some(datatype.into()),
            language: None,
        }
    }

    pub fn lang_literal(value: impl Into<String>, language: impl Into<String>) -> Self {
        Self::Literal {
            value: value.into(),
            datatype: None,
            language: Some(language.into()),
        }
    }

    pub fn is_iri(&self) -> bool {
        matches!(self, Self::Iri(_))
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Self::Literal { .. })
    }

    /// True for terms allowed in subject or context position
    pub fn is_resource(&self) -> bool {
        !self.is_literal()
    }

    /// The IRI string, if this is an IRI
    pub fn as_iri(&self) -> Option<&str> {
        match self {
            Self::Iri(iri) => Some(iri),
            _ => None,
        }
    }
}

impl std::fmt::Display for Term {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Iri(iri) => write!(f, "<{}>", iri),
            Self::BlankNode(label) => write!(f, "_:{}", label),
            Self::Literal {
                value,
                datatype,
                language,
            } => {
                write!(f, "\"{}\"", escape_literal(value))?;
                if let Some(lang) = language {
                    write!(f, "@{}", lang)
                } else if let Some(dt) = datatype {
                    write!(f, "^^<{}>", dt)
                } else {
                    Ok(())
                }
            }
        }
    }
}

fn escape_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out
}

impl From<&str> for Term {
    /// Parse the compact forms used on the command line: `_:label` is a blank
    /// node, `"text"` a plain literal, anything else (with or without angle
    /// brackets) an IRI.
    fn from(s: &str) -> Self {
        if let Some(label) = s.strip_prefix("_:") {
            Self::blank_labelled(label)
        } else if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') {
            Self::literal(&s[1..s.len() - 1])
        } else if s.len() >= 2 && s.starts_with('<') && s.ends_with('>') {
            Self::iri(&s[1..s.len() - 1])
        } else {
            Self::iri(s)
        }
    }
}
