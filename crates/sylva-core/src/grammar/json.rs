//! JSON deserialization for `grammar.json` files.
//!
//! The format tags rule variants with an uppercase `type` field and keeps
//! rules in an object whose key order is the definition order, so an
//! order-preserving map is required on the way in.

use indexmap::IndexMap;
use serde::Deserialize;

use super::types::{Grammar, Precedence, PrecedenceEntry, Rule};

/// Error loading a grammar description.
#[derive(Debug)]
pub enum LoadError {
    Json(serde_json::Error),
    Binary(postcard::Error),
    /// A rule variant this runtime does not model (e.g. `PREC_DYNAMIC`).
    UnsupportedRule(String),
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json(e) => write!(f, "JSON parse error: {e}"),
            Self::Binary(e) => write!(f, "binary decode error: {e}"),
            Self::UnsupportedRule(kind) => write!(f, "unsupported rule construct: {kind}"),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Json(e) => Some(e),
            Self::Binary(e) => Some(e),
            Self::UnsupportedRule(_) => None,
        }
    }
}

impl Grammar {
    /// Parses a grammar from `grammar.json` text.
    pub fn from_json(json: &str) -> Result<Self, LoadError> {
        let raw: RawGrammar = serde_json::from_str(json).map_err(LoadError::Json)?;
        raw.try_into()
    }
}

#[derive(Debug, Deserialize)]
struct RawGrammar {
    name: String,
    rules: IndexMap<String, RawRule>,
    #[serde(default)]
    extras: Vec<RawRule>,
    #[serde(default)]
    precedences: Vec<Vec<RawPrecedenceEntry>>,
    #[serde(default)]
    conflicts: Vec<Vec<String>>,
    #[serde(default)]
    externals: Vec<RawRule>,
    #[serde(default, rename = "inline")]
    inline_rules: Vec<String>,
    #[serde(default)]
    word: Option<String>,
}

impl TryFrom<RawGrammar> for Grammar {
    type Error = LoadError;

    fn try_from(raw: RawGrammar) -> Result<Self, LoadError> {
        fn convert_all(rules: Vec<RawRule>) -> Result<Vec<Rule>, LoadError> {
            rules.into_iter().map(Rule::try_from).collect()
        }

        Ok(Self {
            name: raw.name,
            rules: raw
                .rules
                .into_iter()
                .map(|(name, rule)| Ok((name, rule.try_into()?)))
                .collect::<Result<_, LoadError>>()?,
            extras: convert_all(raw.extras)?,
            precedences: raw
                .precedences
                .into_iter()
                .map(|v| v.into_iter().map(Into::into).collect())
                .collect(),
            conflicts: raw.conflicts,
            externals: convert_all(raw.externals)?,
            inline: raw.inline_rules,
            word: raw.word,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
#[allow(clippy::upper_case_acronyms, non_camel_case_types)]
enum RawRule {
    BLANK,
    STRING {
        value: String,
    },
    PATTERN {
        value: String,
        #[serde(default)]
        flags: Option<String>,
    },
    SYMBOL {
        name: String,
    },
    SEQ {
        members: Vec<RawRule>,
    },
    CHOICE {
        members: Vec<RawRule>,
    },
    REPEAT {
        content: Box<RawRule>,
    },
    REPEAT1 {
        content: Box<RawRule>,
    },
    FIELD {
        name: String,
        content: Box<RawRule>,
    },
    ALIAS {
        content: Box<RawRule>,
        value: String,
        named: bool,
    },
    TOKEN {
        content: Box<RawRule>,
    },
    IMMEDIATE_TOKEN {
        content: Box<RawRule>,
    },
    PREC {
        value: RawPrecedence,
        content: Box<RawRule>,
    },
    PREC_LEFT {
        value: RawPrecedence,
        content: Box<RawRule>,
    },
    PREC_RIGHT {
        value: RawPrecedence,
        content: Box<RawRule>,
    },
    /// Catch-all so unknown constructs fail with a named error instead of a
    /// serde type mismatch.
    #[serde(other)]
    UNSUPPORTED,
}

impl TryFrom<RawRule> for Rule {
    type Error = LoadError;

    fn try_from(raw: RawRule) -> Result<Self, LoadError> {
        fn conv(content: Box<RawRule>) -> Result<Box<Rule>, LoadError> {
            Ok(Box::new(Rule::try_from(*content)?))
        }
        fn conv_all(members: Vec<RawRule>) -> Result<Vec<Rule>, LoadError> {
            members.into_iter().map(Rule::try_from).collect()
        }

        Ok(match raw {
            RawRule::BLANK => Rule::Blank,
            RawRule::STRING { value } => Rule::String(value),
            RawRule::PATTERN { value, flags } => Rule::Pattern { value, flags },
            RawRule::SYMBOL { name } => Rule::Symbol(name),
            RawRule::SEQ { members } => Rule::Seq(conv_all(members)?),
            RawRule::CHOICE { members } => Rule::Choice(conv_all(members)?),
            RawRule::REPEAT { content } => Rule::Repeat(conv(content)?),
            RawRule::REPEAT1 { content } => Rule::Repeat1(conv(content)?),
            RawRule::FIELD { name, content } => Rule::Field {
                name,
                content: conv(content)?,
            },
            RawRule::ALIAS {
                content,
                value,
                named,
            } => Rule::Alias {
                content: conv(content)?,
                value,
                named,
            },
            RawRule::TOKEN { content } => Rule::Token(conv(content)?),
            RawRule::IMMEDIATE_TOKEN { content } => Rule::ImmediateToken(conv(content)?),
            RawRule::PREC { value, content } => Rule::Prec {
                value: value.into(),
                content: conv(content)?,
            },
            RawRule::PREC_LEFT { value, content } => Rule::PrecLeft {
                value: value.into(),
                content: conv(content)?,
            },
            RawRule::PREC_RIGHT { value, content } => Rule::PrecRight {
                value: value.into(),
                content: conv(content)?,
            },
            RawRule::UNSUPPORTED => {
                return Err(LoadError::UnsupportedRule("unknown type tag".into()));
            }
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawPrecedence {
    Integer(i32),
    Name(String),
}

impl From<RawPrecedence> for Precedence {
    fn from(raw: RawPrecedence) -> Self {
        match raw {
            RawPrecedence::Integer(n) => Precedence::Integer(n),
            RawPrecedence::Name(s) => Precedence::Name(s),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
#[allow(clippy::upper_case_acronyms)]
enum RawPrecedenceEntry {
    STRING { value: String },
    SYMBOL { name: String },
}

impl From<RawPrecedenceEntry> for PrecedenceEntry {
    fn from(raw: RawPrecedenceEntry) -> Self {
        match raw {
            RawPrecedenceEntry::STRING { value } => PrecedenceEntry::Name(value),
            RawPrecedenceEntry::SYMBOL { name } => PrecedenceEntry::Symbol(name),
        }
    }
}
