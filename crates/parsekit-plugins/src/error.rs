//! Parser error family
//!
//! [`ParserError`] is the root of every domain error a parser unit raises.
//! Lookups that come back empty raise an [`ElementNotFoundError`], either a
//! generic one or a tag-specific kind produced on demand by
//! [`not_found_factory`]:
//!
//! ```
//! use parsekit_plugins::error::{not_found_factory, raise_not_found, ParserError};
//!
//! let kind = not_found_factory("price");
//! assert_eq!(kind.type_name(), "PriceNotFoundError");
//!
//! let err = raise_not_found::<()>("price").unwrap_err();
//! assert!(err.is_element_not_found());
//! assert_eq!(err.to_string(), "Parsed object has no tag 'price'");
//! ```

use rhai::{Dynamic, Map};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_KIND_SERIAL: AtomicU64 = AtomicU64::new(1);

/// Kind field of a script-raised not-found payload
pub const SCRIPT_PAYLOAD_KIND: &str = "ElementNotFoundError";

/// A not-found error kind for one tag.
///
/// Each call to [`not_found_factory`] yields a new kind, also for a tag that
/// was seen before. Kinds compare by identity, so two kinds built from the
/// same tag are not equal even though their names and messages are.
#[derive(Debug, Clone)]
pub struct NotFoundKind {
    serial: u64,
    tag: String,
    type_name: String,
}

impl NotFoundKind {
    /// Tag this kind was produced for
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Synthesized name, `Capitalize(tag) + "NotFoundError"`
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Message carried by every instance of this kind
    pub fn message(&self) -> String {
        format!("Parsed object has no tag '{}'", self.tag)
    }

    /// Build an error instance of this kind
    pub fn create(&self) -> ElementNotFoundError {
        ElementNotFoundError::Tagged(self.clone())
    }

    /// Whether `err` is an instance of exactly this kind
    pub fn is_instance(&self, err: &ParserError) -> bool {
        err.not_found_kind() == Some(self)
    }

    /// Map thrown from scripts so the host can rebuild the error
    pub fn to_script_payload(&self) -> Map {
        let mut map = Map::new();
        map.insert("kind".into(), Dynamic::from(SCRIPT_PAYLOAD_KIND.to_string()));
        map.insert("type".into(), Dynamic::from(self.type_name.clone()));
        map.insert("tag".into(), Dynamic::from(self.tag.clone()));
        map.insert("message".into(), Dynamic::from(self.message()));
        map.insert("serial".into(), Dynamic::from(self.serial as i64));
        map
    }

    fn from_script_payload(map: &Map) -> Option<Self> {
        let kind = map.get("kind")?.clone().into_string().ok()?;
        if kind != SCRIPT_PAYLOAD_KIND {
            return None;
        }
        let tag = map.get("tag")?.clone().into_string().ok()?;
        let serial = map.get("serial")?.as_int().ok()?;

        Some(Self {
            serial: serial as u64,
            type_name: type_name_for(&tag),
            tag,
        })
    }
}

impl PartialEq for NotFoundKind {
    fn eq(&self, other: &Self) -> bool {
        self.serial == other.serial
    }
}

impl Eq for NotFoundKind {}

impl std::fmt::Display for NotFoundKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.type_name)
    }
}

/// Produce a new not-found kind for `tag`.
///
/// The tag is not validated; an empty tag yields `NotFoundError` with the
/// message `Parsed object has no tag ''`.
pub fn not_found_factory(tag: &str) -> NotFoundKind {
    NotFoundKind {
        serial: NEXT_KIND_SERIAL.fetch_add(1, Ordering::Relaxed),
        tag: tag.to_string(),
        type_name: type_name_for(tag),
    }
}

/// Fail with a freshly produced `<Tag>NotFoundError`. Never returns `Ok`.
pub fn raise_not_found<T>(tag: &str) -> Result<T, ParserError> {
    Err(not_found_factory(tag).create().into())
}

fn type_name_for(tag: &str) -> String {
    format!("{}NotFoundError", capitalize(tag))
}

/// First character title-cased, the rest lower-cased in context (final sigma)
fn capitalize(s: &str) -> String {
    let Some(first) = s.chars().next() else {
        return String::new();
    };

    let lowered = s.to_lowercase();
    let first_len: usize = first.to_lowercase().map(char::len_utf8).sum();

    let mut out = titlecase(first);
    out.push_str(&lowered[first_len..]);
    out
}

fn titlecase(c: char) -> String {
    let single = match c {
        'Ǆ'..='ǆ' => Some('ǅ'),
        'Ǉ'..='ǉ' => Some('ǈ'),
        'Ǌ'..='ǌ' => Some('ǋ'),
        'Ǳ'..='ǳ' => Some('ǲ'),
        'ᾀ'..='ᾇ' | 'ᾐ'..='ᾗ' | 'ᾠ'..='ᾧ' => char::from_u32(c as u32 + 8),
        'ᾳ' => Some('ᾼ'),
        'ῃ' => Some('ῌ'),
        'ῳ' => Some('ῼ'),
        _ => None,
    };
    if let Some(t) = single {
        return t.to_string();
    }
    if c == 'ŉ' {
        return "ʼN".to_string();
    }

    // Expanding upper cases (ß, ligatures) keep only their first letter upper
    let mut upper = c.to_uppercase();
    match upper.next() {
        Some(head) => std::iter::once(head)
            .chain(upper.flat_map(char::to_lowercase))
            .collect(),
        None => c.to_string(),
    }
}

/// Has no HTML element
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ElementNotFoundError {
    /// Untagged lookup failure
    #[error("{0}")]
    Generic(String),

    /// Failure of a tag-specific kind
    #[error("{}", .0.message())]
    Tagged(NotFoundKind),
}

impl ElementNotFoundError {
    /// Tag of a tagged error
    pub fn tag(&self) -> Option<&str> {
        self.kind().map(NotFoundKind::tag)
    }

    /// Kind of a tagged error
    pub fn kind(&self) -> Option<&NotFoundKind> {
        match self {
            Self::Generic(_) => None,
            Self::Tagged(kind) => Some(kind),
        }
    }

    /// `ElementNotFoundError` or the synthesized kind name
    pub fn type_name(&self) -> &str {
        match self {
            Self::Generic(_) => "ElementNotFoundError",
            Self::Tagged(kind) => kind.type_name(),
        }
    }
}

/// Base error of the parser domain
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ParserError {
    /// Has no HTML element
    #[error(transparent)]
    ElementNotFound(#[from] ElementNotFoundError),

    /// Raw data does not exist
    #[error("{0}")]
    DataNotFound(String),

    /// Got an unexpected argument value
    #[error("{0}")]
    ParameterValue(String),

    /// Object cannot be empty
    #[error("{0}")]
    Empty(String),

    /// URL is invalid
    #[error("{0}")]
    Url(String),
}

impl ParserError {
    /// Whether this error belongs to the element-not-found family
    pub fn is_element_not_found(&self) -> bool {
        matches!(self, Self::ElementNotFound(_))
    }

    /// Kind of a tagged not-found error
    pub fn not_found_kind(&self) -> Option<&NotFoundKind> {
        match self {
            Self::ElementNotFound(err) => err.kind(),
            _ => None,
        }
    }

    /// Name of the concrete error type
    pub fn type_name(&self) -> &str {
        match self {
            Self::ElementNotFound(err) => err.type_name(),
            Self::DataNotFound(_) => "DataNotFoundError",
            Self::ParameterValue(_) => "ParameterValueError",
            Self::Empty(_) => "EmptyError",
            Self::Url(_) => "URLError",
        }
    }

    /// Rebuild an error thrown by a script through `raise_notfound`
    pub fn from_script_value(value: &Dynamic) -> Option<Self> {
        let map = value.clone().try_cast::<Map>()?;
        NotFoundKind::from_script_payload(&map)
            .map(|kind| Self::ElementNotFound(ElementNotFoundError::Tagged(kind)))
    }
}
