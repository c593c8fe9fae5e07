//! Context locator: where the host keeps its shared application context.
//!
//! A locator is written `<qualified.ClassName>#<staticField>`. The host side
//! only needs the split at the first `#` ([`ContextLocator::split`]); the
//! guide validates the full shape before the locator is ever sent
//! ([`ContextLocator::parse`]).

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

const SEPARATOR: char = '#';

/// Reasons a locator is rejected on the guide side.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LocatorError {
    #[error("context locator must look like className#fieldName")]
    MissingSeparator,

    #[error("context locator must contain exactly one '#'")]
    MultipleSeparators,

    #[error("context locator has an empty class name")]
    EmptyClass,

    #[error("context locator has an empty field name")]
    EmptyField,

    #[error("'{0}' is not a valid qualified class name")]
    InvalidClassName(String),

    #[error("'{0}' is not a valid field name")]
    InvalidFieldName(String),
}

/// A decomposed `class#field` locator.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContextLocator {
    class_name: String,
    field_name: String,
}

impl ContextLocator {
    /// Split at the first `#`. Returns `None` when there is no `#` at all.
    ///
    /// Everything after the first `#` is the field name, even if it contains
    /// further separators; the host-side lookup then fails on its own.
    #[must_use]
    pub fn split(raw: &str) -> Option<Self> {
        let (class_name, field_name) = raw.split_once(SEPARATOR)?;
        Some(Self {
            class_name: class_name.to_string(),
            field_name: field_name.to_string(),
        })
    }

    /// Strict parse used for operator input.
    pub fn parse(raw: &str) -> Result<Self, LocatorError> {
        let raw = raw.trim();
        let located = Self::split(raw).ok_or(LocatorError::MissingSeparator)?;
        if located.field_name.contains(SEPARATOR) {
            return Err(LocatorError::MultipleSeparators);
        }
        if located.class_name.is_empty() {
            return Err(LocatorError::EmptyClass);
        }
        if located.field_name.is_empty() {
            return Err(LocatorError::EmptyField);
        }
        if !located.class_name.split('.').all(is_identifier) {
            return Err(LocatorError::InvalidClassName(located.class_name));
        }
        if !is_identifier(&located.field_name) {
            return Err(LocatorError::InvalidFieldName(located.field_name));
        }
        Ok(located)
    }

    #[must_use]
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    #[must_use]
    pub fn field_name(&self) -> &str {
        &self.field_name
    }
}

impl FromStr for ContextLocator {
    type Err = LocatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ContextLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{SEPARATOR}{}", self.class_name, self.field_name)
    }
}

fn is_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_alphabetic() || first == '_' || first == '$')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}
