//! Dot-separated content paths.
//!
//! `hero.buttons.primary.url` addresses a leaf, `about.kpiCards` a whole
//! sequence. The first segment must name a section. There is no index
//! syntax: sequence elements are updated by replacing the whole sequence.

use folio_types::SectionName;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors produced while parsing or walking a path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("empty path")]
    Empty,

    #[error("empty segment in path {0:?}")]
    EmptySegment(String),

    #[error("path {path:?} does not start with a section (found {section:?})")]
    UnknownSection { path: String, section: String },

    /// An intermediate segment holds a sequence or scalar.
    #[error("cannot descend into {at}: it is a {found}, not an object")]
    NotAnObject { at: String, found: &'static str },
}

/// A validated mutation path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentPath {
    section: SectionName,
    fields: Vec<String>,
}

impl ContentPath {
    /// Parses a dot-separated path.
    pub fn parse(path: &str) -> Result<Self, PathError> {
        if path.is_empty() {
            return Err(PathError::Empty);
        }
        let mut segments = path.split('.');
        let head = segments.next().unwrap_or_default();
        let section = SectionName::from_key(head).ok_or_else(|| {
            if head.is_empty() {
                PathError::EmptySegment(path.to_string())
            } else {
                PathError::UnknownSection {
                    path: path.to_string(),
                    section: head.to_string(),
                }
            }
        })?;

        let mut fields = Vec::new();
        for segment in segments {
            if segment.is_empty() {
                return Err(PathError::EmptySegment(path.to_string()));
            }
            fields.push(segment.to_string());
        }

        Ok(Self { section, fields })
    }

    /// Path addressing a whole section.
    pub fn section_root(section: SectionName) -> Self {
        Self {
            section,
            fields: Vec::new(),
        }
    }

    /// The section this path starts in.
    pub fn section(&self) -> SectionName {
        self.section
    }

    /// Field segments below the section.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// All segments, section key first.
    pub fn segments(&self) -> Vec<&str> {
        std::iter::once(self.section.as_str())
            .chain(self.fields.iter().map(String::as_str))
            .collect()
    }

    /// Number of segments including the section.
    pub fn len(&self) -> usize {
        self.fields.len() + 1
    }

    /// Always false: a path has at least its section segment.
    pub fn is_empty(&self) -> bool {
        false
    }
}

impl fmt::Display for ContentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments().join("."))
    }
}

impl FromStr for ContentPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
