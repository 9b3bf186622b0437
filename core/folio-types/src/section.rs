//! The closed set of top-level content sections.
//!
//! A site document has exactly one payload per section. Each section is
//! persisted as its own remote record whose document id is the section's
//! wire name.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A top-level content grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SectionName {
    PersonalInfo,
    SocialLinks,
    Navigation,
    Hero,
    About,
    Skills,
    Projects,
    Experience,
    Certifications,
    Contact,
}

impl SectionName {
    /// All sections in document order.
    pub const ALL: [SectionName; 10] = [
        SectionName::PersonalInfo,
        SectionName::SocialLinks,
        SectionName::Navigation,
        SectionName::Hero,
        SectionName::About,
        SectionName::Skills,
        SectionName::Projects,
        SectionName::Experience,
        SectionName::Certifications,
        SectionName::Contact,
    ];

    /// The key used in content documents and as the remote document id.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            SectionName::PersonalInfo => "personalInfo",
            SectionName::SocialLinks => "socialLinks",
            SectionName::Navigation => "navigation",
            SectionName::Hero => "hero",
            SectionName::About => "about",
            SectionName::Skills => "skills",
            SectionName::Projects => "projects",
            SectionName::Experience => "experience",
            SectionName::Certifications => "certifications",
            SectionName::Contact => "contact",
        }
    }

    /// Returns true for sections whose payload is an ordered sequence
    /// rather than an object.
    #[must_use]
    pub const fn is_sequence(&self) -> bool {
        matches!(self, SectionName::SocialLinks | SectionName::Navigation)
    }

    /// Looks a section up by its wire name.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == key)
    }
}

impl fmt::Display for SectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SectionName {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_key(s).ok_or_else(|| crate::Error::UnknownSection(s.to_string()))
    }
}

impl AsRef<str> for SectionName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}
