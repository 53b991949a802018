use crate::codepoint_ty::Codepoint;
use serde::{Deserialize, Serialize};

/// A named category of characters, such as a Unicode block.
///
/// Names use underscores where the display form has spaces (`Basic_Latin`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnicodeGroup {
    /// Unique key
    pub name: String,
}

impl UnicodeGroup {
    /// Creates a group from its key.
    pub fn new(name: impl Into<String>) -> Self {
        UnicodeGroup { name: name.into() }
    }

    /// Converts a display name such as `Basic Latin` back to a group.
    pub fn from_display_name(display: &str) -> Self {
        UnicodeGroup::new(display.replace(' ', "_"))
    }

    /// The name with underscores shown as spaces.
    pub fn display_name(&self) -> String {
        self.name.replace('_', " ")
    }
}

/// A character of the reference dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnicodeCharacter {
    /// Unique key
    pub codepoint: Codepoint,
    /// Canonical name; empty when the dataset has none.
    #[serde(default)]
    pub name: String,
    /// Key of the owning [`UnicodeGroup`].
    #[serde(rename = "group")]
    pub group_name: String,
}

impl UnicodeCharacter {
    /// Returns the canonical name, or `None` if it is empty.
    pub fn canonical_name(&self) -> Option<&str> {
        Some(self.name.as_str()).filter(|name| !name.is_empty())
    }
}

/// An alternate name of a character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnicodeCharacterAlias {
    /// Surrogate key, assigned in load order.
    #[serde(default, skip_serializing)]
    pub id: u32,
    /// Key of the aliased [`UnicodeCharacter`].
    pub codepoint: Codepoint,
    /// The alternate name.
    pub alias: String,
}

/// A user-selected codepoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Favorite {
    /// Surrogate key; higher ids were added later.
    pub id: u64,
    /// The favorited codepoint.
    pub codepoint: Codepoint,
}

/// A codepoint resolved for display: its text and the name to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedCharacter {
    /// The codepoint
    pub codepoint: Codepoint,
    /// Typed text, `None` for surrogates.
    pub text: Option<String>,
    /// Display name, or the unnamed placeholder.
    pub name: String,
    /// Set when the character comes from the favorites list.
    pub favorite_id: Option<u64>,
}
