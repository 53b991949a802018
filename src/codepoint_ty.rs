use crate::error::{Error, Result};
use crate::utf16::{self, CodeUnits};
use std::{convert::TryFrom, fmt, str::FromStr};

/// A Unicode codepoint, keyed in storage by its hexadecimal string.
///
/// Any value in `0..=0x10FFFF` is accepted, surrogates included, because the
/// catalog is keyed by codepoint rather than by scalar value. Conversions to
/// text fail for the surrogate range.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Codepoint(u32);

impl Codepoint {
    /// Constructs a codepoint, returning `InvalidScalar` above U+10FFFF.
    pub fn from_scalar(v: u32) -> Result<Self> {
        if v > utf16::MAX_SCALAR {
            return Err(Error::InvalidScalar(v));
        }
        Ok(Codepoint(v))
    }

    /// Parses a hexadecimal codepoint string such as `1F600`.
    pub fn from_hex(hex: &str) -> Result<Self> {
        Self::from_scalar(utf16::hex_to_scalar(hex)?)
    }

    /// Retrieves the numeric value.
    pub fn value(self) -> u32 {
        self.0
    }

    /// The canonical key form: upper-case hex, at least four digits.
    pub fn to_hex(self) -> String {
        format!("{:04X}", self.0)
    }

    /// Retrieves the char this codepoint corresponds to, or `None` for surrogates.
    pub fn into_char(self) -> Option<char> {
        char::from_u32(self.0)
    }

    /// Returns whether this codepoint is usable as a character.
    pub fn is_scalar(self) -> bool {
        utf16::is_scalar(self.0)
    }

    /// The text this codepoint produces when typed.
    pub fn to_text(self) -> Result<String> {
        utf16::scalar_to_text(self.0)
    }

    /// The UTF-16 code units this codepoint produces, as a surrogate pair above U+FFFF.
    pub fn to_utf16(self) -> Result<CodeUnits> {
        utf16::scalar_to_utf16(self.0)
    }

    /// Returns the number of UTF-16 code units this codepoint needs, if it is a scalar.
    pub fn len_utf16(self) -> Option<usize> {
        self.is_scalar().then(|| utf16::len(self.0))
    }
}

impl From<char> for Codepoint {
    fn from(ch: char) -> Self {
        Codepoint(ch as u32)
    }
}

impl FromStr for Codepoint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl TryFrom<String> for Codepoint {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::from_hex(&s)
    }
}

impl From<Codepoint> for String {
    fn from(cp: Codepoint) -> String {
        cp.to_hex()
    }
}

impl fmt::Display for Codepoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04X}", self.0)
    }
}

impl fmt::Debug for Codepoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Codepoint(U+{:04X})", self.0)
    }
}
