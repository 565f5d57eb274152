//! Grid Code Grammar
//!
//! 격자코드 파싱: "다사629455" -> (row=629, col=455)
//!
//! A code is exactly 2 non-numeric prefix characters followed by 6 ASCII
//! digits. The digit string `n` splits into `row = n / 1000` and
//! `col = n % 1000`, so each axis carries 3 decimal digits (0..=999).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{GridError, Result};

/// Number of prefix characters (map sheet letters)
pub const PREFIX_LEN: usize = 2;
/// Number of trailing digits
pub const DIGIT_LEN: usize = 6;
/// Indices per axis (3 decimal digits)
pub const AXIS_SPAN: u32 = 1000;

/// Parsed grid code
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GridCode {
    prefix: String,
    row: u32,
    col: u32,
}

impl GridCode {
    /// Parse a code, trimming surrounding whitespace.
    pub fn parse(code: &str) -> Result<Self> {
        let malformed = || GridError::MalformedCode {
            code: code.to_string(),
        };
        let trimmed = code.trim();

        let mut chars = trimmed.char_indices();
        let mut prefix_end = 0;
        for _ in 0..PREFIX_LEN {
            let (idx, ch) = chars.next().ok_or_else(malformed)?;
            if ch.is_numeric() || ch.is_whitespace() {
                return Err(malformed());
            }
            prefix_end = idx + ch.len_utf8();
        }

        let digits = &trimmed[prefix_end..];
        if digits.len() != DIGIT_LEN || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }
        let n: u32 = digits.parse().map_err(|_| malformed())?;

        Ok(Self {
            prefix: trimmed[..prefix_end].to_string(),
            row: n / AXIS_SPAN,
            col: n % AXIS_SPAN,
        })
    }

    /// Rebuild a code from its prefix and indices (inverse of [`GridCode::parse`]).
    pub fn from_indices(prefix: &str, row: u32, col: u32) -> Result<Self> {
        if row >= AXIS_SPAN || col >= AXIS_SPAN {
            return Err(GridError::IndexOutOfRange { row, col });
        }
        let valid_prefix = prefix.chars().count() == PREFIX_LEN
            && prefix.chars().all(|c| !c.is_numeric() && !c.is_whitespace());
        if !valid_prefix {
            return Err(GridError::MalformedCode {
                code: format!("{prefix}{row:03}{col:03}"),
            });
        }
        Ok(Self {
            prefix: prefix.to_string(),
            row,
            col,
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn row(&self) -> u32 {
        self.row
    }

    pub fn col(&self) -> u32 {
        self.col
    }

    pub fn indices(&self) -> (u32, u32) {
        (self.row, self.col)
    }

    /// The 6-digit numeric suffix
    pub fn digits(&self) -> String {
        format!("{:03}{:03}", self.row, self.col)
    }
}

/// Decode a code straight into `(row, col)`.
pub fn parse(code: &str) -> Result<(u32, u32)> {
    GridCode::parse(code).map(|c| c.indices())
}

impl fmt::Display for GridCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", self.prefix, self.digits())
    }
}

impl FromStr for GridCode {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self> {
        GridCode::parse(s)
    }
}

impl TryFrom<String> for GridCode {
    type Error = GridError;

    fn try_from(value: String) -> Result<Self> {
        GridCode::parse(&value)
    }
}

impl From<GridCode> for String {
    fn from(code: GridCode) -> Self {
        code.to_string()
    }
}
