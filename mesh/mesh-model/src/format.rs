//! STL encoding variants.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The two STL wire encodings, plus the undetermined case.
///
/// `Unknown` is a legitimate detection outcome for ambiguous or non-STL
/// input; a parsed model always carries `Ascii` or `Binary`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum StlFormat {
    /// Text variant: `solid` / `facet` / `vertex` keyword grammar.
    Ascii,
    /// Fixed-layout variant: 80-byte header, u32 count, 50-byte records.
    Binary,
    /// Format could not be determined.
    Unknown,
}

impl fmt::Display for StlFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ascii => "ASCII",
            Self::Binary => "binary",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}
