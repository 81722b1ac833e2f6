//! ASCII/binary format detection.
//!
//! The two STL variants are mutually confusable: an ASCII file starts with
//! `solid`, but binary headers are free-form and sometimes start with
//! `solid` too. Detection therefore layers ordered heuristics, first match
//! wins:
//!
//! 1. inputs shorter than 5 bytes are `Unknown`;
//! 2. a `solid` prefix classifies ASCII, unless the byte length also
//!    satisfies the binary size equation, in which case a keyword census
//!    breaks the tie;
//! 3. no `solid` prefix but a consistent binary size classifies binary;
//! 4. otherwise a printable-character ratio over a 1000-byte sample decides.
//!
//! The thresholds below are load-bearing: downstream behavior and tests
//! depend on them, so they must not be tuned. Ambiguous or adversarial
//! input may still be misclassified; that is accepted behavior.

use mesh_model::StlFormat;
use tracing::debug;

use crate::binary::{BINARY_PRELUDE_LEN, BINARY_RECORD_LEN};

/// Inputs shorter than this are `Unknown`.
const MIN_STL_LEN: u64 = 5;

/// Bytes inspected for the `solid` prefix.
const PREFIX_LEN: usize = 100;

/// Bytes sampled for keyword and printability analysis.
const SAMPLE_LEN: usize = 1000;

/// Tolerance on the binary size equation, for optional trailing bytes.
const SIZE_TOLERANCE: u64 = 2;

/// ASCII keywords counted when breaking the `solid`-prefix tie.
const TIE_BREAK_KEYWORDS: [&str; 5] = ["facet", "vertex", "endloop", "endfacet", "endsolid"];

/// Distinct keywords required to classify the ambiguous case as ASCII.
const MIN_DISTINCT_KEYWORDS: usize = 2;

/// Printable-character ratio above which content analysis says ASCII.
const PRINTABLE_RATIO: f64 = 0.8;

/// Classify a byte buffer as ASCII, binary, or unknown STL.
///
/// # Example
///
/// ```
/// use stl_io::detect_format;
/// use mesh_model::StlFormat;
///
/// assert_eq!(detect_format(b"solid part\nfacet normal 0 0 1\n"), StlFormat::Ascii);
/// assert_eq!(detect_format(b"xy"), StlFormat::Unknown);
/// ```
#[must_use]
pub fn detect_format(bytes: &[u8]) -> StlFormat {
    detect_with_total_len(bytes, bytes.len() as u64)
}

/// Check whether the buffer is structurally a valid binary STL: the
/// declared triangle count at bytes 80..84 must make `84 + 50·count`
/// match the byte length within [`SIZE_TOLERANCE`].
#[must_use]
pub fn is_valid_binary_stl(bytes: &[u8]) -> bool {
    binary_size_check(bytes, bytes.len() as u64)
}

/// Classify from a prefix plus the known total length.
///
/// File-level detection reads only the head of the file; `total_len` is
/// the full file length needed by the binary size equation.
pub(crate) fn detect_with_total_len(prefix: &[u8], total_len: u64) -> StlFormat {
    if total_len < MIN_STL_LEN || prefix.is_empty() {
        return StlFormat::Unknown;
    }

    let head = String::from_utf8_lossy(&prefix[..prefix.len().min(PREFIX_LEN)]);
    let starts_with_solid = head
        .trim_start()
        .get(..5)
        .is_some_and(|tok| tok.eq_ignore_ascii_case("solid"));
    let binary_sized = binary_size_check(prefix, total_len);
    let sample = &prefix[..prefix.len().min(SAMPLE_LEN)];

    let format = if starts_with_solid {
        if binary_sized {
            // Ambiguous: a "solid" header on a binary-sized file. Let the
            // keyword census decide.
            if distinct_keyword_count(sample) >= MIN_DISTINCT_KEYWORDS {
                StlFormat::Ascii
            } else {
                StlFormat::Binary
            }
        } else {
            StlFormat::Ascii
        }
    } else if binary_sized {
        StlFormat::Binary
    } else {
        content_analysis(sample)
    };

    debug!(
        %format,
        total_len,
        starts_with_solid,
        binary_sized,
        "format detection"
    );
    format
}

/// The binary size equation against a known total length.
fn binary_size_check(prefix: &[u8], total_len: u64) -> bool {
    if prefix.len() < BINARY_PRELUDE_LEN || total_len < BINARY_PRELUDE_LEN as u64 {
        return false;
    }
    let declared = u32::from_le_bytes([prefix[80], prefix[81], prefix[82], prefix[83]]);
    let expected = (BINARY_PRELUDE_LEN as u64) + BINARY_RECORD_LEN as u64 * u64::from(declared);
    expected.abs_diff(total_len) <= SIZE_TOLERANCE
}

/// Count how many distinct ASCII keywords appear in the sample.
fn distinct_keyword_count(sample: &[u8]) -> usize {
    let text = String::from_utf8_lossy(sample).to_ascii_lowercase();
    TIE_BREAK_KEYWORDS
        .iter()
        .filter(|kw| text.contains(*kw))
        .count()
}

/// Fallback classification by printable-character ratio.
///
/// Undecodable samples are `Unknown`; decodable ones are ASCII only when
/// mostly printable *and* carrying at least one STL keyword.
fn content_analysis(sample: &[u8]) -> StlFormat {
    let Ok(text) = std::str::from_utf8(sample) else {
        return StlFormat::Unknown;
    };

    let mut total = 0usize;
    let mut printable = 0usize;
    for c in text.chars() {
        total += 1;
        if !c.is_control() || c.is_whitespace() {
            printable += 1;
        }
    }
    if total == 0 {
        return StlFormat::Unknown;
    }

    #[allow(clippy::cast_precision_loss)] // sample is at most 1000 chars
    let ratio = printable as f64 / total as f64;
    let lower = text.to_ascii_lowercase();
    let has_keyword =
        lower.contains("solid") || lower.contains("facet") || lower.contains("vertex");

    if ratio > PRINTABLE_RATIO && has_keyword {
        StlFormat::Ascii
    } else {
        StlFormat::Binary
    }
}
