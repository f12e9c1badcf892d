//! Format-aware firmware version parsing and comparison.
//!
//! Devices report firmware versions in one of several numbering schemes.
//! Some report a human-readable dotted string, others expose a packed
//! 32-bit word that has to be decoded before it can be compared against
//! the version string a release declares.
//!
//! This module provides:
//!
//! - [`VersionFormat`]: the scheme a device (or release) declares.
//! - [`parse_for_format`]: decode a raw release version into the dotted
//!   representation implied by a scheme.
//! - [`compare`]: a format-aware three-way comparison.
//! - [`formats_to_string`]: a diagnostics helper joining declared format
//!   names.
//!
//! # Failure Semantics
//!
//! Parsing never hard-fails: a raw value that cannot be reinterpreted for
//! the requested scheme is returned unchanged, and malformed version
//! segments compare as equal. The validation pipeline must not abort on a
//! vendor's creative version string; the worst case is a less precise
//! comparison.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The numbering scheme used to interpret a firmware version string.
///
/// `Plain` versions are opaque strings compared lexically. The remaining
/// schemes describe how a packed 32-bit word maps onto dotted decimal
/// groups.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub enum VersionFormat {
    /// The scheme is not known; versions are compared segment-wise.
    #[default]
    Unknown,
    /// An opaque string; compared lexically, never reformatted.
    Plain,
    /// A single unsigned integer, e.g. `42`.
    Number,
    /// Two groups of 16 bits each, e.g. `1.259`.
    Pair,
    /// 8.8.16 bit groups, e.g. `1.2.3`.
    Triplet,
    /// Four groups of 8 bits each, e.g. `1.2.3.4`.
    Quad,
    /// Four bytes, each holding two binary-coded decimal digits.
    Bcd,
}

impl VersionFormat {
    /// The canonical name used in component metadata.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Plain => "plain",
            Self::Number => "number",
            Self::Pair => "pair",
            Self::Triplet => "triplet",
            Self::Quad => "quad",
            Self::Bcd => "bcd",
        }
    }

    /// Parses a declared format name, returning [`VersionFormat::Unknown`]
    /// for anything unrecognised.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "plain" => Self::Plain,
            "number" => Self::Number,
            "pair" => Self::Pair,
            "triplet" => Self::Triplet,
            "quad" => Self::Quad,
            "bcd" => Self::Bcd,
            _ => Self::Unknown,
        }
    }

    /// Returns `true` if the scheme decodes a packed 32-bit word.
    #[must_use]
    pub const fn is_numeric_scheme(self) -> bool {
        matches!(
            self,
            Self::Number | Self::Pair | Self::Triplet | Self::Quad | Self::Bcd
        )
    }
}

impl fmt::Display for VersionFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decodes a raw release version into the representation implied by the
/// given scheme.
///
/// For [`VersionFormat::Plain`] and [`VersionFormat::Unknown`] the raw
/// string is returned unchanged. For the numeric schemes the raw value is
/// parsed as a decimal or `0x`-prefixed hexadecimal integer fitting 32
/// bits and rendered as dotted groups.
///
/// Raw values that cannot be reinterpreted are returned unchanged; this
/// is never a hard error.
#[must_use]
pub fn parse_for_format(raw: &str, format: VersionFormat) -> String {
    if !format.is_numeric_scheme() {
        return raw.to_string();
    }
    let Some(word) = parse_u32(raw) else {
        return raw.to_string();
    };
    match format {
        VersionFormat::Number => word.to_string(),
        VersionFormat::Pair => format!("{}.{}", word >> 16, word & 0xffff),
        VersionFormat::Triplet => format!(
            "{}.{}.{}",
            (word >> 24) & 0xff,
            (word >> 16) & 0xff,
            word & 0xffff
        ),
        VersionFormat::Quad => format!(
            "{}.{}.{}.{}",
            (word >> 24) & 0xff,
            (word >> 16) & 0xff,
            (word >> 8) & 0xff,
            word & 0xff
        ),
        VersionFormat::Bcd => match bcd_groups(word) {
            Some([a, b, c, d]) => format!("{a}.{b}.{c}.{d}"),
            None => raw.to_string(),
        },
        VersionFormat::Unknown | VersionFormat::Plain => raw.to_string(),
    }
}

/// Three-way format-aware version comparison.
///
/// [`VersionFormat::Plain`] compares the whole strings lexically. Every
/// other scheme compares dot-separated segments numerically: missing
/// trailing segments compare as zero, and a segment pair where either
/// side is not a number compares as equal.
///
/// The result is a total order for well-formed inputs.
#[must_use]
pub fn compare(a: &str, b: &str, format: VersionFormat) -> Ordering {
    if format == VersionFormat::Plain {
        return a.cmp(b);
    }
    let left: Vec<&str> = a.split('.').collect();
    let right: Vec<&str> = b.split('.').collect();
    let depth = left.len().max(right.len());
    for i in 0..depth {
        let ls = left.get(i).copied().unwrap_or("0");
        let rs = right.get(i).copied().unwrap_or("0");
        let (Ok(lv), Ok(rv)) = (ls.parse::<u64>(), rs.parse::<u64>()) else {
            // Malformed segment: treat as equal rather than failing the
            // whole comparison.
            continue;
        };
        match lv.cmp(&rv) {
            Ordering::Equal => {}
            other => return other,
        }
    }
    Ordering::Equal
}

/// Joins declared version-format names with `;` for diagnostics.
#[must_use]
pub fn formats_to_string(names: &[&str]) -> String {
    names.join(";")
}

fn parse_u32(raw: &str) -> Option<u32> {
    let raw = raw.trim();
    let value = if let Some(hex) = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).ok()?
    } else {
        raw.parse::<u64>().ok()?
    };
    u32::try_from(value).ok()
}

/// Decodes four BCD bytes, rejecting nibbles above 9.
fn bcd_groups(word: u32) -> Option<[u32; 4]> {
    let mut groups = [0u32; 4];
    for (i, group) in groups.iter_mut().enumerate() {
        let byte = (word >> (24 - i * 8)) & 0xff;
        let hi = byte >> 4;
        let lo = byte & 0xf;
        if hi > 9 || lo > 9 {
            return None;
        }
        *group = hi * 10 + lo;
    }
    Some(groups)
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // VersionFormat naming
    // =========================================================================

    #[test]
    fn format_name_roundtrip() {
        for fmt in [
            VersionFormat::Plain,
            VersionFormat::Number,
            VersionFormat::Pair,
            VersionFormat::Triplet,
            VersionFormat::Quad,
            VersionFormat::Bcd,
        ] {
            assert_eq!(VersionFormat::from_name(fmt.as_str()), fmt);
        }
    }

    #[test]
    fn unrecognised_name_is_unknown() {
        assert_eq!(
            VersionFormat::from_name("intel-me"),
            VersionFormat::Unknown
        );
        assert_eq!(VersionFormat::from_name(""), VersionFormat::Unknown);
    }

    #[test]
    fn format_display_matches_name() {
        assert_eq!(VersionFormat::Triplet.to_string(), "triplet");
    }

    // =========================================================================
    // parse_for_format
    // =========================================================================

    #[test]
    fn plain_is_identity() {
        assert_eq!(parse_for_format("1.2.3", VersionFormat::Plain), "1.2.3");
        assert_eq!(
            parse_for_format("FW_REV_A", VersionFormat::Plain),
            "FW_REV_A"
        );
    }

    #[test]
    fn number_decodes_decimal_and_hex() {
        assert_eq!(parse_for_format("42", VersionFormat::Number), "42");
        assert_eq!(parse_for_format("0x2a", VersionFormat::Number), "42");
    }

    #[test]
    fn pair_splits_sixteen_bit_groups() {
        assert_eq!(parse_for_format("0x00010103", VersionFormat::Pair), "1.259");
    }

    #[test]
    fn triplet_splits_8_8_16() {
        assert_eq!(
            parse_for_format("0x01020003", VersionFormat::Triplet),
            "1.2.3"
        );
    }

    #[test]
    fn quad_splits_four_bytes() {
        assert_eq!(
            parse_for_format("0x01020304", VersionFormat::Quad),
            "1.2.3.4"
        );
    }

    #[test]
    fn bcd_decodes_nibble_pairs() {
        assert_eq!(
            parse_for_format("0x10213243", VersionFormat::Bcd),
            "10.21.32.43"
        );
    }

    #[test]
    fn bcd_rejects_hex_nibbles() {
        // 0x1a is not valid BCD; the raw string comes back unchanged.
        assert_eq!(
            parse_for_format("0x1a000000", VersionFormat::Bcd),
            "0x1a000000"
        );
    }

    #[test]
    fn unparseable_raw_comes_back_unchanged() {
        assert_eq!(parse_for_format("1.2.3", VersionFormat::Quad), "1.2.3");
        assert_eq!(
            parse_for_format("not-a-number", VersionFormat::Number),
            "not-a-number"
        );
        // Does not fit 32 bits.
        assert_eq!(
            parse_for_format("0x100000000", VersionFormat::Quad),
            "0x100000000"
        );
    }

    // =========================================================================
    // compare
    // =========================================================================

    #[test]
    fn plain_compares_lexically() {
        assert_eq!(compare("abc", "abd", VersionFormat::Plain), Ordering::Less);
        assert_eq!(compare("1.0", "1.0", VersionFormat::Plain), Ordering::Equal);
        // Lexical quirk: "10" sorts before "9" under plain.
        assert_eq!(compare("10", "9", VersionFormat::Plain), Ordering::Less);
    }

    #[test]
    fn segments_compare_numerically() {
        assert_eq!(
            compare("1.2.3", "1.2.4", VersionFormat::Triplet),
            Ordering::Less
        );
        assert_eq!(
            compare("1.10.0", "1.9.0", VersionFormat::Triplet),
            Ordering::Greater
        );
        assert_eq!(
            compare("2.0.0", "2.0.0", VersionFormat::Triplet),
            Ordering::Equal
        );
    }

    #[test]
    fn missing_trailing_segments_compare_as_zero() {
        assert_eq!(compare("1.2", "1.2.0", VersionFormat::Unknown), Ordering::Equal);
        assert_eq!(compare("1.2", "1.2.1", VersionFormat::Unknown), Ordering::Less);
    }

    #[test]
    fn malformed_segments_compare_as_equal() {
        assert_eq!(compare("1.x.3", "1.y.3", VersionFormat::Unknown), Ordering::Equal);
        // Later well-formed segments still decide the ordering.
        assert_eq!(
            compare("1.x.3", "1.y.4", VersionFormat::Unknown),
            Ordering::Less
        );
    }

    // =========================================================================
    // formats_to_string
    // =========================================================================

    #[test]
    fn joins_names_with_semicolon() {
        assert_eq!(formats_to_string(&["triplet", "quad"]), "triplet;quad");
        assert_eq!(formats_to_string(&["plain"]), "plain");
        assert_eq!(formats_to_string(&[]), "");
    }
}
