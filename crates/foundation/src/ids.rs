use std::fmt;

/// Identifier of a zone polygon. Always strictly positive.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ZoneId(u32);

impl ZoneId {
    pub fn new(n: u32) -> Option<Self> {
        (n > 0).then_some(ZoneId(n))
    }

    pub fn get(self) -> u32 {
        self.0
    }

    pub fn try_from_i64(n: i64) -> Option<Self> {
        u32::try_from(n).ok().and_then(Self::new)
    }

    /// Lenient parse of textual ids, e.g. prediction response keys.
    pub fn parse_lenient(s: &str) -> Option<Self> {
        parse_leading_int(s).and_then(Self::try_from_i64)
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parses the integer prefix of `s`.
///
/// Leading whitespace is skipped, one optional sign is accepted, and parsing
/// stops at the first non-digit: `"12abc"` is 12, `"7.9"` is 7. Returns `None`
/// when no digit follows or the value does not fit in `i64`.
pub fn parse_leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = digits
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    let magnitude: i64 = digits[..end].parse().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}
