use crate::trace::TraceError;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::num::ParseIntError;
use std::ops::{BitAnd, BitOr, Not};
use std::str::FromStr;

/// Flags that can be set on a `SpanContext`.
///
/// The current version of the wire format only supports a single flag
/// [`TraceFlags::SAMPLED`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Copy, Hash)]
pub struct TraceFlags(u8);

impl TraceFlags {
    /// Trace flags with the `sampled` flag set to `0`.
    pub const NOT_SAMPLED: TraceFlags = TraceFlags(0x00);

    /// Trace flags with the `sampled` flag set to `1`.
    pub const SAMPLED: TraceFlags = TraceFlags(0x01);

    /// Construct new trace flags
    pub const fn new(flags: u8) -> Self {
        TraceFlags(flags)
    }

    /// Returns `true` if the `sampled` flag is set
    pub fn is_sampled(&self) -> bool {
        (*self & TraceFlags::SAMPLED) == TraceFlags::SAMPLED
    }

    /// Returns copy of the current flags with the `sampled` flag set.
    pub fn with_sampled(&self, sampled: bool) -> Self {
        if sampled {
            *self | TraceFlags::SAMPLED
        } else {
            *self & !TraceFlags::SAMPLED
        }
    }

    /// Returns the flags as a `u8`
    pub fn to_u8(self) -> u8 {
        self.0
    }
}

impl BitAnd for TraceFlags {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        Self(self.0 & rhs.0)
    }
}

impl BitOr for TraceFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl Not for TraceFlags {
    type Output = Self;

    fn not(self) -> Self::Output {
        Self(!self.0)
    }
}

impl fmt::LowerHex for TraceFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

/// Checks that `hex` is exactly `len` lowercase hex digits.
///
/// `from_str_radix` alone also accepts a leading `+` and upper case digits,
/// neither of which may appear on the wire.
fn is_lower_hex(hex: &str, len: usize) -> bool {
    hex.len() == len && hex.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// A 16-byte value which identifies a given trace.
///
/// The id is valid if it contains at least one non-zero byte.
#[derive(Clone, PartialEq, Eq, Copy, Hash)]
pub struct TraceId(u128);

impl TraceId {
    /// Invalid trace id
    pub const INVALID: TraceId = TraceId(0);

    /// Number of hex characters in the wire representation.
    pub const HEX_LEN: usize = 32;

    /// Create a trace id from its representation as a byte array.
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        TraceId(u128::from_be_bytes(bytes))
    }

    /// Return the representation of this trace id as a byte array.
    pub const fn to_bytes(self) -> [u8; 16] {
        self.0.to_be_bytes()
    }

    /// Converts a string in base 16 to a trace id.
    ///
    /// This is lenient about length and case; use [`str::parse`] to accept
    /// only the exact 32 character lowercase form.
    ///
    /// # Examples
    ///
    /// ```
    /// use wiretrace::trace::TraceId;
    ///
    /// assert!(TraceId::from_hex("42").is_ok());
    /// assert!(TraceId::from_hex("58406520a006649127e371903a2de979").is_ok());
    ///
    /// assert!(TraceId::from_hex("not_hex").is_err());
    /// ```
    pub fn from_hex(hex: &str) -> Result<Self, ParseIntError> {
        u128::from_str_radix(hex, 16).map(TraceId)
    }
}

impl FromStr for TraceId {
    type Err = TraceError;

    /// Parses the exact wire form: 32 lowercase hex characters.
    ///
    /// ```
    /// use wiretrace::trace::TraceId;
    ///
    /// assert!("4bf92f3577b34da6a3ce929d0e0e4736".parse::<TraceId>().is_ok());
    /// assert!("4BF92F3577B34DA6A3CE929D0E0E4736".parse::<TraceId>().is_err());
    /// assert!("42".parse::<TraceId>().is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !is_lower_hex(s, Self::HEX_LEN) {
            return Err(TraceError::InvalidId {
                kind: "trace id",
                value: s.to_string(),
                expected_len: Self::HEX_LEN,
            });
        }
        TraceId::from_hex(s).map_err(|err| TraceError::Other(Box::new(err)))
    }
}

impl From<u128> for TraceId {
    fn from(value: u128) -> Self {
        TraceId(value)
    }
}

impl fmt::Debug for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!("{:032x}", self.0))
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!("{:032x}", self.0))
    }
}

impl fmt::LowerHex for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

/// An 8-byte value which identifies a given span.
///
/// The id is valid if it contains at least one non-zero byte.
#[derive(Clone, PartialEq, Eq, Copy, Hash)]
pub struct SpanId(u64);

impl SpanId {
    /// Invalid span id
    pub const INVALID: SpanId = SpanId(0);

    /// Number of hex characters in the wire representation.
    pub const HEX_LEN: usize = 16;

    /// Create a span id from its representation as a byte array.
    pub const fn from_bytes(bytes: [u8; 8]) -> Self {
        SpanId(u64::from_be_bytes(bytes))
    }

    /// Return the representation of this span id as a byte array.
    pub const fn to_bytes(self) -> [u8; 8] {
        self.0.to_be_bytes()
    }

    /// Converts a string in base 16 to a span id.
    ///
    /// # Examples
    ///
    /// ```
    /// use wiretrace::trace::SpanId;
    ///
    /// assert!(SpanId::from_hex("42").is_ok());
    /// assert!(SpanId::from_hex("58406520a0066491").is_ok());
    ///
    /// assert!(SpanId::from_hex("not_hex").is_err());
    /// ```
    pub fn from_hex(hex: &str) -> Result<Self, ParseIntError> {
        u64::from_str_radix(hex, 16).map(SpanId)
    }
}

impl FromStr for SpanId {
    type Err = TraceError;

    /// Parses the exact wire form: 16 lowercase hex characters.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !is_lower_hex(s, Self::HEX_LEN) {
            return Err(TraceError::InvalidId {
                kind: "span id",
                value: s.to_string(),
                expected_len: Self::HEX_LEN,
            });
        }
        SpanId::from_hex(s).map_err(|err| TraceError::Other(Box::new(err)))
    }
}

impl From<u64> for SpanId {
    fn from(value: u64) -> Self {
        SpanId(value)
    }
}

impl fmt::Debug for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!("{:016x}", self.0))
    }
}

impl fmt::Display for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!("{:016x}", self.0))
    }
}

impl fmt::LowerHex for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

/// Immutable identity of a span which can be serialized and propagated.
///
/// Two span contexts are equal when their trace id, span id and trace flags
/// are equal. Whether a context was received from a remote process is
/// informational and does not take part in equality, so a context that made
/// a round trip through a carrier compares equal to the one injected.
#[derive(Clone, Copy, Debug)]
pub struct SpanContext {
    trace_id: TraceId,
    span_id: SpanId,
    trace_flags: TraceFlags,
    is_remote: bool,
}

impl SpanContext {
    /// An invalid span context
    pub const NONE: SpanContext = SpanContext {
        trace_id: TraceId::INVALID,
        span_id: SpanId::INVALID,
        trace_flags: TraceFlags::NOT_SAMPLED,
        is_remote: false,
    };

    /// Create an invalid empty span context
    pub fn empty_context() -> Self {
        SpanContext::NONE
    }

    /// Construct a new `SpanContext`
    pub fn new(
        trace_id: TraceId,
        span_id: SpanId,
        trace_flags: TraceFlags,
        is_remote: bool,
    ) -> Self {
        SpanContext {
            trace_id,
            span_id,
            trace_flags,
            is_remote,
        }
    }

    /// The [`TraceId`] for this span context.
    pub fn trace_id(&self) -> TraceId {
        self.trace_id
    }

    /// The [`SpanId`] for this span context.
    pub fn span_id(&self) -> SpanId {
        self.span_id
    }

    /// Returns details about the trace.
    pub fn trace_flags(&self) -> TraceFlags {
        self.trace_flags
    }

    /// Returns `true` if the span context has a valid (non-zero) `trace_id` and a
    /// valid (non-zero) `span_id`.
    pub fn is_valid(&self) -> bool {
        self.trace_id != TraceId::INVALID && self.span_id != SpanId::INVALID
    }

    /// Returns `true` if the span context was propagated from a remote parent.
    pub fn is_remote(&self) -> bool {
        self.is_remote
    }

    /// Returns `true` if the `sampled` trace flag is set.
    pub fn is_sampled(&self) -> bool {
        self.trace_flags.is_sampled()
    }
}

impl PartialEq for SpanContext {
    fn eq(&self, other: &Self) -> bool {
        self.trace_id == other.trace_id
            && self.span_id == other.span_id
            && self.trace_flags == other.trace_flags
    }
}

impl Eq for SpanContext {}

impl Hash for SpanContext {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.trace_id.hash(state);
        self.span_id.hash(state);
        self.trace_flags.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::zero(TraceId(0), "00000000000000000000000000000000", [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0])]
    #[case::small(TraceId(42), "0000000000000000000000000000002a", [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 42])]
    #[case::large(
        TraceId(126642714606581564793456114182061442190),
        "5f467fe7bf42676c05e20ba4a90e448e",
        [95, 70, 127, 231, 191, 66, 103, 108, 5, 226, 11, 164, 169, 14, 68, 142]
    )]
    fn trace_id_hex_and_bytes(#[case] id: TraceId, #[case] hex: &str, #[case] bytes: [u8; 16]) {
        assert_eq!(format!("{}", id), hex);
        assert_eq!(id.to_bytes(), bytes);

        assert_eq!(id, hex.parse::<TraceId>().unwrap());
        assert_eq!(id, TraceId::from_bytes(bytes));
    }

    #[rstest]
    #[case::zero(SpanId(0), "0000000000000000", [0, 0, 0, 0, 0, 0, 0, 0])]
    #[case::small(SpanId(42), "000000000000002a", [0, 0, 0, 0, 0, 0, 0, 42])]
    #[case::large(SpanId(5508496025762705295), "4c721bf33e3caf8f", [76, 114, 27, 243, 62, 60, 175, 143])]
    fn span_id_hex_and_bytes(#[case] id: SpanId, #[case] hex: &str, #[case] bytes: [u8; 8]) {
        assert_eq!(format!("{}", id), hex);
        assert_eq!(id.to_bytes(), bytes);

        assert_eq!(id, hex.parse::<SpanId>().unwrap());
        assert_eq!(id, SpanId::from_bytes(bytes));
    }

    #[rstest]
    #[case::signed_trace_id("+f467fe7bf42676c05e20ba4a90e448e")]
    #[case::short_trace_id("5f467fe7bf42676c05e20ba4a90e448")]
    #[case::upper_case_trace_id("5F467FE7BF42676C05E20BA4A90E448E")]
    fn trace_id_parse_rejects(#[case] hex: &str) {
        assert!(hex.parse::<TraceId>().is_err());
    }

    #[test]
    fn strict_parse_rejects_signs_and_wrong_lengths() {
        assert!("+f467fe7bf42676c05e20ba4a90e448e".parse::<TraceId>().is_err());
        assert!("5f467fe7bf42676c05e20ba4a90e448".parse::<TraceId>().is_err());
        assert!("+c721bf33e3caf8f".parse::<SpanId>().is_err());
        assert!("4c721bf33e3caf8f0".parse::<SpanId>().is_err());
        assert!("4C721BF33E3CAF8F".parse::<SpanId>().is_err());
    }

    #[test]
    fn equality_ignores_remote_marker() {
        let local = SpanContext::new(TraceId(1), SpanId(2), TraceFlags::SAMPLED, false);
        let remote = SpanContext::new(TraceId(1), SpanId(2), TraceFlags::SAMPLED, true);
        assert_eq!(local, remote);
        assert_ne!(
            local,
            SpanContext::new(TraceId(1), SpanId(2), TraceFlags::NOT_SAMPLED, false)
        );
    }

    #[test]
    fn validity_requires_both_ids() {
        assert!(!SpanContext::NONE.is_valid());
        assert!(!SpanContext::new(TraceId(1), SpanId::INVALID, TraceFlags::SAMPLED, false).is_valid());
        assert!(SpanContext::new(TraceId(1), SpanId(1), TraceFlags::SAMPLED, false).is_valid());
    }
}
