//! # Trace Context Propagator
//!
//! Encodes the active span context into a single `traceparent` entry.

use std::str::FromStr;
use wiretrace::{
    propagation::{text_map_propagator::FieldIter, Extractor, Injector, TextMapPropagator},
    trace::{SpanContext, SpanId, TraceFlags, TraceId},
    wt_debug, Context,
};

const SUPPORTED_VERSION: &str = "00";
const TRACEPARENT_HEADER: &str = "traceparent";
const TRACE_CONTEXT_HEADER_FIELDS: [&str; 1] = [TRACEPARENT_HEADER];

/// Propagates `SpanContext`s under a single `traceparent` entry.
///
/// The value has four hyphen separated fields:
///
///    - version, always `00`
///    - trace-id, 32 lowercase hex characters
///    - parent-id, 16 lowercase hex characters
///    - trace-flags, 2 lowercase hex characters
///
/// `traceparent: 00-0af7651916cd43dd8448eb211c80319c-b7ad6b7169203331-01`
///
/// Anything that does not match this exact shape is treated as if the entry
/// were missing: extraction falls back to the supplied context and the call
/// carries on. That includes versions other than `00`, which a newer peer may
/// send and which this propagator does not try to interpret.
#[derive(Clone, Debug, Default)]
pub struct TraceContextPropagator {
    _private: (),
}

impl TraceContextPropagator {
    /// Create a new `TraceContextPropagator`.
    pub fn new() -> Self {
        TraceContextPropagator { _private: () }
    }

    /// Extract span context from the `traceparent` entry.
    ///
    /// `Ok(None)` means the entry is absent or empty.
    fn extract_span_context(
        &self,
        extractor: &dyn Extractor,
    ) -> Result<Option<SpanContext>, &'static str> {
        let header_value = match extractor.get(TRACEPARENT_HEADER) {
            Some(value) if !value.is_empty() => value,
            _ => return Ok(None),
        };

        let parts = header_value.split('-').collect::<Vec<&str>>();
        if parts.len() != 4 {
            return Err("wrong field count");
        }
        if parts[0] != SUPPORTED_VERSION {
            return Err("unsupported version");
        }

        let trace_id = TraceId::from_str(parts[1]).map_err(|_| "invalid trace id")?;
        let span_id = SpanId::from_str(parts[2]).map_err(|_| "invalid span id")?;

        let is_lower_hex = |b: u8| b.is_ascii_digit() || (b'a'..=b'f').contains(&b);
        if parts[3].len() != 2 || !parts[3].bytes().all(is_lower_hex) {
            return Err("invalid trace flags");
        }
        // Bits other than sampled are carried through untouched.
        let trace_flags = u8::from_str_radix(parts[3], 16)
            .map(TraceFlags::new)
            .map_err(|_| "invalid trace flags")?;

        let span_context = SpanContext::new(trace_id, span_id, trace_flags, true);
        if !span_context.is_valid() {
            return Err("all-zero id");
        }

        Ok(Some(span_context))
    }
}

impl TextMapPropagator for TraceContextPropagator {
    /// Writes the span context of `cx` into `injector`. Contexts without a
    /// valid span context leave the carrier untouched.
    fn inject_context(&self, cx: &Context, injector: &mut dyn Injector) {
        let Some(span_context) = cx.span_context().filter(|sc| sc.is_valid()) else {
            return;
        };
        let header_value = format!(
            "{}-{}-{}-{:02x}",
            SUPPORTED_VERSION,
            span_context.trace_id(),
            span_context.span_id(),
            span_context.trace_flags()
        );
        injector.set(TRACEPARENT_HEADER, header_value);
    }

    /// Returns `cx` extended with the remote span context from `extractor`, or
    /// a clone of `cx` when the entry is missing or malformed.
    fn extract_with_context(&self, cx: &Context, extractor: &dyn Extractor) -> Context {
        match self.extract_span_context(extractor) {
            Ok(Some(sc)) => cx.with_span_context(sc),
            Ok(None) => cx.clone(),
            Err(reason) => {
                wt_debug!(
                    name: "TraceContextPropagator.Extract.Malformed",
                    reason = reason
                );
                cx.clone()
            }
        }
    }

    fn fields(&self) -> FieldIter<'_> {
        FieldIter::new(&TRACE_CONTEXT_HEADER_FIELDS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashMap;

    #[rustfmt::skip]
    fn extract_data() -> Vec<(&'static str, SpanContext)> {
        vec![
            ("00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-00", SpanContext::new(TraceId::from(0x4bf9_2f35_77b3_4da6_a3ce_929d_0e0e_4736), SpanId::from(0x00f0_67aa_0ba9_02b7), TraceFlags::default(), true)),
            ("00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01", SpanContext::new(TraceId::from(0x4bf9_2f35_77b3_4da6_a3ce_929d_0e0e_4736), SpanId::from(0x00f0_67aa_0ba9_02b7), TraceFlags::SAMPLED, true)),
            ("00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-02", SpanContext::new(TraceId::from(0x4bf9_2f35_77b3_4da6_a3ce_929d_0e0e_4736), SpanId::from(0x00f0_67aa_0ba9_02b7), TraceFlags::new(0x02), true)),
            ("00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-03", SpanContext::new(TraceId::from(0x4bf9_2f35_77b3_4da6_a3ce_929d_0e0e_4736), SpanId::from(0x00f0_67aa_0ba9_02b7), TraceFlags::new(0x03), true)),
            ("00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-09", SpanContext::new(TraceId::from(0x4bf9_2f35_77b3_4da6_a3ce_929d_0e0e_4736), SpanId::from(0x00f0_67aa_0ba9_02b7), TraceFlags::new(0x09), true)),
        ]
    }

    #[rustfmt::skip]
    fn extract_data_invalid() -> Vec<(&'static str, &'static str)> {
        vec![
            ("0000-00000000000000000000000000000000-0000000000000000-01", "wrong version length"),
            ("01-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01",   "unsupported version"),
            ("ff-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01",   "reserved version"),
            ("00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01-x", "extra field"),
            ("00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7",      "missing flags"),
            ("00-ab00000000000000000000000000000000-cd00000000000000-01", "wrong trace ID length"),
            ("00-ab000000000000000000000000000000-cd0000000000000000-01", "wrong span ID length"),
            ("00-ab000000000000000000000000000000-cd00000000000000-0100", "wrong trace flag length"),
            ("00-AB000000000000000000000000000000-cd00000000000000-01",   "upper case trace ID"),
            ("00-ab000000000000000000000000000000-CD00000000000000-01",   "upper case span ID"),
            ("00-ab000000000000000000000000000000-cd00000000000000-A1",   "upper case trace flag"),
            ("00-qw000000000000000000000000000000-cd00000000000000-01",   "bogus trace ID"),
            ("00-ab000000000000000000000000000000-qw00000000000000-01",   "bogus span ID"),
            ("00-ab000000000000000000000000000000-cd00000000000000-qw",   "bogus trace flag"),
            ("00-00000000000000000000000000000000-cd00000000000000-01",   "zero trace ID"),
            ("00-ab000000000000000000000000000000-0000000000000000-01",   "zero span ID"),
            ("00-+b000000000000000000000000000000-cd00000000000000-01",   "signed trace ID"),
            ("00-ab000000000000000000000000000000-cd00000000000000-+1",   "signed trace flags"),
            (" 00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01",  "leading whitespace"),
            ("garbage",                                                   "not an encoding at all"),
        ]
    }

    #[rustfmt::skip]
    fn inject_data() -> Vec<(&'static str, SpanContext)> {
        vec![
            ("00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01", SpanContext::new(TraceId::from(0x4bf9_2f35_77b3_4da6_a3ce_929d_0e0e_4736), SpanId::from(0x00f0_67aa_0ba9_02b7), TraceFlags::SAMPLED, true)),
            ("00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-00", SpanContext::new(TraceId::from(0x4bf9_2f35_77b3_4da6_a3ce_929d_0e0e_4736), SpanId::from(0x00f0_67aa_0ba9_02b7), TraceFlags::default(), true)),
            ("00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-ff", SpanContext::new(TraceId::from(0x4bf9_2f35_77b3_4da6_a3ce_929d_0e0e_4736), SpanId::from(0x00f0_67aa_0ba9_02b7), TraceFlags::new(0xff), true)),
            ("",                                                        SpanContext::empty_context()),
        ]
    }

    #[test]
    fn extract_traceparent() {
        let propagator = TraceContextPropagator::new();

        for (traceparent, expected_context) in extract_data() {
            let mut extractor = HashMap::new();
            extractor.insert(TRACEPARENT_HEADER.to_string(), traceparent.to_string());

            let cx = propagator.extract(&extractor);
            let sc = cx.span_context().expect("span context extracted");
            assert_eq!(sc, &expected_context);
            assert!(sc.is_remote());
        }
    }

    #[test]
    fn extract_rejects_invalid() {
        let propagator = TraceContextPropagator::new();
        let fallback = Context::new().with_span_context(SpanContext::new(
            TraceId::from(7),
            SpanId::from(9),
            TraceFlags::SAMPLED,
            false,
        ));

        for (invalid_header, reason) in extract_data_invalid() {
            let mut extractor = HashMap::new();
            extractor.insert(TRACEPARENT_HEADER.to_string(), invalid_header.to_string());

            assert_eq!(
                propagator.extract(&extractor).span_context(),
                None,
                "{}",
                reason
            );
            assert_eq!(
                propagator.extract_with_context(&fallback, &extractor),
                fallback,
                "{}",
                reason
            );
        }
    }

    #[test]
    fn extract_absent_or_empty_returns_default() {
        let propagator = TraceContextPropagator::new();
        let fallback = Context::new().with_span_context(SpanContext::new(
            TraceId::from(1),
            SpanId::from(2),
            TraceFlags::SAMPLED,
            false,
        ));

        let empty: HashMap<String, String> = HashMap::new();
        assert_eq!(propagator.extract_with_context(&fallback, &empty), fallback);

        let mut blank = HashMap::new();
        blank.insert(TRACEPARENT_HEADER.to_string(), String::new());
        assert_eq!(propagator.extract_with_context(&fallback, &blank), fallback);
    }

    #[test]
    fn inject_traceparent() {
        let propagator = TraceContextPropagator::new();

        for (expected_traceparent, context) in inject_data() {
            let mut injector: HashMap<String, String> = HashMap::new();
            propagator.inject_context(&Context::new().with_span_context(context), &mut injector);

            assert_eq!(
                Extractor::get(&injector, TRACEPARENT_HEADER).unwrap_or(""),
                expected_traceparent
            );
        }
    }

    #[test]
    fn inject_without_span_leaves_carrier_unchanged() {
        let propagator = TraceContextPropagator::new();
        let mut injector = HashMap::new();
        injector.insert("existing".to_string(), "value".to_string());

        propagator.inject_context(&Context::new(), &mut injector);

        assert_eq!(injector.len(), 1);
        assert_eq!(Extractor::get(&injector, TRACEPARENT_HEADER), None);
    }

    #[test]
    fn inject_uses_current_context() {
        let propagator = TraceContextPropagator::new();
        let sc = SpanContext::new(
            TraceId::from(0xabc),
            SpanId::from(0xdef),
            TraceFlags::SAMPLED,
            false,
        );
        let _guard = Context::new().with_span_context(sc).attach();

        let mut injector: HashMap<String, String> = HashMap::new();
        propagator.inject(&mut injector);

        assert_eq!(
            Extractor::get(&injector, TRACEPARENT_HEADER),
            Some("00-00000000000000000000000000000abc-0000000000000def-01")
        );
    }

    #[rstest]
    fn round_trip_preserves_wire_fields(
        #[values(0x00, 0x01, 0x02, 0x03, 0xff)] flags: u8,
        #[values(
            (0x0af7_6519_16cd_43dd_8448_eb21_1c80_319c, 0xb7ad_6b71_6920_3331),
            (1, 1),
            (u128::MAX, u64::MAX)
        )]
        ids: (u128, u64),
        #[values(false, true)] is_remote: bool,
    ) {
        let propagator = TraceContextPropagator::new();
        let sc = SpanContext::new(
            TraceId::from(ids.0),
            SpanId::from(ids.1),
            TraceFlags::new(flags),
            is_remote,
        );

        let mut carrier: HashMap<String, String> = HashMap::new();
        propagator.inject_context(&Context::new().with_span_context(sc), &mut carrier);
        let cx = propagator.extract(&carrier);

        let extracted = cx.span_context().expect("span context extracted");
        assert_eq!(extracted, &sc);
        assert_eq!(extracted.trace_flags(), TraceFlags::new(flags));
        assert!(extracted.is_remote());
    }

    #[test]
    fn fields_lists_traceparent_only() {
        let propagator = TraceContextPropagator::new();
        assert_eq!(propagator.fields().collect::<Vec<_>>(), vec!["traceparent"]);
    }
}
