//! Id Generator
use rand::{rngs, Rng, SeedableRng};
use std::cell::RefCell;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use wiretrace::trace::{SpanId, TraceId};

/// Interface for generating IDs
pub trait IdGenerator: Send + Sync + fmt::Debug {
    /// Generate a new `TraceId`. Never returns [`TraceId::INVALID`].
    fn new_trace_id(&self) -> TraceId;

    /// Generate a new `SpanId`. Never returns [`SpanId::INVALID`].
    fn new_span_id(&self) -> SpanId;
}

/// Default [`IdGenerator`] implementation.
///
/// Generates trace and span ids using a random number generator held per
/// thread, so concurrent span starts never contend on a lock.
#[derive(Clone, Debug, Default)]
pub struct RandomIdGenerator {
    _private: (),
}

impl IdGenerator for RandomIdGenerator {
    fn new_trace_id(&self) -> TraceId {
        CURRENT_RNG.with(|rng| loop {
            let id = rng.borrow_mut().random::<u128>();
            if id != 0 {
                return TraceId::from(id);
            }
        })
    }

    fn new_span_id(&self) -> SpanId {
        CURRENT_RNG.with(|rng| loop {
            let id = rng.borrow_mut().random::<u64>();
            if id != 0 {
                return SpanId::from(id);
            }
        })
    }
}

thread_local! {
    /// Store random number generator for each thread
    static CURRENT_RNG: RefCell<rngs::SmallRng> = RefCell::new(rngs::SmallRng::from_os_rng());
}

/// Generates sequential ids starting at 1.
///
/// Useful for tests that need predictable span ids.
#[derive(Debug, Default)]
pub struct IncrementIdGenerator {
    trace: AtomicU64,
    span: AtomicU64,
}

impl IncrementIdGenerator {
    /// Create a generator whose first ids are 1.
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for IncrementIdGenerator {
    fn new_trace_id(&self) -> TraceId {
        TraceId::from(u128::from(self.trace.fetch_add(1, Ordering::Relaxed) + 1))
    }

    fn new_span_id(&self) -> SpanId {
        SpanId::from(self.span.fetch_add(1, Ordering::Relaxed) + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn random_ids_are_valid_and_distinct() {
        let generator = RandomIdGenerator::default();
        let mut seen = HashSet::new();
        for _ in 0..1_000 {
            let span_id = generator.new_span_id();
            assert_ne!(span_id, SpanId::INVALID);
            assert!(seen.insert(span_id));
            assert_ne!(generator.new_trace_id(), TraceId::INVALID);
        }
    }

    #[test]
    fn increment_ids_start_at_one() {
        let generator = IncrementIdGenerator::new();
        assert_eq!(generator.new_trace_id(), TraceId::from(1));
        assert_eq!(generator.new_span_id(), SpanId::from(1));
        assert_eq!(generator.new_span_id(), SpanId::from(2));
    }
}
