//! # Text Propagator
//!
//! [`TextMapPropagator`] is a formatter to serialize and deserialize a value
//! into a text key/value carrier.
use crate::{
    propagation::{Extractor, Injector},
    Context,
};
use std::fmt::Debug;
use std::slice;

/// Methods to inject and extract a value as text into carriers that travel
/// in-band across process boundaries.
///
/// Propagation must never break the call it rides on: extraction of missing
/// or malformed data yields the caller's fallback context, never an error.
pub trait TextMapPropagator: Debug {
    /// Properly encodes the values of the current [`Context`] and injects them into
    /// the [`Injector`].
    fn inject(&self, injector: &mut dyn Injector) {
        Context::map_current(|cx| self.inject_context(cx, injector))
    }

    /// Properly encodes the values of the [`Context`] and injects them into the
    /// [`Injector`]. Does nothing when the context has no active span.
    fn inject_context(&self, cx: &Context, injector: &mut dyn Injector);

    /// Retrieves encoded data using the provided [`Extractor`]. If no data for this
    /// format was retrieved OR if the retrieved data is invalid, then the current
    /// [`Context`] is returned.
    fn extract(&self, extractor: &dyn Extractor) -> Context {
        Context::map_current(|cx| self.extract_with_context(cx, extractor))
    }

    /// Retrieves encoded data using the provided [`Extractor`]. If no data for this
    /// format was retrieved OR if the retrieved data is invalid, then the given
    /// [`Context`] is returned.
    fn extract_with_context(&self, cx: &Context, extractor: &dyn Extractor) -> Context;

    /// Returns iter of fields used by [`TextMapPropagator`]
    fn fields(&self) -> FieldIter<'_>;
}

/// An iterator over fields of a [`TextMapPropagator`]
#[derive(Debug)]
pub struct FieldIter<'a>(slice::Iter<'a, &'static str>);

impl<'a> FieldIter<'a> {
    /// Create a new `FieldIter` from a slice of propagator fields
    pub fn new(fields: &'a [&'static str]) -> Self {
        FieldIter(fields.iter())
    }
}

impl Iterator for FieldIter<'_> {
    type Item = &'static str;
    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().copied()
    }
}
