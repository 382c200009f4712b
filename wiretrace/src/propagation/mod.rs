//! # Carriers and propagators
//!
//! A trace context crosses a process boundary inside the metadata of the call
//! that caused the remote work. `Propagator`s read and write that metadata
//! through two small carrier interfaces:
//!
//! - [`Injector`], the write side used on outbound calls
//! - [`Extractor`], the read side used on inbound calls
//!
//! Any key/value text container can act as a carrier; `HashMap<String, String>`
//! is supported directly, with keys folded to lowercase so lookups are
//! case-insensitive. Transport specific adapters (for example gRPC metadata)
//! live next to the transport integration.
//!
//! A [`TextMapPropagator`] is the codec between a [`Context`] and a carrier.
//!
//! [`Context`]: crate::Context
use std::collections::HashMap;

pub mod text_map_propagator;

pub use text_map_propagator::{FieldIter, TextMapPropagator};

/// Injector provides an interface for adding fields from an underlying struct like `HashMap`
pub trait Injector {
    /// Add a key and value to the underlying data. Setting an existing key
    /// overwrites its value.
    fn set(&mut self, key: &str, value: String);
}

/// Extractor provides an interface for removing fields from an underlying struct like `HashMap`
pub trait Extractor {
    /// Get a value from a key from the underlying data.
    fn get(&self, key: &str) -> Option<&str>;

    /// Collect all the keys from the underlying data.
    fn keys(&self) -> Vec<&str>;
}

impl<S: std::hash::BuildHasher> Injector for HashMap<String, String, S> {
    /// Set a key and value in the HashMap.
    fn set(&mut self, key: &str, value: String) {
        self.insert(key.to_lowercase(), value);
    }
}

impl<S: std::hash::BuildHasher> Extractor for HashMap<String, String, S> {
    /// Get a value for a key from the HashMap.
    fn get(&self, key: &str) -> Option<&str> {
        self.get(&key.to_lowercase()).map(|v| v.as_str())
    }

    /// Collect all the keys from the HashMap.
    fn keys(&self) -> Vec<&str> {
        self.keys().map(|k| k.as_str()).collect::<Vec<_>>()
    }
}
