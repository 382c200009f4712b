//! Carriers over gRPC request metadata.
use tonic::metadata::{KeyRef, MetadataKey, MetadataMap, MetadataValue};
use wiretrace::propagation::{Extractor, Injector};

/// Writes propagation entries into outbound [`MetadataMap`]s.
///
/// gRPC metadata keys are lowercase ascii; entries whose key or value is not
/// valid metadata are skipped.
#[derive(Debug)]
pub struct MetadataInjector<'a>(pub &'a mut MetadataMap);

impl Injector for MetadataInjector<'_> {
    /// Set a key and value in the MetadataMap. Does nothing if the key or
    /// value are not valid inputs.
    fn set(&mut self, key: &str, value: String) {
        if let Ok(key) = MetadataKey::from_bytes(key.to_ascii_lowercase().as_bytes()) {
            if let Ok(val) = MetadataValue::try_from(&value) {
                self.0.insert(key, val);
            }
        }
    }
}

/// Reads propagation entries from inbound [`MetadataMap`]s.
#[derive(Debug)]
pub struct MetadataExtractor<'a>(pub &'a MetadataMap);

impl Extractor for MetadataExtractor<'_> {
    /// Get a value for a key from the MetadataMap. Lookup is case-insensitive
    /// and only ascii values are returned.
    fn get(&self, key: &str) -> Option<&str> {
        self.0
            .get(key.to_ascii_lowercase().as_str())
            .and_then(|metadata| metadata.to_str().ok())
    }

    /// Collect all the keys from the MetadataMap.
    fn keys(&self) -> Vec<&str> {
        self.0
            .keys()
            .map(|key| match key {
                KeyRef::Ascii(v) => v.as_str(),
                KeyRef::Binary(v) => v.as_str(),
            })
            .collect::<Vec<_>>()
    }
}
