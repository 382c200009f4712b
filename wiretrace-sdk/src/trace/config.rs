//! SDK Configuration
//!
//! Configuration represents the global tracing configuration, overrides
//! can be set for the default id generator and the service name.
use crate::trace::{IdGenerator, RandomIdGenerator};
use std::borrow::Cow;
use std::env;

/// Name of the service recorded on every span.
pub(crate) const WIRETRACE_SERVICE_NAME: &str = "WIRETRACE_SERVICE_NAME";
/// Service name used when neither the builder nor the environment sets one.
pub(crate) const WIRETRACE_SERVICE_NAME_DEFAULT: &str = "unknown_service";

/// Tracer configuration
#[derive(Debug)]
#[non_exhaustive]
pub struct Config {
    /// The id generator that the sdk should use
    pub id_generator: Box<dyn IdGenerator>,

    /// The service name stamped on exported spans
    pub service_name: Cow<'static, str>,
}

impl Config {
    /// Replace the id generator.
    pub fn with_id_generator<T: IdGenerator + 'static>(mut self, id_generator: T) -> Self {
        self.id_generator = Box::new(id_generator);
        self
    }

    /// Replace the service name.
    pub fn with_service_name(mut self, service_name: impl Into<Cow<'static, str>>) -> Self {
        self.service_name = service_name.into();
        self
    }
}

impl Default for Config {
    /// Create default global sdk configuration.
    ///
    /// The service name is read from `WIRETRACE_SERVICE_NAME` when set and not
    /// blank.
    fn default() -> Self {
        let service_name = env::var(WIRETRACE_SERVICE_NAME)
            .ok()
            .map(|name| name.trim().to_owned())
            .filter(|name| !name.is_empty())
            .map(Cow::Owned)
            .unwrap_or(Cow::Borrowed(WIRETRACE_SERVICE_NAME_DEFAULT));

        Config {
            id_generator: Box::<RandomIdGenerator>::default(),
            service_name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_name_defaults() {
        temp_env::with_var_unset(WIRETRACE_SERVICE_NAME, || {
            assert_eq!(Config::default().service_name, "unknown_service");
        });
    }

    #[test]
    fn service_name_from_env() {
        temp_env::with_var(WIRETRACE_SERVICE_NAME, Some("bookstore"), || {
            assert_eq!(Config::default().service_name, "bookstore");
        });
        temp_env::with_var(WIRETRACE_SERVICE_NAME, Some("   "), || {
            assert_eq!(Config::default().service_name, "unknown_service");
        });
    }

    #[test]
    fn builder_overrides_env() {
        temp_env::with_var(WIRETRACE_SERVICE_NAME, Some("from-env"), || {
            let config = Config::default().with_service_name("from-code");
            assert_eq!(config.service_name, "from-code");
        });
    }
}
