use std::borrow::Cow;
use std::fmt;

/// Names one RPC method of one service.
///
/// Its [`Display`](fmt::Display) form is the request path,
/// `/{service}/{method}`, which is also the name of the spans recorded for
/// calls to it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Method {
    service: Cow<'static, str>,
    method: Cow<'static, str>,
}

impl Method {
    /// Create a method name from its service and method parts.
    pub fn new(service: impl Into<Cow<'static, str>>, method: impl Into<Cow<'static, str>>) -> Self {
        Method {
            service: service.into(),
            method: method.into(),
        }
    }

    /// Parses a `/{service}/{method}` request path.
    ///
    /// Returns `None` unless both parts are present and non-empty.
    ///
    /// ```
    /// use wiretrace_rpc::Method;
    ///
    /// assert_eq!(Method::from_path("/BookStore/First"), Some(Method::new("BookStore", "First")));
    /// assert_eq!(Method::from_path("BookStore/First"), None);
    /// assert_eq!(Method::from_path("/BookStore/"), None);
    /// ```
    pub fn from_path(path: &str) -> Option<Self> {
        let (service, method) = path.strip_prefix('/')?.split_once('/')?;
        if service.is_empty() || method.is_empty() || method.contains('/') {
            return None;
        }
        Some(Method::new(service.to_owned(), method.to_owned()))
    }

    /// The service part.
    pub fn service(&self) -> &str {
        &self.service
    }

    /// The method part.
    pub fn method(&self) -> &str {
        &self.method
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}", self.service, self.method)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_request_path() {
        assert_eq!(Method::new("Greeter", "Greet").to_string(), "/Greeter/Greet");
    }

    #[test]
    fn path_round_trips() {
        let method = Method::new("BookStore", "First");
        assert_eq!(Method::from_path(&method.to_string()), Some(method));
    }

    #[test]
    fn rejects_nested_paths() {
        assert_eq!(Method::from_path("/a/b/c"), None);
        assert_eq!(Method::from_path("//b"), None);
        assert_eq!(Method::from_path(""), None);
    }
}
