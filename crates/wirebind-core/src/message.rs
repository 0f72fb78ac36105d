//! Request and response values.
//!
//! Both types are immutable in spirit: every `with_*` method returns a new
//! value and leaves the receiver untouched, so no pipeline stage can leak
//! hidden response state into another.

use crate::Value;
use bytes::Bytes;
use http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use http::{HeaderMap, Method, StatusCode, Uri, Version};
use std::collections::HashMap;

/// An inbound request as seen by middleware and handlers.
///
/// # Example
///
/// ```
/// use wirebind_core::{Request, Value};
/// use http::{Method, Uri};
///
/// let request = Request::new(Method::GET, Uri::from_static("/users/42?full=1"));
/// let tagged = request.with_attribute("user", Value::from("alice"));
///
/// assert_eq!(tagged.path(), "/users/42");
/// assert!(request.attribute("user").is_none());
/// assert_eq!(tagged.attribute("user").and_then(Value::as_str), Some("alice"));
/// ```
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    uri: Uri,
    version: Version,
    headers: HeaderMap,
    body: Bytes,
    attributes: HashMap<String, Value>,
}

impl Request {
    /// Creates a request with no headers, body or attributes.
    #[must_use]
    pub fn new(method: Method, uri: Uri) -> Self {
        Self {
            method,
            uri,
            version: Version::HTTP_11,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            attributes: HashMap::new(),
        }
    }

    /// Returns the HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request URI.
    #[must_use]
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Returns the URI path without the query string.
    #[must_use]
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Returns the HTTP version.
    #[must_use]
    pub fn version(&self) -> Version {
        self.version
    }

    /// Returns the request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the request body.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the attribute stored under `name`, if any.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Returns the names of all attributes, sorted.
    #[must_use]
    pub fn attribute_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.attributes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Returns a copy with the attribute set.
    #[must_use]
    pub fn with_attribute(&self, name: impl Into<String>, value: Value) -> Self {
        let mut request = self.clone();
        request.attributes.insert(name.into(), value);
        request
    }

    /// Returns a copy without the attribute.
    #[must_use]
    pub fn without_attribute(&self, name: &str) -> Self {
        let mut request = self.clone();
        request.attributes.remove(name);
        request
    }

    /// Returns a copy with the header appended.
    #[must_use]
    pub fn with_header(&self, name: HeaderName, value: HeaderValue) -> Self {
        let mut request = self.clone();
        request.headers.append(name, value);
        request
    }

    /// Returns a copy with the body replaced.
    #[must_use]
    pub fn with_body(&self, body: impl Into<Bytes>) -> Self {
        let mut request = self.clone();
        request.body = body.into();
        request
    }
}

impl From<http::Request<Bytes>> for Request {
    fn from(request: http::Request<Bytes>) -> Self {
        let (parts, body) = request.into_parts();
        Self {
            method: parts.method,
            uri: parts.uri,
            version: parts.version,
            headers: parts.headers,
            body,
            attributes: HashMap::new(),
        }
    }
}

/// An outbound response.
///
/// A response carries a debug flag so that rendering helpers know whether
/// diagnostic details may be exposed.
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    version: Version,
    headers: HeaderMap,
    body: Bytes,
    debug: bool,
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

impl Response {
    /// Creates an empty `200 OK` response.
    #[must_use]
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            version: Version::HTTP_11,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            debug: false,
        }
    }

    /// Returns the status code.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the reason phrase of the status code.
    #[must_use]
    pub fn reason_phrase(&self) -> &'static str {
        self.status.canonical_reason().unwrap_or("")
    }

    /// Returns the HTTP version.
    #[must_use]
    pub fn version(&self) -> Version {
        self.version
    }

    /// Returns the response headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns all values of a header joined by `", "`.
    #[must_use]
    pub fn header_line(&self, name: &HeaderName) -> String {
        self.headers
            .get_all(name)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Returns the body.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the body as UTF-8 text, lossily.
    #[must_use]
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Returns `true` if diagnostic details may be rendered.
    #[must_use]
    pub fn is_debug(&self) -> bool {
        self.debug
    }

    /// Returns a copy with the status replaced.
    #[must_use]
    pub fn with_status(&self, status: StatusCode) -> Self {
        let mut response = self.clone();
        response.status = status;
        response
    }

    /// Returns a copy with the header replaced.
    #[must_use]
    pub fn with_header(&self, name: HeaderName, value: HeaderValue) -> Self {
        let mut response = self.clone();
        response.headers.insert(name, value);
        response
    }

    /// Returns a copy with the content type replaced.
    #[must_use]
    pub fn with_content_type(&self, content_type: HeaderValue) -> Self {
        self.with_header(CONTENT_TYPE, content_type)
    }

    /// Returns a copy with the body replaced.
    #[must_use]
    pub fn with_body(&self, body: impl Into<Bytes>) -> Self {
        let mut response = self.clone();
        response.body = body.into();
        response
    }

    /// Returns a copy with the body replaced by `text`.
    #[must_use]
    pub fn with_body_string(&self, text: impl Into<String>) -> Self {
        self.with_body(Bytes::from(text.into()))
    }

    /// Returns a copy with the HTTP version replaced.
    #[must_use]
    pub fn with_version(&self, version: Version) -> Self {
        let mut response = self.clone();
        response.version = version;
        response
    }

    /// Returns a copy with the debug flag replaced.
    #[must_use]
    pub fn with_debug(&self, debug: bool) -> Self {
        let mut response = self.clone();
        response.debug = debug;
        response
    }

    /// Converts into an `http::Response`.
    ///
    /// # Errors
    ///
    /// Fails only if the stored parts are inconsistent, which the builder
    /// methods never produce.
    pub fn into_http(self) -> Result<http::Response<Bytes>, http::Error> {
        let mut builder = http::Response::builder()
            .status(self.status)
            .version(self.version);
        if let Some(headers) = builder.headers_mut() {
            headers.extend(self.headers);
        }
        builder.body(self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_attributes_are_immutable() {
        let request = Request::new(Method::GET, Uri::from_static("/a"));
        let with = request.with_attribute("user", Value::from("bob"));
        let without = with.without_attribute("user");

        assert!(request.attribute("user").is_none());
        assert!(with.attribute("user").is_some());
        assert!(without.attribute("user").is_none());
        assert_eq!(with.attribute_names(), vec!["user"]);
    }

    #[test]
    fn test_request_from_http() {
        let http_request = http::Request::builder()
            .method(Method::POST)
            .uri("/items?x=1")
            .header("x-test", "yes")
            .body(Bytes::from_static(b"payload"))
            .unwrap();

        let request = Request::from(http_request);
        assert_eq!(request.method(), Method::POST);
        assert_eq!(request.path(), "/items");
        assert_eq!(request.headers()["x-test"], "yes");
        assert_eq!(request.body().as_ref(), b"payload");
    }

    #[test]
    fn test_with_status_does_not_mutate() {
        let response = Response::new();
        let not_found = response.with_status(StatusCode::NOT_FOUND);

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);
        assert_eq!(not_found.reason_phrase(), "Not Found");
    }

    #[test]
    fn test_header_line() {
        let response = Response::new()
            .with_content_type(HeaderValue::from_static("application/json"));
        assert_eq!(response.header_line(&CONTENT_TYPE), "application/json");
        assert_eq!(response.header_line(&http::header::ACCEPT), "");
    }

    #[test]
    fn test_into_http() {
        let response = Response::new()
            .with_status(StatusCode::CREATED)
            .with_body_string("done");
        let http_response = response.into_http().unwrap();
        assert_eq!(http_response.status(), StatusCode::CREATED);
        assert_eq!(http_response.body().as_ref(), b"done");
    }
}
