//! Resolved call arguments and handler results.

use crate::args::ExtraArgs;
use std::any::Any;
use std::sync::Arc;
use wirebind_core::{Request, Response, Value};
use wirebind_middleware::Next;

/// The values bound to a handler's declared parameters, followed by three
/// trailing positionals: the active request, the active response and the
/// extra arguments.
///
/// Null parameters are stored as `None`.
#[derive(Debug, Clone)]
pub struct Invocation {
    params: Vec<(String, Option<Value>)>,
    request: Option<Request>,
    response: Option<Response>,
    args: ExtraArgs,
}

impl Invocation {
    pub(crate) fn new(
        params: Vec<(String, Option<Value>)>,
        request: Option<Request>,
        response: Option<Response>,
        args: ExtraArgs,
    ) -> Self {
        Self {
            params,
            request,
            response,
            args,
        }
    }

    /// Returns the value bound to `name`.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<Value> {
        self.params
            .iter()
            .find(|(param, _)| param == name)
            .and_then(|(_, value)| value.clone())
    }

    /// Returns the value bound to `name` as a `T`.
    #[must_use]
    pub fn get<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        self.value(name).and_then(|value| value.downcast::<T>())
    }

    /// Returns the string bound to `name`.
    #[must_use]
    pub fn str(&self, name: &str) -> Option<String> {
        self.value(name)
            .and_then(|value| value.as_str().map(str::to_owned))
    }

    /// Returns `true` if `name` is declared and resolved to null.
    #[must_use]
    pub fn is_null(&self, name: &str) -> bool {
        self.params
            .iter()
            .any(|(param, value)| param == name && value.is_none())
    }

    /// Returns the request bound to a declared `request` parameter, falling
    /// back to the trailing request.
    #[must_use]
    pub fn request(&self) -> Option<Request> {
        self.get::<Request>("request")
            .map(|request| (*request).clone())
            .or_else(|| self.request.clone())
    }

    /// Returns the response bound to a declared `response` parameter,
    /// falling back to the trailing response.
    #[must_use]
    pub fn response(&self) -> Option<Response> {
        self.get::<Response>("response")
            .map(|response| (*response).clone())
            .or_else(|| self.response.clone())
    }

    /// Returns the continuation bound to a declared `next` parameter.
    #[must_use]
    pub fn next(&self) -> Option<Next> {
        self.get::<Next>("next").map(|next| (*next).clone())
    }

    /// Returns the trailing extra arguments.
    #[must_use]
    pub fn args(&self) -> &ExtraArgs {
        &self.args
    }

    /// Returns the positional value at `index`: declared parameters first,
    /// then the trailing request, response and extra arguments.
    #[must_use]
    pub fn positional(&self, index: usize) -> Option<Value> {
        let declared = self.params.len();
        match index {
            i if i < declared => self.params[i].1.clone(),
            i if i == declared => self.request.clone().map(Value::new),
            i if i == declared + 1 => self.response.clone().map(Value::new),
            i if i == declared + 2 => Some(Value::new(self.args.clone())),
            _ => None,
        }
    }

    /// Returns the number of positional values, trailing ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.params.len() + 3
    }

    /// Always `false`: the trailing positionals are always present.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Returns the declared parameter names in order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.params.iter().map(|(name, _)| name.as_str()).collect()
    }
}

/// What a handler returns.
#[derive(Debug, Clone)]
pub enum Reply {
    /// A new response.
    Response(Response),
    /// Nothing; the active response is used unchanged.
    Empty,
}

impl Reply {
    /// Converts into a response, using `fallback` for [`Reply::Empty`].
    #[must_use]
    pub fn into_response(self, fallback: Response) -> Response {
        match self {
            Self::Response(response) => response,
            Self::Empty => fallback,
        }
    }
}

impl From<Response> for Reply {
    fn from(response: Response) -> Self {
        Self::Response(response)
    }
}

impl From<()> for Reply {
    fn from((): ()) -> Self {
        Self::Empty
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{Method, StatusCode, Uri};

    fn invocation() -> Invocation {
        Invocation::new(
            vec![
                ("id".to_string(), Some(Value::new(5_u64))),
                ("name".to_string(), Some(Value::from("x"))),
                ("filter".to_string(), None),
            ],
            Some(Request::new(Method::GET, Uri::from_static("/"))),
            Some(Response::new()),
            ExtraArgs::new().with(Value::new(1_u8)),
        )
    }

    #[test]
    fn test_named_access() {
        let inv = invocation();
        assert_eq!(*inv.get::<u64>("id").unwrap(), 5);
        assert_eq!(inv.str("name").as_deref(), Some("x"));
        assert!(inv.is_null("filter"));
        assert!(!inv.is_null("id"));
        assert!(inv.value("missing").is_none());
        assert_eq!(inv.names(), vec!["id", "name", "filter"]);
    }

    #[test]
    fn test_trailing_positionals() {
        let inv = invocation();
        assert_eq!(inv.len(), 6);
        assert!(inv.positional(0).unwrap().is::<u64>());
        assert!(inv.positional(2).is_none());
        assert!(inv.positional(3).unwrap().is::<Request>());
        assert!(inv.positional(4).unwrap().is::<Response>());
        assert_eq!(
            inv.positional(5)
                .unwrap()
                .downcast_ref::<ExtraArgs>()
                .map(ExtraArgs::len),
            Some(1)
        );
        assert!(inv.positional(6).is_none());
    }

    #[test]
    fn test_request_falls_back_to_trailing() {
        let inv = invocation();
        assert_eq!(inv.request().unwrap().path(), "/");
        assert!(inv.response().is_some());
        assert!(inv.next().is_none());
    }

    #[test]
    fn test_reply_into_response() {
        let fallback = Response::new().with_status(StatusCode::ACCEPTED);
        assert_eq!(
            Reply::from(()).into_response(fallback.clone()).status(),
            StatusCode::ACCEPTED
        );
        assert_eq!(
            Reply::from(Response::new()).into_response(fallback).status(),
            StatusCode::OK
        );
    }
}
