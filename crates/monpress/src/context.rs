//! Per-request state shared by every step of a chain.

use std::collections::HashMap;
use std::fmt;

use axum::body::Body;
use axum::extract::Request;
use axum::http::{HeaderMap, Method};
use axum::response::{IntoResponse, Response};
use serde::de::DeserializeOwned;

/// Request bodies larger than this are rejected by [`Context::json`].
pub const BODY_LIMIT: usize = 2 * 1024 * 1024;

/// The request being handled, its matched path parameters, and the response
/// slot that steps fill in.
pub struct Context {
    request: Request,
    params: HashMap<String, String>,
    response: Option<Response>,
}

impl Context {
    pub fn new(request: Request, params: HashMap<String, String>) -> Self {
        Context {
            request,
            params,
            response: None,
        }
    }

    /// A context with no matched path parameters.
    pub fn from_request(request: Request) -> Self {
        Self::new(request, HashMap::new())
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn request_mut(&mut self) -> &mut Request {
        &mut self.request
    }

    pub fn method(&self) -> &Method {
        self.request.method()
    }

    pub fn path(&self) -> &str {
        self.request.uri().path()
    }

    pub fn headers(&self) -> &HeaderMap {
        self.request.headers()
    }

    /// Looks up a header and returns it only if it is valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.request
            .headers()
            .get(name)
            .and_then(|value| value.to_str().ok())
    }

    /// A matched path parameter; optional parameters that were not supplied
    /// are absent.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    /// Reads the request body as JSON.
    ///
    /// The body can only be consumed once; later calls see an empty body.
    /// A malformed payload surfaces as a `serde_json::Error`, which the
    /// error boundary reports as a 400.
    pub async fn json<T: DeserializeOwned>(&mut self) -> anyhow::Result<T> {
        let body = std::mem::take(self.request.body_mut());
        let bytes = axum::body::to_bytes(body, BODY_LIMIT).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Sets the response, replacing any earlier one.
    pub fn respond(&mut self, response: impl IntoResponse) {
        self.response = Some(response.into_response());
    }

    pub fn has_response(&self) -> bool {
        self.response.is_some()
    }

    pub fn take_response(&mut self) -> Option<Response> {
        self.response.take()
    }
}

impl From<Request> for Context {
    fn from(request: Request) -> Self {
        Context::from_request(request)
    }
}

impl Default for Context {
    fn default() -> Self {
        Context::from_request(Request::new(Body::empty()))
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("method", self.method())
            .field("path", &self.path())
            .field("params", &self.params)
            .field("has_response", &self.has_response())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use serde::Deserialize;

    fn post(path: &str, body: &str) -> Request {
        axum::http::Request::builder()
            .method(Method::POST)
            .uri(path)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct NewUser {
        name: String,
    }

    #[test]
    fn test_params_and_request_info() {
        let mut params = HashMap::new();
        params.insert("id".to_string(), "42".to_string());
        let ctx = Context::new(post("/users/42", ""), params);

        assert_eq!(ctx.method(), Method::POST);
        assert_eq!(ctx.path(), "/users/42");
        assert_eq!(ctx.param("id"), Some("42"));
        assert_eq!(ctx.param("missing"), None);
        assert_eq!(ctx.header("content-type"), Some("application/json"));
    }

    #[test]
    fn test_response_slot() {
        let mut ctx = Context::default();
        assert!(!ctx.has_response());

        ctx.respond(StatusCode::CREATED);
        assert!(ctx.has_response());

        let response = ctx.take_response().unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert!(ctx.take_response().is_none());
    }

    #[tokio::test]
    async fn test_json_body() {
        let mut ctx = Context::from_request(post("/users", r#"{"name":"ada"}"#));
        let user: NewUser = ctx.json().await.unwrap();
        assert_eq!(user, NewUser { name: "ada".to_string() });
    }

    #[tokio::test]
    async fn test_malformed_json_is_serde_error() {
        let mut ctx = Context::from_request(post("/users", "{nope"));
        let err = ctx.json::<NewUser>().await.unwrap_err();
        assert!(err.downcast_ref::<serde_json::Error>().is_some());
    }
}
