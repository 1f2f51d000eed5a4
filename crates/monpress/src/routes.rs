//! The route registry filled in by the generated `router()` function.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use axum::extract::{Path, Request};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{MethodFilter, MethodRouter};
use axum::Router;
use tracing::{debug, warn};

use crate::chain::{Chain, ChainBuilder, Step};
use crate::context::Context;

/// Anything that can be registered as a route handler.
///
/// Route files usually export `pub fn GET() -> ChainBuilder`, so plain
/// functions returning a chain are accepted as well.
pub trait IntoChain {
    fn into_chain(self) -> Chain;
}

impl IntoChain for Chain {
    fn into_chain(self) -> Chain {
        self
    }
}

impl IntoChain for ChainBuilder {
    fn into_chain(self) -> Chain {
        self.finalize()
    }
}

impl<F, C> IntoChain for F
where
    F: FnOnce() -> C,
    C: IntoChain,
{
    fn into_chain(self) -> Chain {
        self().into_chain()
    }
}

/// One registration: a method, an axum-style path and its chain.
#[derive(Debug, Clone)]
pub struct RouteEntry {
    pub method: Method,
    pub path: String,
    pub chain: Chain,
}

/// Ordered collection of route registrations.
///
/// Paths use axum syntax extended with optional parameters: `/docs/:page?`
/// serves both `/docs/:page` and `/docs`.
#[derive(Debug, Clone, Default)]
pub struct Routes {
    entries: Vec<RouteEntry>,
}

macro_rules! method {
    ($($(#[$m:meta])* $v:vis fn $n:ident = $meth:expr;)+) => {
        $(
            $(#[$m])* $v fn $n(&mut self, path: &str, chain: impl IntoChain) -> &mut Self {
                self.route($meth, path, chain)
            }
        )+
    };
}

impl Routes {
    pub fn new() -> Self {
        Routes::default()
    }

    /// Registers `chain` for `method` requests to `path`.
    pub fn route(&mut self, method: Method, path: &str, chain: impl IntoChain) -> &mut Self {
        self.entries.push(RouteEntry {
            method,
            path: path.to_string(),
            chain: chain.into_chain(),
        });
        self
    }

    method! {
        /// Registers a `GET` handler.
        pub fn get = Method::GET;
        /// Registers a `POST` handler.
        pub fn post = Method::POST;
        /// Registers a `PUT` handler.
        pub fn put = Method::PUT;
        /// Registers a `PATCH` handler.
        pub fn patch = Method::PATCH;
        /// Registers a `DELETE` handler.
        pub fn delete = Method::DELETE;
    }

    /// Appends every registration from `other`.
    pub fn merge(&mut self, other: Routes) -> &mut Self {
        self.entries.extend(other.entries);
        self
    }

    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Converts the registry into an axum router.
    ///
    /// `global` steps run before every route's own chain.  Registering the
    /// same method and path twice keeps the later registration.  Paths whose
    /// parameters would collide with an earlier path of the same shape are
    /// skipped with a warning, as are paths that repeat a parameter name.
    pub fn into_router(self, global: &[Arc<dyn Step>]) -> Router {
        let mut mounts: Vec<Mount> = Vec::new();

        for entry in dedup_last_wins(self.entries) {
            let Ok(filter) = MethodFilter::try_from(entry.method.clone()) else {
                warn!(method = %entry.method, path = %entry.path, "unsupported method, route skipped");
                continue;
            };
            if let Some(name) = repeated_param(&entry.path) {
                warn!(path = %entry.path, param = name, "parameter repeats in path, route skipped");
                continue;
            }
            let chain = entry.chain.prepend(global);

            for path in expand_optional(&entry.path) {
                let shape = shape_of(&path);
                match mounts.iter_mut().find(|m| m.shape == shape) {
                    Some(mount) if mount.path != path => {
                        warn!(
                            path = %path,
                            existing = %mount.path,
                            "route conflicts with an existing path, skipped"
                        );
                    }
                    Some(mount) if mount.methods.contains(&entry.method) => {
                        warn!(method = %entry.method, path = %path, "route already served, skipped");
                    }
                    Some(mount) => mount.add(entry.method.clone(), filter, chain.clone()),
                    None => {
                        let mut mount = Mount::new(shape, path);
                        mount.add(entry.method.clone(), filter, chain.clone());
                        mounts.push(mount);
                    }
                }
            }
        }

        mounts.into_iter().fold(Router::new(), |router, mount| {
            debug!(path = %mount.path, methods = ?mount.methods, "mounting route");
            router.route(&mount.path, mount.router)
        })
    }
}

struct Mount {
    shape: String,
    path: String,
    methods: Vec<Method>,
    router: MethodRouter,
}

impl Mount {
    fn new(shape: String, path: String) -> Self {
        Mount {
            shape,
            path,
            methods: Vec::new(),
            router: MethodRouter::new(),
        }
    }

    fn add(&mut self, method: Method, filter: MethodFilter, chain: Chain) {
        self.methods.push(method);
        let router = std::mem::replace(&mut self.router, MethodRouter::new());
        self.router = router.on(
            filter,
            move |params: Option<Path<HashMap<String, String>>>, request: Request| async move {
                let params = params.map(|Path(params)| params).unwrap_or_default();
                dispatch(chain, params, request).await
            },
        );
    }
}

impl fmt::Debug for Mount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mount")
            .field("path", &self.path)
            .field("methods", &self.methods)
            .finish_non_exhaustive()
    }
}

fn dedup_last_wins(entries: Vec<RouteEntry>) -> Vec<RouteEntry> {
    let mut kept: Vec<RouteEntry> = Vec::with_capacity(entries.len());
    for entry in entries {
        match kept
            .iter_mut()
            .find(|k| k.method == entry.method && k.path == entry.path)
        {
            Some(existing) => {
                warn!(method = %entry.method, path = %entry.path, "route registered twice, keeping the last one");
                *existing = entry;
            }
            None => kept.push(entry),
        }
    }
    kept
}

/// Expands `:name?` segments into every concrete path, longest first.
fn expand_optional(path: &str) -> Vec<String> {
    let mut variants: Vec<Vec<&str>> = vec![Vec::new()];

    for segment in path.split('/').filter(|s| !s.is_empty()) {
        match segment.strip_suffix('?').filter(|_| segment.starts_with(':')) {
            Some(required) => {
                variants = variants
                    .into_iter()
                    .flat_map(|without| {
                        let mut with = without.clone();
                        with.push(required);
                        [with, without]
                    })
                    .collect();
            }
            None => variants.iter_mut().for_each(|v| v.push(segment)),
        }
    }

    let mut paths: Vec<String> = Vec::with_capacity(variants.len());
    for variant in variants {
        let path = format!("/{}", variant.join("/"));
        if !paths.contains(&path) {
            paths.push(path);
        }
    }
    paths
}

/// First parameter name that occurs twice, counting `:id` and `:id?` alike.
fn repeated_param(path: &str) -> Option<&str> {
    let mut seen: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        let Some(name) = segment.strip_prefix(':') else {
            continue;
        };
        let name = name.strip_suffix('?').unwrap_or(name);
        if seen.contains(&name) {
            return Some(name);
        }
        seen.push(name);
    }
    None
}

/// A path with its parameter names erased: `/users/:id` → `/users/:`.
fn shape_of(path: &str) -> String {
    path.split('/')
        .map(|segment| if segment.starts_with(':') { ":" } else { segment })
        .collect::<Vec<_>>()
        .join("/")
}

async fn dispatch(chain: Chain, params: HashMap<String, String>, request: Request) -> Response {
    let mut ctx = Context::new(request, params);

    match chain.execute(&mut ctx).await {
        Ok(outcome) => ctx.take_response().unwrap_or_else(|| {
            warn!(?outcome, method = %ctx.method(), path = ctx.path(), "handler finished without a response");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }),
        Err(err) => err.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{handler, sync};
    use crate::error::HttpError;
    use axum::body::{to_bytes, Body};
    use tower::ServiceExt;

    fn text(body: &'static str) -> ChainBuilder {
        handler(sync(move |ctx: &mut Context, next| {
            ctx.respond(body);
            next.proceed()
        }))
    }

    fn echo_param(name: &'static str) -> ChainBuilder {
        handler(sync(move |ctx: &mut Context, next| {
            let value = ctx.param(name).unwrap_or("none").to_string();
            ctx.respond(value);
            next.proceed()
        }))
    }

    async fn call(router: &Router, method: Method, uri: &str) -> (StatusCode, String) {
        let request = axum::http::Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[test]
    fn test_expand_optional() {
        assert_eq!(expand_optional("/"), vec!["/"]);
        assert_eq!(expand_optional("/users/:id"), vec!["/users/:id"]);
        assert_eq!(expand_optional("/docs/:page?"), vec!["/docs/:page", "/docs"]);
        assert_eq!(
            expand_optional("/:a?/x/:b?"),
            vec!["/:a/x/:b", "/:a/x", "/x/:b", "/x"]
        );
    }

    #[test]
    fn test_shape_of() {
        assert_eq!(shape_of("/users/:id"), shape_of("/users/:user_id"));
        assert_ne!(shape_of("/users/:id"), shape_of("/users/new"));
    }

    #[test]
    fn test_function_items_are_chains() {
        fn get() -> ChainBuilder {
            text("hi")
        }
        let mut routes = Routes::new();
        routes.get("/", get).post("/", text("posted")).delete("/", text("gone").finalize());
        assert_eq!(routes.len(), 3);
        assert_eq!(routes.entries()[1].method, Method::POST);
    }

    #[tokio::test]
    async fn test_params_reach_the_context() {
        let mut routes = Routes::new();
        routes.get("/users/:id", echo_param("id"));
        let router = routes.into_router(&[]);

        assert_eq!(call(&router, Method::GET, "/users/42").await, (StatusCode::OK, "42".to_string()));
        assert_eq!(call(&router, Method::GET, "/nowhere").await.0, StatusCode::NOT_FOUND);
        assert_eq!(call(&router, Method::POST, "/users/42").await.0, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_optional_param_serves_both_paths() {
        let mut routes = Routes::new();
        routes.get("/docs/:page?", echo_param("page"));
        let router = routes.into_router(&[]);

        assert_eq!(call(&router, Method::GET, "/docs/intro").await.1, "intro");
        assert_eq!(call(&router, Method::GET, "/docs").await.1, "none");
    }

    #[tokio::test]
    async fn test_duplicate_registration_keeps_last() {
        let mut routes = Routes::new();
        routes.get("/", text("first"));
        routes.get("/", text("second"));
        let router = routes.into_router(&[]);

        assert_eq!(call(&router, Method::GET, "/").await.1, "second");
    }

    #[tokio::test]
    async fn test_conflicting_shape_is_skipped() {
        let mut routes = Routes::new();
        routes.get("/users/:id", echo_param("id"));
        routes.delete("/users/:user_id", echo_param("user_id"));
        let router = routes.into_router(&[]);

        assert_eq!(call(&router, Method::GET, "/users/7").await.1, "7");
        assert_eq!(call(&router, Method::DELETE, "/users/7").await.0, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_repeated_param_name_is_skipped() {
        assert_eq!(repeated_param("/:id/:id?"), Some("id"));
        assert_eq!(repeated_param("/:org/teams/:team"), None);

        let mut routes = Routes::new();
        routes.get("/:id/:id?", echo_param("id"));
        routes.get("/items/:id", echo_param("id"));
        let router = routes.into_router(&[]);

        assert_eq!(call(&router, Method::GET, "/1/2").await.0, StatusCode::NOT_FOUND);
        assert_eq!(call(&router, Method::GET, "/1").await.0, StatusCode::NOT_FOUND);
        assert_eq!(call(&router, Method::GET, "/items/3").await.1, "3");
    }

    #[tokio::test]
    async fn test_errors_become_json_responses() {
        let mut routes = Routes::new();
        routes.get(
            "/secret",
            handler(sync(|_ctx: &mut Context, next| next.fail(HttpError::forbidden("no access")))),
        );
        let router = routes.into_router(&[]);

        let (status, body) = call(&router, Method::GET, "/secret").await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(body.contains("\"message\":\"no access\""));
    }

    #[tokio::test]
    async fn test_missing_response_is_500() {
        let mut routes = Routes::new();
        routes.get("/", handler(sync(|_ctx: &mut Context, next| next.proceed())));
        let router = routes.into_router(&[]);

        let (status, body) = call(&router, Method::GET, "/").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_global_steps_run_first() {
        let guard: Arc<dyn Step> = Arc::new(sync(|ctx: &mut Context, next| {
            if ctx.header("x-token").is_some() {
                next.proceed()
            } else {
                next.fail(HttpError::unauthorized("missing token"))
            }
        }));

        let mut routes = Routes::new();
        routes.get("/", text("welcome"));
        let router = routes.into_router(&[guard]);

        assert_eq!(call(&router, Method::GET, "/").await.0, StatusCode::UNAUTHORIZED);
    }
}
