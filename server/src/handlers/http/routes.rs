use std::fmt::Display;
use std::future::Future;
use std::pin::Pin;
use std::time::Instant;

use bytes::Bytes;
use http_body_util::BodyExt;
use hyper::body::Body;
use hyper::{Method, Request, StatusCode};
use tracing::{info, warn};

use crate::AppState;
use crate::auth::AuthContext;
use crate::handlers::http::error::ApiError;
use crate::handlers::http::utils::{JsonResponse, PathParams, deliver_error_json};
use crate::handlers::http::{
    category, container, gear, health, login, manufacture, top_category, usergear, users,
};

pub type Reply = Result<JsonResponse, ApiError>;

type HandlerFuture = Pin<Box<dyn Future<Output = Reply> + Send>>;

// ---------------------------------------------------------------------------
// Handler type aliases
// ---------------------------------------------------------------------------
//
// Three security tiers:
//
//   OpenHandler:    no auth. Receives (req, state).
//                   Use for: /health and the Google callback.
//
//   AuthedHandler:  bearer token validated by the router.
//                   Receives (req, state, ctx).
//                   Used by both the Authed and the Admin tier; Admin
//                   additionally requires `ctx.is_admin`.
//
// Handlers see the body already collected into `Bytes`, with any `:param`
// segments stored as `PathParams` in the request extensions.

type OpenHandler = Box<dyn Fn(Request<Bytes>, AppState) -> HandlerFuture + Send + Sync>;

type AuthedHandler =
    Box<dyn Fn(Request<Bytes>, AppState, AuthContext) -> HandlerFuture + Send + Sync>;

enum RouteKind {
    Open(OpenHandler),

    /// Any valid token.
    Authed(AuthedHandler),

    /// A valid token carrying the admin audience.
    Admin(AuthedHandler),
}

struct Route {
    method: Method,
    path: String,
    kind: RouteKind,
}

pub struct Router {
    routes: Vec<Route>,
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("routes_count", &self.routes.len())
            .finish()
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    fn push(mut self, method: Method, path: &str, kind: RouteKind) -> Self {
        self.routes.push(Route {
            method,
            path: path.to_string(),
            kind,
        });
        self
    }

    fn open<F, Fut>(self, method: Method, path: &str, handler: F) -> Self
    where
        F: Fn(Request<Bytes>, AppState) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Reply> + Send + 'static,
    {
        self.push(
            method,
            path,
            RouteKind::Open(Box::new(move |req, state| Box::pin(handler(req, state)))),
        )
    }

    fn guarded<F, Fut>(self, method: Method, path: &str, admin: bool, handler: F) -> Self
    where
        F: Fn(Request<Bytes>, AppState, AuthContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Reply> + Send + 'static,
    {
        let boxed: AuthedHandler =
            Box::new(move |req, state, ctx| Box::pin(handler(req, state, ctx)));
        let kind = if admin {
            RouteKind::Admin(boxed)
        } else {
            RouteKind::Authed(boxed)
        };
        self.push(method, path, kind)
    }

    // ── Open (no auth) ────────────────────────────────────────────────────────

    pub fn get<F, Fut>(self, path: &str, handler: F) -> Self
    where
        F: Fn(Request<Bytes>, AppState) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Reply> + Send + 'static,
    {
        self.open(Method::GET, path, handler)
    }

    pub fn post<F, Fut>(self, path: &str, handler: F) -> Self
    where
        F: Fn(Request<Bytes>, AppState) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Reply> + Send + 'static,
    {
        self.open(Method::POST, path, handler)
    }

    // ── Authed (any valid token) ─────────────────────────────────────────────

    pub fn get_authed<F, Fut>(self, path: &str, handler: F) -> Self
    where
        F: Fn(Request<Bytes>, AppState, AuthContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Reply> + Send + 'static,
    {
        self.guarded(Method::GET, path, false, handler)
    }

    pub fn post_authed<F, Fut>(self, path: &str, handler: F) -> Self
    where
        F: Fn(Request<Bytes>, AppState, AuthContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Reply> + Send + 'static,
    {
        self.guarded(Method::POST, path, false, handler)
    }

    pub fn put_authed<F, Fut>(self, path: &str, handler: F) -> Self
    where
        F: Fn(Request<Bytes>, AppState, AuthContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Reply> + Send + 'static,
    {
        self.guarded(Method::PUT, path, false, handler)
    }

    pub fn delete_authed<F, Fut>(self, path: &str, handler: F) -> Self
    where
        F: Fn(Request<Bytes>, AppState, AuthContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Reply> + Send + 'static,
    {
        self.guarded(Method::DELETE, path, false, handler)
    }

    // ── Admin (token with the admin audience) ────────────────────────────────

    pub fn post_admin<F, Fut>(self, path: &str, handler: F) -> Self
    where
        F: Fn(Request<Bytes>, AppState, AuthContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Reply> + Send + 'static,
    {
        self.guarded(Method::POST, path, true, handler)
    }

    pub fn put_admin<F, Fut>(self, path: &str, handler: F) -> Self
    where
        F: Fn(Request<Bytes>, AppState, AuthContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Reply> + Send + 'static,
    {
        self.guarded(Method::PUT, path, true, handler)
    }

    pub fn delete_admin<F, Fut>(self, path: &str, handler: F) -> Self
    where
        F: Fn(Request<Bytes>, AppState, AuthContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Reply> + Send + 'static,
    {
        self.guarded(Method::DELETE, path, true, handler)
    }

    // ── Dispatch ──────────────────────────────────────────────────────────────

    /// Route one request. Every failure becomes a JSON error response, so
    /// this never fails.
    pub async fn route<B>(&self, req: Request<B>, state: AppState) -> JsonResponse
    where
        B: Body<Data = Bytes> + Send,
        B::Error: Display,
    {
        let started = Instant::now();
        let method = req.method().clone();
        let path = req.uri().path().to_string();

        let response = match self.dispatch(req, state).await {
            Ok(response) => response,
            Err(err) => err.into_response(),
        };

        info!(
            method = %method,
            path = %path,
            status = response.status().as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Handled request"
        );
        response
    }

    async fn dispatch<B>(&self, req: Request<B>, state: AppState) -> Reply
    where
        B: Body<Data = Bytes> + Send,
        B::Error: Display,
    {
        let (parts, body) = req.into_parts();
        let body = body
            .collect()
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to read request body: {}", e)))?
            .to_bytes();
        let mut req = Request::from_parts(parts, body);

        for route in &self.routes {
            if route.method != req.method() {
                continue;
            }
            let Some(params) = Self::path_params(&route.path, req.uri().path()) else {
                continue;
            };
            req.extensions_mut().insert(params);

            return match &route.kind {
                RouteKind::Open(h) => h(req, state).await,

                RouteKind::Authed(h) => {
                    let ctx = state.tokens.authenticate(req.headers())?;
                    h(req, state, ctx).await
                }

                RouteKind::Admin(h) => {
                    let ctx = state.tokens.authenticate(req.headers())?;
                    if !ctx.is_admin {
                        warn!(
                            "Admin route {} {} refused for subject {}",
                            route.method, route.path, ctx.subject
                        );
                        return Err(ApiError::forbidden());
                    }
                    h(req, state, ctx).await
                }
            };
        }

        Ok(deliver_error_json(
            "Endpoint not found",
            StatusCode::NOT_FOUND,
        )?)
    }

    // ── Path matching ─────────────────────────────────────────────────────────

    /// Match `request_path` against `route_path`, capturing `:param`
    /// segments. Returns `None` when the paths do not match.
    pub fn path_params(route_path: &str, request_path: &str) -> Option<PathParams> {
        // Strip query string from incoming request path before comparing.
        let clean = request_path.split('?').next().unwrap_or(request_path);

        let route_segs: Vec<&str> = route_path.split('/').collect();
        let path_segs: Vec<&str> = clean.split('/').collect();

        if route_segs.len() != path_segs.len() {
            return None;
        }

        let mut params = PathParams::default();
        for (r, p) in route_segs.iter().zip(path_segs.iter()) {
            match r.strip_prefix(':') {
                Some(_) if p.is_empty() => return None,
                Some(name) => params.push(name, p),
                None if r != p => return None,
                None => {}
            }
        }
        Some(params)
    }

    pub fn path_matches(route_path: &str, request_path: &str) -> bool {
        Self::path_params(route_path, request_path).is_some()
    }
}

// ---------------------------------------------------------------------------
// API router
//
// Auth tier is enforced here at the routing level; handlers MUST NOT repeat
// the auth call.
//
//   .get / .post                    → Open    handler gets (req, state)
//   .{get,post,put,delete}_authed   → Authed  handler gets (req, state, ctx)
//   .{post,put,delete}_admin        → Admin   same, 403 unless ctx.is_admin
// ---------------------------------------------------------------------------

pub fn build_api_router() -> Router {
    Router::new()
        // ── Public ───────────────────────────────────────────────────────────
        .get("/health", health::handle_health)
        .get("/auth/google/callback", login::handle_google_callback)
        .post("/auth/google/callback", login::handle_google_callback)
        // ── Token ────────────────────────────────────────────────────────────
        .post_authed("/auth/refresh", login::handle_refresh)
        // ── Gear ─────────────────────────────────────────────────────────────
        .get_authed("/api/v1/gear/list", gear::handle_list)
        .get_authed("/api/v1/gear/search", gear::handle_search)
        .get_authed("/api/v1/gear/:id/get", gear::handle_get)
        .post_authed("/api/v1/gear/:id/update", gear::handle_update)
        .delete_authed("/api/v1/gear/:id/delete", gear::handle_delete)
        .put_authed("/api/v1/gear/insert", gear::handle_insert)
        // ── Users ────────────────────────────────────────────────────────────
        .get_authed("/api/v1/users/list", users::handle_list)
        .get_authed("/api/v1/users/:id/get", users::handle_get)
        .post_authed("/api/v1/users/:id/update", users::handle_update)
        .post_authed("/api/v1/users/:id/password", users::handle_set_password)
        .delete_authed("/api/v1/users/:id/delete", users::handle_delete)
        .put_admin("/api/v1/users/insert", users::handle_insert)
        // ── User gear ────────────────────────────────────────────────────────
        .get_authed("/api/v1/usergear/:user/list", usergear::handle_list)
        .get_authed(
            "/api/v1/usergear/registration/:id/get",
            usergear::handle_get,
        )
        .post_authed(
            "/api/v1/usergear/registration/:id/update",
            usergear::handle_update,
        )
        .delete_authed(
            "/api/v1/usergear/registration/:id/delete",
            usergear::handle_delete,
        )
        .put_authed("/api/v1/usergear/insert", usergear::handle_insert)
        // ── Containers ───────────────────────────────────────────────────────
        .get_authed("/api/v1/container/:id/list", container::handle_list)
        .get_authed("/api/v1/container/:id/get", container::handle_get)
        .put_authed("/api/v1/container/insert", container::handle_insert)
        .delete_authed("/api/v1/container/:id/delete", container::handle_delete)
        // ── Catalog: reads for everyone, writes for admins ───────────────────
        .get_authed("/api/v1/topCategory/list", top_category::handle_list)
        .get_authed("/api/v1/topCategory/:id/get", top_category::handle_get)
        .post_admin("/api/v1/topCategory/:id/update", top_category::handle_update)
        .delete_admin("/api/v1/topCategory/:id/delete", top_category::handle_delete)
        .put_admin("/api/v1/topCategory/insert", top_category::handle_insert)
        .get_authed("/api/v1/category/list", category::handle_list)
        .get_authed("/api/v1/category/:id/get", category::handle_get)
        .post_admin("/api/v1/category/:id/update", category::handle_update)
        .delete_admin("/api/v1/category/:id/delete", category::handle_delete)
        .put_admin("/api/v1/category/insert", category::handle_insert)
        .get_authed("/api/v1/manufacture/list", manufacture::handle_list)
        .get_authed("/api/v1/manufacture/:id/get", manufacture::handle_get)
        .post_admin("/api/v1/manufacture/:id/update", manufacture::handle_update)
        .delete_admin("/api/v1/manufacture/:id/delete", manufacture::handle_delete)
        .put_admin("/api/v1/manufacture/insert", manufacture::handle_insert)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::http::utils::deliver_serialized_json;

    #[test]
    fn exact_path_matches() {
        assert!(Router::path_matches("/health", "/health"));
    }

    #[test]
    fn different_paths_do_not_match() {
        assert!(!Router::path_matches("/api/v1/gear/list", "/api/v1/users/list"));
    }

    #[test]
    fn trailing_slash_does_not_match_without_slash() {
        assert!(!Router::path_matches("/health", "/health/"));
    }

    #[test]
    fn wildcard_segment_captures_value() {
        let params = Router::path_params("/api/v1/gear/:id/get", "/api/v1/gear/42/get").unwrap();
        assert_eq!(params.get("id"), Some("42"));
    }

    #[test]
    fn wildcard_does_not_match_extra_segments() {
        assert!(!Router::path_matches(
            "/api/v1/usergear/:user/list",
            "/api/v1/usergear/registration/3/get"
        ));
    }

    #[test]
    fn empty_wildcard_segment_does_not_match() {
        assert!(!Router::path_matches("/api/v1/gear/:id/get", "/api/v1/gear//get"));
    }

    #[test]
    fn query_string_stripped_before_match() {
        assert!(Router::path_matches(
            "/api/v1/gear/list",
            "/api/v1/gear/list?page=2&limit=10"
        ));
    }

    #[test]
    fn builders_pick_the_tier() {
        let ok = |_req: Request<Bytes>, _state: AppState| async move {
            Ok::<_, ApiError>(deliver_serialized_json(&"pong", StatusCode::OK)?)
        };
        let guarded = |_req: Request<Bytes>, _state: AppState, _ctx: AuthContext| async move {
            Ok::<_, ApiError>(deliver_serialized_json(&"ok", StatusCode::OK)?)
        };

        let r = Router::new()
            .get("/ping", ok)
            .get_authed("/a", guarded)
            .delete_admin("/b", guarded);

        assert_eq!(r.routes.len(), 3);
        assert!(matches!(r.routes[0].kind, RouteKind::Open(_)));
        assert!(matches!(r.routes[1].kind, RouteKind::Authed(_)));
        assert!(matches!(r.routes[2].kind, RouteKind::Admin(_)));
        assert_eq!(r.routes[2].method, Method::DELETE);
    }

    #[test]
    fn api_router_registers_every_route() {
        let r = build_api_router();
        let admin = r
            .routes
            .iter()
            .filter(|route| matches!(route.kind, RouteKind::Admin(_)))
            .count();
        assert_eq!(r.routes.len(), 40);
        assert_eq!(admin, 10);
    }
}
