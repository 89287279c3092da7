use hyper::Method;
use hyper::header::{AUTHORIZATION, CONTENT_TYPE, HeaderName};
use tower_http::cors::{Any, CorsLayer};

const X_REQUESTED_WITH: HeaderName = HeaderName::from_static("x-requested-with");

/// CORS for browser clients on any origin. Preflight `OPTIONS` requests are
/// answered here and never reach the router.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, X_REQUESTED_WITH])
        .expose_headers([AUTHORIZATION, CONTENT_TYPE])
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use bytes::Bytes;
    use http_body_util::Full;
    use hyper::header::{
        ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_EXPOSE_HEADERS,
        ACCESS_CONTROL_REQUEST_METHOD, ORIGIN,
    };
    use hyper::{Request, Response, StatusCode};
    use tower::{ServiceBuilder, ServiceExt};

    use super::*;

    async fn call(req: Request<Full<Bytes>>) -> Response<Full<Bytes>> {
        ServiceBuilder::new()
            .layer(cors_layer())
            .service_fn(|_req: Request<Full<Bytes>>| async {
                Ok::<_, Infallible>(Response::new(Full::new(Bytes::from_static(b"inner"))))
            })
            .oneshot(req)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn preflight_is_answered_by_the_layer() {
        let req = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/v1/gear/insert")
            .header(ORIGIN, "https://gear.example")
            .header(ACCESS_CONTROL_REQUEST_METHOD, "PUT")
            .body(Full::default())
            .unwrap();

        let res = call(req).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        let methods = res.headers()[ACCESS_CONTROL_ALLOW_METHODS].to_str().unwrap();
        assert!(methods.contains("PUT"));
        assert!(methods.contains("DELETE"));
    }

    #[tokio::test]
    async fn simple_request_exposes_headers() {
        let req = Request::builder()
            .uri("/health")
            .header(ORIGIN, "https://gear.example")
            .body(Full::default())
            .unwrap();

        let res = call(req).await;
        assert_eq!(res.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        let exposed = res.headers()[ACCESS_CONTROL_EXPOSE_HEADERS]
            .to_str()
            .unwrap()
            .to_ascii_lowercase();
        assert!(exposed.contains("authorization"));
    }
}
