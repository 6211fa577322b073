/// Hardening headers for every response
///
/// [`SecurityHeadersLayer`] builds the header set once and stamps it onto
/// each response on the way out, overwriting anything a handler set. It sits
/// outermost in the router so rejections from inner layers (CORS, rate
/// limiting, body limits, panics) carry the same headers.
///
/// | Header | Value |
/// |---|---|
/// | `Content-Security-Policy` | [`CONTENT_SECURITY_POLICY`] |
/// | `Cross-Origin-Embedder-Policy` | `require-corp` |
/// | `Cross-Origin-Opener-Policy` | `same-origin` |
/// | `Cross-Origin-Resource-Policy` | `same-origin` |
/// | `X-DNS-Prefetch-Control` | `off` |
/// | `X-Frame-Options` | `DENY` |
/// | `Referrer-Policy` | `strict-origin-when-cross-origin` |
/// | `X-XSS-Protection` | `1; mode=block` |
/// | `X-Content-Type-Options` | `nosniff` |
/// | `X-Permitted-Cross-Domain-Policies` | `none` |
/// | `Strict-Transport-Security` | [`STRICT_TRANSPORT_SECURITY`], only with `HSTS_ENABLED` |
///
/// ```no_run
/// use axum::Router;
/// use bulwark_api::middleware::security::SecurityHeadersLayer;
///
/// let app: Router = Router::new().layer(SecurityHeadersLayer::new(true));
/// ```

use axum::{
    extract::Request,
    http::{header, HeaderMap, HeaderName, HeaderValue},
    response::Response,
};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};

pub const CONTENT_SECURITY_POLICY: &str = "default-src 'self'; script-src 'self'; \
style-src 'self'; img-src 'self'; connect-src 'self'; font-src 'self'; \
object-src 'none'; media-src 'self'; frame-src 'none'";

/// One year, subdomains included, eligible for preload lists
pub const STRICT_TRANSPORT_SECURITY: &str = "max-age=31536000; includeSubDomains; preload";

const ALWAYS: &[(&str, &str)] = &[
    ("content-security-policy", CONTENT_SECURITY_POLICY),
    ("cross-origin-embedder-policy", "require-corp"),
    ("cross-origin-opener-policy", "same-origin"),
    ("cross-origin-resource-policy", "same-origin"),
    ("x-dns-prefetch-control", "off"),
    ("x-frame-options", "DENY"),
    ("referrer-policy", "strict-origin-when-cross-origin"),
    ("x-xss-protection", "1; mode=block"),
    ("x-content-type-options", "nosniff"),
    ("x-permitted-cross-domain-policies", "none"),
];

type BoxFuture<T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send>>;

/// Builds the header set sent on every response
pub fn security_headers(enable_hsts: bool) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(ALWAYS.len() + 1);

    for &(name, value) in ALWAYS {
        headers.insert(HeaderName::from_static(name), HeaderValue::from_static(value));
    }

    if enable_hsts {
        headers.insert(
            header::STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static(STRICT_TRANSPORT_SECURITY),
        );
    }

    headers
}

#[derive(Clone)]
pub struct SecurityHeadersLayer {
    headers: Arc<HeaderMap>,
}

impl SecurityHeadersLayer {
    /// `enable_hsts` adds `Strict-Transport-Security`; leave it off when
    /// nothing in front of the server terminates TLS.
    pub fn new(enable_hsts: bool) -> Self {
        Self {
            headers: Arc::new(security_headers(enable_hsts)),
        }
    }
}

impl<S> Layer<S> for SecurityHeadersLayer {
    type Service = SecurityHeaders<S>;

    fn layer(&self, inner: S) -> Self::Service {
        SecurityHeaders {
            inner,
            headers: self.headers.clone(),
        }
    }
}

#[derive(Clone)]
pub struct SecurityHeaders<S> {
    inner: S,
    headers: Arc<HeaderMap>,
}

impl<S> Service<Request> for SecurityHeaders<S>
where
    S: Service<Request, Response = Response> + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<Self::Response, Self::Error>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let pending = self.inner.call(request);
        let headers = self.headers.clone();

        Box::pin(async move {
            let mut response = pending.await?;
            let target = response.headers_mut();
            for (name, value) in headers.iter() {
                target.insert(name.clone(), value.clone());
            }
            Ok(response)
        })
    }
}
