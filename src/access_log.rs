//! HTTP access logging as a `tower` middleware.
//!
//! One record per request, emitted after the inner service finishes. The
//! record's level follows the response status; see [`Tier`].

use crate::field::Field;
use crate::level::Level;
use crate::logger::Logger;
use axum::extract::ConnectInfo;
use http::header::{HeaderMap, HeaderName, HOST};
use http::{Request, Response};
use std::fmt;
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;
use tower::{Layer, Service};

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");
const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
const X_REAL_IP: HeaderName = HeaderName::from_static("x-real-ip");

/// Severity tier of a finished request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    ServerError,
    ClientError,
    Redirection,
    Success,
}

impl Tier {
    pub fn classify(status: u16) -> Tier {
        match status {
            500.. => Tier::ServerError,
            400..=499 => Tier::ClientError,
            300..=399 => Tier::Redirection,
            _ => Tier::Success,
        }
    }

    pub fn level(self) -> Level {
        match self {
            Tier::ServerError => Level::Error,
            Tier::ClientError => Level::Warn,
            Tier::Redirection | Tier::Success => Level::Debug,
        }
    }

    /// Message of the access record.
    pub fn message(self) -> &'static str {
        match self {
            Tier::ServerError => "httpserver_server_error",
            Tier::ClientError => "httpserver_client_error",
            Tier::Redirection => "httpserver_redirection",
            Tier::Success => "httpserver_success",
        }
    }
}

/// [`Layer`] that wraps services with [`AccessLogService`].
///
/// Successful requests whose path exactly matches an ignore-list entry
/// (health checks, metrics scrapes) are not logged. Access records carry
/// only request/response fields: no context fields, no registry lookups,
/// and error-tier records are not sent to the error tracker.
#[derive(Clone)]
pub struct AccessLogLayer {
    logger: Arc<Logger>,
    ignore_paths: Arc<[String]>,
}

impl AccessLogLayer {
    pub fn new(logger: Arc<Logger>) -> Self {
        Self {
            logger,
            ignore_paths: Arc::from(Vec::new()),
        }
    }

    pub fn ignore_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let paths: Vec<String> = paths.into_iter().map(Into::into).collect();
        self.ignore_paths = paths.into();
        self
    }
}

impl<S> Layer<S> for AccessLogLayer {
    type Service = AccessLogService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AccessLogService {
            inner,
            logger: Arc::clone(&self.logger),
            ignore_paths: Arc::clone(&self.ignore_paths),
        }
    }
}

#[derive(Clone)]
pub struct AccessLogService<S> {
    inner: S,
    logger: Arc<Logger>,
    ignore_paths: Arc<[String]>,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for AccessLogService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
    S::Future: Send + 'static,
    S::Error: fmt::Display + 'static,
    ResBody: 'static,
{
    type Response = Response<ResBody>;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        let start = Instant::now();
        let meta = RequestMeta::from_request(&req);
        let logger = Arc::clone(&self.logger);
        let ignore_paths = Arc::clone(&self.ignore_paths);
        let response = self.inner.call(req);

        Box::pin(async move {
            let result = response.await;

            let (status, response_id, error) = match &result {
                Ok(res) => (res.status().as_u16(), header_str(res.headers(), &X_REQUEST_ID), None),
                // The framework turns a failed handler into a 500.
                Err(e) => (500, None, Some(e.to_string())),
            };

            let tier = Tier::classify(status);
            if tier == Tier::Success && ignore_paths.iter().any(|p| *p == meta.path) {
                return result;
            }

            let id = meta.request_id.clone().or(response_id).unwrap_or_default();
            let mut fields = vec![
                Field::new("status", status),
                Field::new("latency", start.elapsed().as_secs_f64()),
                Field::str("id", id),
                Field::str("method", meta.method),
                Field::str("uri", meta.uri),
                Field::str("host", meta.host),
                Field::str("remote_ip", meta.remote_ip),
            ];
            if let Some(error) = error {
                fields.push(Field::str("error", error));
            }

            logger.log(tier.level(), tier.message(), fields);
            result
        })
    }
}

/// Request data captured before the request is handed to the inner service.
struct RequestMeta {
    request_id: Option<String>,
    method: String,
    uri: String,
    path: String,
    host: String,
    remote_ip: String,
}

impl RequestMeta {
    fn from_request<B>(req: &Request<B>) -> Self {
        let headers = req.headers();
        let host = header_str(headers, &HOST)
            .or_else(|| req.uri().authority().map(|a| a.to_string()))
            .unwrap_or_default();

        Self {
            request_id: header_str(headers, &X_REQUEST_ID),
            method: req.method().as_str().to_string(),
            uri: req.uri().to_string(),
            path: req.uri().path().to_string(),
            host,
            remote_ip: client_ip(req),
        }
    }
}

/// Client address: first `X-Forwarded-For` hop, then `X-Real-IP`, then the
/// peer address from axum's `ConnectInfo`.
pub fn client_ip<B>(req: &Request<B>) -> String {
    let headers = req.headers();
    if let Some(forwarded) = header_str(headers, &X_FORWARDED_FOR) {
        if let Some(first) = forwarded.split(',').map(str::trim).find(|s| !s.is_empty()) {
            return first.to_string();
        }
    }
    if let Some(real_ip) = header_str(headers, &X_REAL_IP).filter(|s| !s.is_empty()) {
        return real_ip;
    }
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_default()
}

fn header_str(headers: &HeaderMap, name: &HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_tiers() {
        assert_eq!(Tier::classify(200), Tier::Success);
        assert_eq!(Tier::classify(204), Tier::Success);
        assert_eq!(Tier::classify(101), Tier::Success);
        assert_eq!(Tier::classify(301), Tier::Redirection);
        assert_eq!(Tier::classify(404), Tier::ClientError);
        assert_eq!(Tier::classify(499), Tier::ClientError);
        assert_eq!(Tier::classify(500), Tier::ServerError);
        assert_eq!(Tier::classify(503), Tier::ServerError);
    }

    #[test]
    fn tier_levels() {
        assert_eq!(Tier::Success.level(), Level::Debug);
        assert_eq!(Tier::Redirection.level(), Level::Debug);
        assert_eq!(Tier::ClientError.level(), Level::Warn);
        assert_eq!(Tier::ServerError.level(), Level::Error);
    }

    #[test]
    fn client_ip_prefers_forwarded_for() {
        let req = Request::builder()
            .header("x-forwarded-for", " 10.0.0.1, 10.0.0.2")
            .header("x-real-ip", "10.0.0.9")
            .body(())
            .unwrap();
        assert_eq!(client_ip(&req), "10.0.0.1");
    }

    #[test]
    fn client_ip_falls_back_to_real_ip_then_peer() {
        let req = Request::builder()
            .header("x-real-ip", "10.0.0.9")
            .body(())
            .unwrap();
        assert_eq!(client_ip(&req), "10.0.0.9");

        let mut req = Request::builder().body(()).unwrap();
        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([192, 168, 1, 5], 4000))));
        assert_eq!(client_ip(&req), "192.168.1.5");

        let req = Request::builder().body(()).unwrap();
        assert_eq!(client_ip(&req), "");
    }
}
