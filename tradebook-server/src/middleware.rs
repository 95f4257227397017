//! Request-level middleware: call logging and the HTTPS redirect.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::{HeaderMap, Method, StatusCode, header};
use axum::middleware::Next;
use axum::response::Response;
use tracing::info;

use crate::config::Config;
use crate::helpers::found;
use crate::pages::STATIC_ROOT;

/// Header handling settings, fixed at startup.
#[derive(Debug, Clone, Default)]
pub struct HttpPolicy {
    pub filter_log: bool,
    pub forwarded: bool,
    pub x_forwarded: bool,
    /// Target host for redirecting plain HTTP, when enabled.
    pub redirect_host: Option<String>,
}

impl HttpPolicy {
    pub fn from_config(config: &Config) -> Self {
        if config.forwarded_enabled {
            info!("Enabling Forwarded header support");
        } else {
            info!("Not enabling Forwarded header support");
        }
        if config.xforwarded_enabled {
            info!("Enabling X-Forwarded header support");
        } else {
            info!("Not enabling X-Forwarded header support");
        }

        let hostname = config.redirect_hostname.trim();
        let redirect_host = if config.production && !hostname.is_empty() {
            info!("Installing HTTPS redirect using: {hostname}");
            Some(hostname.to_string())
        } else {
            info!("Not installing HTTPS redirect");
            None
        };

        Self {
            filter_log: config.filter_log,
            forwarded: config.forwarded_enabled,
            x_forwarded: config.xforwarded_enabled,
            redirect_host,
        }
    }

    pub fn should_log(&self, path: &str) -> bool {
        !self.filter_log || (path.starts_with('/') && !path.starts_with(&format!("{STATIC_ROOT}/")))
    }

    /// Best guess at the client address, honoring proxy headers only when
    /// they are trusted.
    pub fn remote_host(&self, headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
        if self.x_forwarded {
            let forwarded_for = headers
                .get("x-forwarded-for")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.split(',').next())
                .map(str::trim)
                .filter(|v| !v.is_empty());
            if let Some(host) = forwarded_for {
                return host.to_string();
            }
        }

        if self.forwarded {
            let forwarded_for = headers
                .get(header::FORWARDED)
                .and_then(|v| v.to_str().ok())
                .and_then(forwarded_for);
            if let Some(host) = forwarded_for {
                return host;
            }
        }

        peer.map_or_else(|| "unknown".to_string(), |addr| addr.ip().to_string())
    }
}

/// `for=` of the first element of a `Forwarded` header (RFC 7239).
fn forwarded_for(value: &str) -> Option<String> {
    let first = value.split(',').next()?;
    first.split(';').find_map(|pair| {
        let (key, val) = pair.trim().split_once('=')?;
        key.eq_ignore_ascii_case("for")
            .then(|| val.trim_matches('"').to_string())
            .filter(|v| !v.is_empty())
    })
}

/// One log line per call.
pub fn format_call(
    status: StatusCode,
    method: &Method,
    path: &str,
    location: Option<&str>,
    remote: &str,
) -> String {
    if status == StatusCode::FOUND {
        format!(
            "Redirect: {method} - {path} -> {} - {remote}",
            location.unwrap_or("")
        )
    } else {
        format!("{status}: {method} - {path} - {remote}")
    }
}

pub async fn log_calls(
    State(policy): State<Arc<HttpPolicy>>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    if !policy.should_log(&path) {
        return next.run(request).await;
    }

    let method = request.method().clone();
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let remote = policy.remote_host(request.headers(), peer);

    let response = next.run(request).await;

    let location = response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok());
    info!(
        "{}",
        format_call(response.status(), &method, &path, location, &remote)
    );
    response
}

/// Send requests that reached the router over plain HTTP to the HTTPS host.
pub async fn https_redirect(
    State(policy): State<Arc<HttpPolicy>>,
    request: Request,
    next: Next,
) -> Response {
    let Some(host) = policy.redirect_host.as_deref() else {
        return next.run(request).await;
    };

    let plain_http = request
        .headers()
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|proto| !proto.eq_ignore_ascii_case("https"));
    if !plain_http {
        return next.run(request).await;
    }

    let path = request
        .uri()
        .path_and_query()
        .map_or("/", |pq| pq.as_str());
    found(format!("https://{host}{path}"))
}
