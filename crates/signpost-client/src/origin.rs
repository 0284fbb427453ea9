//! Origin resolution.

use std::env;

/// Where a call executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionSide {
    /// Inside a page, relative to the page origin.
    Client,
    /// Inside the server process.
    Server,
}

impl Default for ExecutionSide {
    fn default() -> Self {
        if cfg!(target_arch = "wasm32") {
            Self::Client
        } else {
            Self::Server
        }
    }
}

/// The origin a server-side call reaches its own API on.
///
/// `https://$VERCEL_URL` when that is set, otherwise localhost on `port`,
/// then `$PORT`, then 3000.
pub fn server_side_origin(port: Option<u16>) -> String {
    server_side_origin_from(
        env::var("VERCEL_URL").ok().as_deref(),
        port,
        env::var("PORT").ok().as_deref(),
    )
}

fn server_side_origin_from(vercel_url: Option<&str>, port: Option<u16>, port_env: Option<&str>) -> String {
    if let Some(host) = vercel_url.filter(|h| !h.is_empty()) {
        return format!("https://{host}");
    }
    let port = port
        .map(|p| p.to_string())
        .or_else(|| port_env.filter(|p| !p.is_empty()).map(str::to_string))
        .unwrap_or_else(|| "3000".to_string());
    format!("http://localhost:{port}")
}

/// Picks the origin for one call.
///
/// Order: per-call override, configured origin, then the side's ambient
/// origin.
pub(crate) fn resolve_origin<'a>(
    per_call: Option<&'a str>,
    configured: Option<&'a str>,
    side: ExecutionSide,
    server_origin: Option<&'a str>,
    page_origin: Option<&'a str>,
) -> Option<&'a str> {
    per_call.or(configured).or(match side {
        ExecutionSide::Server => server_origin,
        ExecutionSide::Client => page_origin,
    })
}
