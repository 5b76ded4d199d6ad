/// Strips the scheme from an endpoint.
///
/// Inputs without `://` are returned untouched, so bare `host:port` strings
/// pass through.
pub fn host_of(endpoint: &str) -> &str {
    match endpoint.split_once("://") {
        Some((_, rest)) => rest.split('/').next().unwrap_or(rest),
        None => endpoint,
    }
}

pub(crate) fn url(
    scheme: &str,
    host: &str,
    port: u16,
) -> String {
    format!("{scheme}://{host}:{port}")
}
