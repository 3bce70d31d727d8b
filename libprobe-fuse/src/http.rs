use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT},
    Client,
};
use std::time::Duration;

/// Shared HTTP client for RDAP queries. Registries answer with
/// `application/rdap+json` when asked for it explicitly.
pub fn rdap_http_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("application/rdap+json, application/json;q=0.9"),
    );

    Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(5)))
        .default_headers(headers)
        .user_agent(concat!("libprobe-fuse/", env!("CARGO_PKG_VERSION")))
        .pool_idle_timeout(Duration::from_secs(90))
        .tcp_nodelay(true)
        .use_rustls_tls()
        .build()
}
