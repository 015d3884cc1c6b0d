//! HTTP access for remote indexes and archives.

mod client;

use anyhow::Result;
use log::debug;
use reqwest::{
    Client,
    header::{AUTHORIZATION, HeaderMap, HeaderValue},
};

pub use client::HttpClient;

/// Build an HTTP client with optional bearer token
pub fn build_http_client(token: Option<&str>) -> Result<HttpClient> {
    let mut headers = HeaderMap::new();

    if let Some(token) = token {
        let mut auth_value = HeaderValue::from_str(&format!("Bearer {}", token))?;
        auth_value.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth_value);
        debug!("HTTP client configured with authentication");
    }

    let client = Client::builder()
        .user_agent(concat!("pkgsource/", env!("PKGSOURCE_VERSION")))
        .default_headers(headers)
        .build()?;

    Ok(HttpClient::new(client))
}
