//! Handlers behind the `urlscan` binary: one per subcommand, each building
//! a client from the shared flags, making a single API call and printing
//! what came back.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use log::debug;
use reqwest::blocking::Response;
use serde_json::{Map, Value, json};

use crate::client::Urlscan;
use crate::config::ClientConfig;

/// Reads the whole body, bailing with the backend's own words when the
/// status is outside 2xx.
fn read_body(response: Response) -> Result<Vec<u8>> {
    let status = response.status();
    let body = response
        .bytes()
        .context("failed to read the response body")?;
    if !status.is_success() {
        anyhow::bail!(
            "urlscan.io answered {}: {}",
            status,
            String::from_utf8_lossy(&body).trim()
        );
    }
    Ok(body.to_vec())
}

/// Pretty-prints JSON bodies; anything else (the DOM endpoint serves HTML)
/// is printed as it came.
fn print_body(response: Response) -> Result<()> {
    let body = read_body(response)?;
    match serde_json::from_slice::<Value>(&body) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", String::from_utf8_lossy(&body)),
    }
    Ok(())
}

#[tracing::instrument(skip(config))]
pub fn quotas(config: ClientConfig) -> Result<()> {
    let client = Urlscan::new(config)?;
    print_body(client.get_quotas()?)
}

#[tracing::instrument(skip(config))]
pub fn result(config: ClientConfig, uuid: &str) -> Result<()> {
    let client = Urlscan::new(config)?;
    print_body(client.get_result(uuid)?)
}

#[tracing::instrument(skip(config))]
pub fn search(
    config: ClientConfig,
    query: &str,
    size: Option<u32>,
    search_after: Option<String>,
) -> Result<()> {
    let mut params = HashMap::new();
    params.insert("q".to_string(), query.to_string());
    if let Some(size) = size {
        params.insert("size".to_string(), size.to_string());
    }
    if let Some(position) = search_after {
        params.insert("search_after".to_string(), position);
    }

    let client = Urlscan::new(config)?;
    print_body(client.get_search(&params)?)
}

#[tracing::instrument(skip(config))]
pub fn scan(
    config: ClientConfig,
    url: &str,
    visibility: Option<String>,
    tags: Vec<String>,
    country: Option<String>,
) -> Result<()> {
    let mut payload = Map::new();
    payload.insert("url".to_string(), json!(url));
    if let Some(visibility) = visibility {
        payload.insert("visibility".to_string(), json!(visibility));
    }
    if !tags.is_empty() {
        payload.insert("tags".to_string(), Value::from(tags));
    }
    if let Some(country) = country {
        payload.insert("country".to_string(), json!(country));
    }

    let client = Urlscan::new(config)?;
    print_body(client.post_scan(&payload)?)
}

#[tracing::instrument(skip(config, output))]
pub fn screenshot(config: ClientConfig, uuid: &str, output: &Path) -> Result<()> {
    let client = Urlscan::new(config)?;
    let body = read_body(client.get_screenshot(uuid)?)?;

    debug!("writing {} bytes to {:?}", body.len(), output);
    std::fs::write(output, &body)
        .with_context(|| format!("failed to write screenshot to {:?}", output))?;
    println!("Wrote {} bytes to {:?}", body.len(), output);
    Ok(())
}

#[tracing::instrument(skip(config))]
pub fn dom(config: ClientConfig, uuid: &str) -> Result<()> {
    let client = Urlscan::new(config)?;
    print_body(client.get_dom(uuid)?)
}

#[tracing::instrument(skip(config))]
pub fn response(config: ClientConfig, sha256: &str) -> Result<()> {
    let client = Urlscan::new(config)?;
    print_body(client.get_response(sha256)?)
}

#[tracing::instrument(skip(config))]
pub fn countries(config: ClientConfig) -> Result<()> {
    let client = Urlscan::new(config)?;
    print_body(client.get_scan_countries()?)
}
