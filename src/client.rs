//! The urlscan.io client: authenticated request construction, a shared
//! retry policy, and one method per API action.
//!
//! Method names are the HTTP verb plus the urlscan.io action, so
//! [`Urlscan::get_result`] fetches a scan result and [`Urlscan::post_scan`]
//! submits one. Every method returns the raw transport response on the Ok
//! arm; interpreting status and body is the caller's business. The Err arm
//! means the request could not be completed at all (transport fault, retry
//! budget spent, or a payload rejected before sending) and deliberately
//! carries no further structure.
//!
//! See <https://urlscan.io/docs/api/> for the API itself.

use std::collections::HashMap;

use anyhow::Result;
use log::{debug, warn};
use reqwest::Method;
use reqwest::blocking::{Client, Response};
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde_json::{Map, Value};

use crate::config::{ClientConfig, DEFAULT_USER_AGENT};
use crate::retry::{RetryPolicy, with_retry};

/// Visibilities urlscan.io accepts. Setting `private` or `unlisted` needs a
/// paying account, but they are valid values.
pub const VISIBILITIES: [&str; 3] = ["public", "private", "unlisted"];

/// A scan payload or search query rejected before any request was sent.
#[derive(Debug, PartialEq)]
pub enum InvalidPayload {
    /// Scan submissions must say which URL to scan.
    MissingUrl,
    /// Searches must carry a `q` term.
    MissingQuery,
    /// A visibility outside [`VISIBILITIES`].
    UnknownVisibility(String),
}

impl std::fmt::Display for InvalidPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvalidPayload::MissingUrl => {
                write!(f, "scan payload must contain a url to scan")
            }
            InvalidPayload::MissingQuery => {
                write!(f, "search params must contain a q term to search for")
            }
            InvalidPayload::UnknownVisibility(got) => {
                write!(f, "visibility must be one of {:?}, got {:?}", VISIBILITIES, got)
            }
        }
    }
}

impl std::error::Error for InvalidPayload {}

/// Blocking client for the urlscan.io API.
///
/// Immutable once built. Clones share the underlying connection pool, and
/// one instance can serve several threads making independent calls; no
/// ordering is promised between them. Requests run under the transport's
/// stock timeout (30 seconds for blocking reqwest), which is deliberately
/// not configurable here.
#[derive(Clone)]
pub struct Urlscan {
    http: Client,
    policy: RetryPolicy,
    root_url: String,
}

impl Urlscan {
    /// Builds a client from `config`. `ClientConfig::default()` works, but
    /// an API key makes the client considerably more useful.
    pub fn new(config: ClientConfig) -> Result<Self> {
        if config.api_key.is_none() {
            warn!("no API key configured; urlscan.io limits what anonymous callers can do");
        }
        let user_agent = config.user_agent.clone().unwrap_or_else(|| {
            warn!(
                "no user agent configured, sending the stock {}; set one unique to your application",
                DEFAULT_USER_AGENT
            );
            DEFAULT_USER_AGENT.to_string()
        });

        // GET requests carry no body, but the upstream service does not mind
        // the JSON content type on them, so it goes on everything.
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(key) = &config.api_key {
            let mut value = HeaderValue::from_str(key)?;
            value.set_sensitive(true);
            headers.insert("api-key", value);
        }

        let http = Client::builder()
            .user_agent(user_agent)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            policy: config.retry_policy(),
            root_url: config.root_url,
        })
    }

    /// Builds and sends one request with the retry policy applied: `params`
    /// become the query string, `payload` the JSON body. The fixed
    /// operations below all come through here, and extensions covering
    /// further endpoints can call it directly instead of duplicating the
    /// machinery.
    ///
    /// Statuses 429, 500, 502, 503 and 504 are retried until the attempt
    /// budget is spent; any other status is returned as-is for the caller
    /// to judge.
    #[tracing::instrument(skip(self, params, payload))]
    pub fn execute(
        &self,
        method: Method,
        url: &str,
        params: Option<&HashMap<String, String>>,
        payload: Option<&Map<String, Value>>,
    ) -> Result<Response> {
        debug!("{} {}", method, url);

        with_retry(&self.policy, url, || {
            let mut request = self.http.request(method.clone(), url);
            if let Some(params) = params {
                request = request.query(params);
            }
            if let Some(payload) = payload {
                request = request.json(payload);
            }
            request.send()
        })
    }

    /// Quota usage for the user and team (if any) behind the configured
    /// API key.
    #[tracing::instrument(skip(self))]
    pub fn get_quotas(&self) -> Result<Response> {
        self.execute(
            Method::GET,
            &format!("{}/user/quotas/", self.root_url),
            None,
            None,
        )
    }

    /// Result of a finished scan. `result_uuid` is interpolated as given;
    /// its format is not checked here.
    #[tracing::instrument(skip(self))]
    pub fn get_result(&self, result_uuid: &str) -> Result<Response> {
        self.execute(
            Method::GET,
            &format!("{}/api/v1/result/{}", self.root_url, result_uuid),
            None,
            None,
        )
    }

    /// Page screenshot of a finished scan. The body is PNG, returned
    /// uninterpreted.
    pub fn get_screenshot(&self, result_uuid: &str) -> Result<Response> {
        self.execute(
            Method::GET,
            &format!("{}/screenshots/{}", self.root_url, result_uuid),
            None,
            None,
        )
    }

    /// Captured DOM of a finished scan.
    pub fn get_dom(&self, result_uuid: &str) -> Result<Response> {
        self.execute(
            Method::GET,
            &format!("{}/dom/{}", self.root_url, result_uuid),
            None,
            None,
        )
    }

    /// An HTTP response archived during a scan, addressed by its SHA-256
    /// hash.
    pub fn get_response(&self, response_sha256: &str) -> Result<Response> {
        self.execute(
            Method::GET,
            &format!("{}/responses/{}", self.root_url, response_sha256),
            None,
            None,
        )
    }

    /// Countries scans can be launched from.
    pub fn get_scan_countries(&self) -> Result<Response> {
        self.execute(
            Method::GET,
            &format!("{}/api/v1/availableCountries/", self.root_url),
            None,
            None,
        )
    }

    /// Searches finished scans. `params` must contain the `q` term; `size`,
    /// `search_after` and any further fields pass through untouched.
    ///
    /// See <https://urlscan.io/docs/search/> for the query syntax.
    #[tracing::instrument(skip(self, params))]
    pub fn get_search(&self, params: &HashMap<String, String>) -> Result<Response> {
        if !params.contains_key("q") {
            return Err(InvalidPayload::MissingQuery.into());
        }

        self.execute(
            Method::GET,
            &format!("{}/api/v1/search/", self.root_url),
            Some(params),
            None,
        )
    }

    /// Submits a URL for scanning. The payload must contain `url`, and a
    /// `visibility`, when present, must be one urlscan.io accepts.
    /// Everything else (`tags`, `country`, `referer`, `customAgent`, ...)
    /// passes through untouched and falls back to the account defaults.
    #[tracing::instrument(skip(self, payload))]
    pub fn post_scan(&self, payload: &Map<String, Value>) -> Result<Response> {
        if !payload.contains_key("url") {
            return Err(InvalidPayload::MissingUrl.into());
        }
        match payload.get("visibility") {
            None | Some(Value::Null) => {}
            Some(Value::String(v)) if VISIBILITIES.contains(&v.as_str()) => {}
            Some(Value::String(v)) => {
                return Err(InvalidPayload::UnknownVisibility(v.clone()).into());
            }
            Some(other) => {
                return Err(InvalidPayload::UnknownVisibility(other.to_string()).into());
            }
        }

        self.execute(
            Method::POST,
            &format!("{}/api/v1/scan/", self.root_url),
            None,
            Some(payload),
        )
    }
}
