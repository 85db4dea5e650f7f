use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use basic_urlscan::commands;
use basic_urlscan::config::ClientConfig;

/// urlscan - command line client for the urlscan.io API
///
/// Submit URLs for scanning and fetch results, screenshots and DOM
/// snapshots of finished scans.
///
/// If the URLSCAN_API_KEY environment variable is set, it will be sent as
/// the API-Key header. Anonymous use works for public data but urlscan.io
/// limits it.
///
/// Examples:
///   urlscan scan https://example.com    # Submit a scan
///   urlscan result <uuid>               # Fetch its result once finished
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// API key for authenticated access (also via URLSCAN_API_KEY)
    #[arg(
        long,
        env = "URLSCAN_API_KEY",
        value_name = "KEY",
        hide_env_values = true,
        global = true
    )]
    api_key: Option<String>,

    /// User-Agent header identifying your application
    #[arg(long, value_name = "AGENT", global = true)]
    user_agent: Option<String>,

    /// Total number of attempts per request
    #[arg(long, value_name = "N", global = true)]
    retries: Option<u32>,

    /// Base factor for the exponential delay between attempts, in seconds
    #[arg(long, value_name = "SECONDS", global = true)]
    backoff: Option<f64>,

    /// Service root URL (defaults to https://urlscan.io)
    #[arg(long = "api-url", value_name = "URL", global = true)]
    api_url: Option<String>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Show quota usage for the configured API key
    Quotas,

    /// Fetch the result of a finished scan
    Result {
        /// The scan UUID
        #[arg(value_name = "UUID")]
        uuid: String,
    },

    /// Search finished scans
    Search {
        /// Query term, e.g. "page.domain:example.com"
        #[arg(long, short = 'q', value_name = "QUERY")]
        query: String,

        /// Number of results to return
        #[arg(long, value_name = "N")]
        size: Option<u32>,

        /// Resume position, the sort value of the last result of the
        /// previous page
        #[arg(long, value_name = "POSITION")]
        search_after: Option<String>,
    },

    /// Submit a URL for scanning
    Scan {
        /// The URL to scan
        #[arg(value_name = "URL")]
        url: String,

        /// public, private or unlisted (account default when omitted)
        #[arg(long, value_name = "VISIBILITY")]
        visibility: Option<String>,

        /// Tag to attach to the scan (repeatable)
        #[arg(long = "tag", value_name = "TAG")]
        tags: Vec<String>,

        /// Country to scan from
        #[arg(long, value_name = "COUNTRY")]
        country: Option<String>,
    },

    /// Download the screenshot of a finished scan
    Screenshot {
        /// The scan UUID
        #[arg(value_name = "UUID")]
        uuid: String,

        /// File to write the PNG to
        #[arg(long, short = 'o', value_name = "FILE")]
        output: PathBuf,
    },

    /// Fetch the captured DOM of a finished scan
    Dom {
        /// The scan UUID
        #[arg(value_name = "UUID")]
        uuid: String,
    },

    /// Fetch an archived HTTP response by its SHA-256 hash
    Response {
        #[arg(value_name = "SHA256")]
        sha256: String,
    },

    /// List countries scans can be launched from
    Countries,
}

impl Cli {
    fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig {
            api_key: self.api_key.clone(),
            user_agent: self.user_agent.clone(),
            ..ClientConfig::default()
        };
        if let Some(retries) = self.retries {
            config.retries = retries;
        }
        if let Some(backoff) = self.backoff {
            config.backoff = backoff;
        }
        if let Some(api_url) = &self.api_url {
            config.root_url = api_url.clone();
        }
        config
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let config = cli.client_config();

    match cli.command {
        Commands::Quotas => commands::quotas(config),
        Commands::Result { uuid } => commands::result(config, &uuid),
        Commands::Search {
            query,
            size,
            search_after,
        } => commands::search(config, &query, size, search_after),
        Commands::Scan {
            url,
            visibility,
            tags,
            country,
        } => commands::scan(config, &url, visibility, tags, country),
        Commands::Screenshot { uuid, output } => commands::screenshot(config, &uuid, &output),
        Commands::Dom { uuid } => commands::dom(config, &uuid),
        Commands::Response { sha256 } => commands::response(config, &sha256),
        Commands::Countries => commands::countries(config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_result_parsing() {
        let cli = Cli::try_parse_from(["urlscan", "result", "some-uuid"]).unwrap();
        match cli.command {
            Commands::Result { uuid } => assert_eq!(uuid, "some-uuid"),
            _ => panic!("Expected Result command"),
        }
    }

    #[test]
    fn test_cli_scan_parsing() {
        let cli = Cli::try_parse_from([
            "urlscan",
            "scan",
            "https://example.com",
            "--visibility",
            "unlisted",
            "--tag",
            "a",
            "--tag",
            "b",
        ])
        .unwrap();
        match cli.command {
            Commands::Scan {
                url,
                visibility,
                tags,
                country,
            } => {
                assert_eq!(url, "https://example.com");
                assert_eq!(visibility.as_deref(), Some("unlisted"));
                assert_eq!(tags, vec!["a", "b"]);
                assert_eq!(country, None);
            }
            _ => panic!("Expected Scan command"),
        }
    }

    #[test]
    fn test_cli_search_requires_query() {
        let result = Cli::try_parse_from(["urlscan", "search"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from([
            "urlscan",
            "quotas",
            "--api-key",
            "secret",
            "--retries",
            "7",
            "--backoff",
            "0.5",
            "--api-url",
            "http://127.0.0.1:1",
        ])
        .unwrap();
        assert_eq!(cli.api_key.as_deref(), Some("secret"));
        assert_eq!(cli.retries, Some(7));
        assert_eq!(cli.backoff, Some(0.5));
    }

    #[test]
    fn test_client_config_overrides_defaults_only_when_given() {
        let cli = Cli::try_parse_from(["urlscan", "quotas", "--retries", "7"]).unwrap();
        let config = cli.client_config();
        assert_eq!(config.retries, 7);
        assert_eq!(config.backoff, ClientConfig::default().backoff);
        assert_eq!(config.root_url, "https://urlscan.io");
    }

    #[test]
    fn test_cli_no_subcommand_fails() {
        let result = Cli::try_parse_from(["urlscan", "--retries", "2"]);
        assert!(result.is_err());
    }
}
