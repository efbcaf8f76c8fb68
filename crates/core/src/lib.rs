pub mod controller;
pub mod domain;
pub mod metrics;
pub mod source;
pub mod view;

pub mod config {
    use anyhow::Context;

    pub const DEFAULT_API_BASE: &str = "https://priceoptimize-api.onrender.com/api";
    pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub api_base: Option<String>,
        pub http_timeout_secs: u64,
        pub sentry_dsn: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            let http_timeout_secs = match std::env::var("PRICEOPT_HTTP_TIMEOUT_SECS") {
                Ok(s) => s
                    .trim()
                    .parse::<u64>()
                    .with_context(|| format!("PRICEOPT_HTTP_TIMEOUT_SECS is not a number: {s}"))?,
                Err(_) => DEFAULT_HTTP_TIMEOUT_SECS,
            };

            Ok(Self {
                api_base: Some(
                    std::env::var("PRICEOPT_API_BASE")
                        .unwrap_or_else(|_| DEFAULT_API_BASE.to_string()),
                ),
                http_timeout_secs,
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
            })
        }

        pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
            self.api_base = Some(base.into());
            self
        }

        pub fn require_api_base(&self) -> anyhow::Result<&str> {
            self.api_base
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .context("PRICEOPT_API_BASE is required")
        }
    }

    impl Default for Settings {
        fn default() -> Self {
            Self {
                api_base: Some(DEFAULT_API_BASE.to_string()),
                http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
                sentry_dsn: None,
            }
        }
    }

}
