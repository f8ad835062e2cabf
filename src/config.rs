//! Configuration for the signup gateway
//!
//! CLI arguments and environment variable handling using clap.

use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;
use url::Url;

use crate::signing::{display_offset, Locale, SessionRequestBuilder, Translator};
use crate::stamp::SessionClientConfig;
use crate::types::{Result, SignupError};

/// Longest session lifetime; keeps `now + ttl` representable
const MAX_SESSION_TTL_SECONDS: u64 = 365 * 24 * 3600;

/// Stamp signup - plan application signed with a My Number card
#[derive(Parser, Debug, Clone)]
#[command(name = "stamp-signup")]
#[command(about = "Plan application gateway backed by a remote JPKI signing service")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// Base URL of the remote signing session service
    #[arg(long, env = "STAMP_API_URL", default_value = "https://verify.mock.p8n.app")]
    pub stamp_api_url: String,

    /// Bearer token for the signing service (required in production)
    #[arg(long, env = "POCKETSIGN_TOKEN")]
    pub pocketsign_token: Option<String>,

    /// Public origin of this gateway (e.g. "https://signup.example.com")
    /// Used to build the callback URL; falls back to the request Host header
    #[arg(long, env = "PUBLIC_URL")]
    pub public_url: Option<String>,

    /// Ask the signing service to append session_id to the callback URL
    #[arg(long, env = "CALLBACK_WITH_SESSION_ID", default_value = "false")]
    pub callback_with_session_id: bool,

    /// Ask mobile users to return to the original browser by hand
    #[arg(long, env = "REQUIRE_MANUAL_RETURN", default_value = "true", action = clap::ArgAction::Set)]
    pub require_manual_return: bool,

    /// Session lifetime in seconds
    #[arg(long, env = "SESSION_TTL_SECONDS", default_value = "3600")]
    pub session_ttl_seconds: u64,

    /// Language for user-facing messages (ja, en)
    #[arg(long, env = "LOCALE", default_value = "ja")]
    pub locale: String,

    /// Offset from UTC, in minutes, used to display timestamps (540 = JST)
    #[arg(long, env = "DISPLAY_UTC_OFFSET_MINUTES", default_value = "540", allow_hyphen_values = true)]
    pub display_utc_offset_minutes: i32,

    /// Mark the nonce and session cookies Secure
    #[arg(long, env = "COOKIE_SECURE", default_value = "false")]
    pub cookie_secure: bool,

    /// Request timeout in milliseconds for calls to the signing service
    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value = "30000")]
    pub request_timeout_ms: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Enable development mode (token optional)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([0, 0, 0, 0], 8080)),
            stamp_api_url: "https://verify.mock.p8n.app".to_string(),
            pocketsign_token: None,
            public_url: None,
            callback_with_session_id: false,
            require_manual_return: true,
            session_ttl_seconds: 3600,
            locale: "ja".to_string(),
            display_utc_offset_minutes: 540,
            cookie_secure: false,
            request_timeout_ms: 30000,
            log_level: "info".to_string(),
            dev_mode: false,
        }
    }
}

impl Args {
    /// Parsed locale, Japanese when unparseable
    pub fn locale(&self) -> Locale {
        self.locale.parse().unwrap_or_default()
    }

    /// Message formatter for the configured locale and display offset
    pub fn translator(&self) -> Translator {
        match display_offset(self.display_utc_offset_minutes) {
            Some(offset) => Translator::new(self.locale(), offset),
            None => Translator::default(),
        }
    }

    /// Session request builder with the configured TTL and callback flags
    pub fn session_builder(&self) -> Result<SessionRequestBuilder> {
        let ttl = Some(self.session_ttl_seconds)
            .filter(|secs| *secs <= MAX_SESSION_TTL_SECONDS)
            .and_then(|secs| i64::try_from(secs).ok())
            .and_then(chrono::Duration::try_seconds)
            .ok_or_else(|| {
                SignupError::Config(format!(
                    "SESSION_TTL_SECONDS out of range: {}",
                    self.session_ttl_seconds
                ))
            })?;
        Ok(SessionRequestBuilder::new(self.translator())
            .with_ttl(ttl)
            .with_manual_return(self.require_manual_return)
            .with_callback_session_id(self.callback_with_session_id))
    }

    /// Settings for the signing service client
    pub fn client_config(&self) -> SessionClientConfig {
        SessionClientConfig {
            base_url: self.stamp_api_url.clone(),
            token: self.pocketsign_token.clone().filter(|t| !t.is_empty()),
            request_timeout: Duration::from_millis(self.request_timeout_ms),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !self.dev_mode
            && self
                .pocketsign_token
                .as_deref()
                .map_or(true, |t| t.trim().is_empty())
        {
            return Err(config_error("POCKETSIGN_TOKEN is required in production mode"));
        }

        if self.session_ttl_seconds == 0 {
            return Err(config_error("SESSION_TTL_SECONDS must be greater than zero"));
        }

        if self.session_ttl_seconds > MAX_SESSION_TTL_SECONDS {
            return Err(config_error("SESSION_TTL_SECONDS must be at most one year"));
        }

        check_http_url("STAMP_API_URL", &self.stamp_api_url)?;
        if let Some(public_url) = &self.public_url {
            check_http_url("PUBLIC_URL", public_url)?;
        }

        self.locale
            .parse::<Locale>()
            .map_err(|e| SignupError::Config(format!("LOCALE: {}", e)))?;

        if display_offset(self.display_utc_offset_minutes).is_none() {
            return Err(config_error("DISPLAY_UTC_OFFSET_MINUTES must be within +/-24 hours"));
        }

        Ok(())
    }
}

fn config_error(message: &str) -> SignupError {
    SignupError::Config(message.to_string())
}

fn check_http_url(name: &str, value: &str) -> Result<()> {
    let url = Url::parse(value)
        .map_err(|e| SignupError::Config(format!("{} is not a valid URL: {}", name, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(SignupError::Config(format!(
            "{} must use http or https, got {}",
            name, other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dev_args() -> Args {
        Args {
            dev_mode: true,
            ..Args::default()
        }
    }

    #[test]
    fn test_parse_defaults() {
        let args = Args::parse_from(["stamp-signup"]);
        assert_eq!(args.listen.port(), 8080);
        assert_eq!(args.stamp_api_url, "https://verify.mock.p8n.app");
        assert!(args.require_manual_return);
        assert!(!args.callback_with_session_id);
        assert_eq!(args.session_ttl_seconds, 3600);
        assert_eq!(args.locale(), Locale::Ja);
        assert!(!args.dev_mode);
        assert!(args.pocketsign_token.is_none());
    }

    #[test]
    fn test_default_matches_cli_defaults() {
        let parsed = Args::parse_from(["stamp-signup"]);
        let default = Args::default();
        assert_eq!(default.dev_mode, parsed.dev_mode);
        assert_eq!(default.listen, parsed.listen);
        assert_eq!(default.session_ttl_seconds, parsed.session_ttl_seconds);
        assert_eq!(default.require_manual_return, parsed.require_manual_return);

        // Production defaults need a token before they validate
        let err = default.validate().unwrap_err();
        assert!(matches!(err, SignupError::Config(_)));
        assert!(err.to_string().contains("POCKETSIGN_TOKEN"));
    }

    #[test]
    fn test_parse_overrides() {
        let args = Args::parse_from([
            "stamp-signup",
            "--require-manual-return",
            "false",
            "--callback-with-session-id",
            "--locale",
            "en",
            "--display-utc-offset-minutes",
            "-300",
        ]);
        assert!(!args.require_manual_return);
        assert!(args.callback_with_session_id);
        assert_eq!(args.locale(), Locale::En);
        assert_eq!(args.display_utc_offset_minutes, -300);
    }

    #[test]
    fn test_validate_requires_token_outside_dev_mode() {
        let mut args = Args::default();
        let err = args.validate().unwrap_err();
        assert!(matches!(err, SignupError::Config(_)));
        assert!(err.to_string().contains("POCKETSIGN_TOKEN"));

        args.pocketsign_token = Some("  ".to_string());
        assert!(args.validate().is_err());

        args.pocketsign_token = Some("secret".to_string());
        assert!(args.validate().is_ok());

        let dev = Args {
            dev_mode: true,
            ..Args::default()
        };
        assert!(dev.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let zero_ttl = Args {
            session_ttl_seconds: 0,
            ..dev_args()
        };
        assert!(zero_ttl.validate().is_err());

        let bad_url = Args {
            stamp_api_url: "not a url".to_string(),
            ..dev_args()
        };
        assert!(bad_url.validate().unwrap_err().to_string().contains("STAMP_API_URL"));

        let ws_url = Args {
            public_url: Some("ws://example.com".to_string()),
            ..dev_args()
        };
        assert!(ws_url.validate().unwrap_err().to_string().contains("PUBLIC_URL"));

        let bad_locale = Args {
            locale: "fr".to_string(),
            ..dev_args()
        };
        assert!(bad_locale.validate().unwrap_err().to_string().contains("LOCALE"));

        let bad_offset = Args {
            display_utc_offset_minutes: 24 * 60,
            ..dev_args()
        };
        assert!(bad_offset.validate().is_err());

        let huge_ttl = Args {
            session_ttl_seconds: u64::MAX,
            ..dev_args()
        };
        assert!(huge_ttl.validate().is_err());
    }

    #[test]
    fn test_session_builder_rejects_unrepresentable_ttl() {
        let args = Args {
            session_ttl_seconds: u64::MAX,
            ..dev_args()
        };
        let err = args.session_builder().unwrap_err();
        assert!(matches!(err, SignupError::Config(_)));
        assert!(err.to_string().contains("SESSION_TTL_SECONDS"));

        let past_chrono_limit = Args {
            session_ttl_seconds: i64::MAX as u64,
            ..dev_args()
        };
        assert!(past_chrono_limit.session_builder().is_err());

        let over_a_year = Args {
            session_ttl_seconds: MAX_SESSION_TTL_SECONDS + 1,
            ..dev_args()
        };
        assert!(over_a_year.session_builder().is_err());

        assert!(dev_args().session_builder().is_ok());
    }

    #[test]
    fn test_client_config_drops_empty_token() {
        let args = Args {
            pocketsign_token: Some(String::new()),
            request_timeout_ms: 1500,
            ..Args::default()
        };
        let config = args.client_config();
        assert_eq!(config.token, None);
        assert_eq!(config.request_timeout, Duration::from_millis(1500));
    }
}
