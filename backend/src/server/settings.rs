//! Process settings loaded via OrthoConfig.
//!
//! Every field can be given as `--flag`, as `MINIPROGRAM_<FIELD>` in the
//! environment, or in a config file. Numeric fields carry declared defaults;
//! unset optional fields fall back in their accessors.

use std::net::SocketAddr;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use zeroize::Zeroizing;

use backend::domain::DEFAULT_CARD_PAGE_PATH;
use backend::outbound::wechat::{DEFAULT_API_BASE_URL, WeChatCredentials};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

/// Startup failures caused by incomplete or invalid settings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("missing required setting `{0}`")]
    Missing(&'static str),
    #[error("invalid bind address `{value}`: {message}")]
    BindAddr { value: String, message: String },
}

/// Settings for the card backend.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "MINIPROGRAM")]
pub struct AppSettings {
    /// Mini-program app id.
    pub appid: Option<String>,
    /// Mini-program app secret.
    pub secret: Option<String>,
    /// Listen address, `0.0.0.0:8080` by default.
    pub bind_addr: Option<String>,
    /// PostgreSQL URL; cards stay in memory when unset.
    pub database_url: Option<String>,
    /// WeChat API origin override.
    pub api_base_url: Option<String>,
    /// Mini-program page opened by card QR codes.
    pub card_page_path: Option<String>,
    /// Seconds between access token refreshes.
    #[ortho_config(default = 3_600)]
    pub token_refresh_secs: u64,
    /// Session lifetime, 30 days by default; `0` keeps sessions until restart.
    #[ortho_config(default = 2_592_000)]
    pub session_ttl_secs: u64,
    /// Interval between expired-session sweeps; `0` disables sweeping.
    #[ortho_config(default = 600)]
    pub session_sweep_secs: u64,
    #[ortho_config(default = 10)]
    pub http_timeout_secs: u64,
    #[ortho_config(default = 10)]
    pub db_max_connections: u32,
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

impl AppSettings {
    /// App credentials; both must be present.
    pub fn credentials(&self) -> Result<WeChatCredentials, SettingsError> {
        let appid = non_blank(self.appid.as_deref()).ok_or(SettingsError::Missing("appid"))?;
        let secret = non_blank(self.secret.as_deref()).ok_or(SettingsError::Missing("secret"))?;
        Ok(WeChatCredentials {
            appid: appid.to_owned(),
            secret: Zeroizing::new(secret.to_owned()),
        })
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let raw = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        raw.parse().map_err(|err: std::net::AddrParseError| SettingsError::BindAddr {
            value: raw.to_owned(),
            message: err.to_string(),
        })
    }

    pub fn database_url(&self) -> Option<&str> {
        non_blank(self.database_url.as_deref())
    }

    pub fn api_base_url(&self) -> &str {
        non_blank(self.api_base_url.as_deref()).unwrap_or(DEFAULT_API_BASE_URL)
    }

    pub fn card_page_path(&self) -> &str {
        non_blank(self.card_page_path.as_deref()).unwrap_or(DEFAULT_CARD_PAGE_PATH)
    }

    /// Refresh period, never shorter than one second.
    pub fn token_refresh_period(&self) -> Duration {
        Duration::from_secs(self.token_refresh_secs.max(1))
    }

    pub fn session_ttl(&self) -> Option<Duration> {
        match self.session_ttl_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    /// Sweep period, or `None` when sessions never expire or sweeping is off.
    pub fn session_sweep_period(&self) -> Option<Duration> {
        self.session_ttl()?;
        match self.session_sweep_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs.max(1))
    }

    pub fn db_max_connections(&self) -> u32 {
        self.db_max_connections.max(1)
    }
}

#[cfg(test)]
mod tests {
    //! Settings parsing from the environment.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    const VARS: [&str; 11] = [
        "MINIPROGRAM_APPID",
        "MINIPROGRAM_SECRET",
        "MINIPROGRAM_BIND_ADDR",
        "MINIPROGRAM_DATABASE_URL",
        "MINIPROGRAM_API_BASE_URL",
        "MINIPROGRAM_CARD_PAGE_PATH",
        "MINIPROGRAM_TOKEN_REFRESH_SECS",
        "MINIPROGRAM_SESSION_TTL_SECS",
        "MINIPROGRAM_SESSION_SWEEP_SECS",
        "MINIPROGRAM_HTTP_TIMEOUT_SECS",
        "MINIPROGRAM_DB_MAX_CONNECTIONS",
    ];

    fn env_with(overrides: &[(&'static str, &str)]) -> Vec<(&'static str, Option<String>)> {
        VARS.iter()
            .map(|name| {
                let value = overrides
                    .iter()
                    .find(|(key, _)| key == name)
                    .map(|(_, value)| (*value).to_owned());
                (*name, value)
            })
            .collect()
    }

    fn load_from_empty_args() -> AppSettings {
        AppSettings::load_from_iter([OsString::from("card-backend")]).expect("config should load")
    }

    #[rstest]
    fn defaults_apply_when_unset() {
        let _guard = lock_env(env_with(&[]));

        let settings = load_from_empty_args();

        assert_eq!(settings.credentials().map(|_| ()), Err(SettingsError::Missing("appid")));
        assert_eq!(
            settings.bind_addr().expect("default address parses"),
            "0.0.0.0:8080".parse::<SocketAddr>().expect("literal address")
        );
        assert!(settings.database_url().is_none());
        assert_eq!(settings.api_base_url(), DEFAULT_API_BASE_URL);
        assert_eq!(settings.card_page_path(), "pages/card/card");
        assert_eq!(settings.token_refresh_period(), Duration::from_secs(3_600));
        assert_eq!(settings.session_ttl(), Some(Duration::from_secs(2_592_000)));
        assert_eq!(settings.session_sweep_period(), Some(Duration::from_secs(600)));
        assert_eq!(settings.http_timeout(), Duration::from_secs(10));
        assert_eq!(settings.db_max_connections(), 10);
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env(env_with(&[
            ("MINIPROGRAM_APPID", "wx-app"),
            ("MINIPROGRAM_SECRET", "s3cret"),
            ("MINIPROGRAM_BIND_ADDR", "127.0.0.1:9000"),
            ("MINIPROGRAM_DATABASE_URL", "postgres://cards@localhost/cards"),
            ("MINIPROGRAM_CARD_PAGE_PATH", "pages/profile/index"),
            ("MINIPROGRAM_TOKEN_REFRESH_SECS", "60"),
            ("MINIPROGRAM_SESSION_TTL_SECS", "0"),
        ]));

        let settings = load_from_empty_args();
        let credentials = settings.credentials().expect("credentials present");

        assert_eq!(credentials.appid, "wx-app");
        assert_eq!(credentials.secret.as_str(), "s3cret");
        assert_eq!(
            settings.bind_addr().expect("address parses").port(),
            9_000
        );
        assert_eq!(settings.database_url(), Some("postgres://cards@localhost/cards"));
        assert_eq!(settings.card_page_path(), "pages/profile/index");
        assert_eq!(settings.token_refresh_period(), Duration::from_secs(60));
        assert!(settings.session_ttl().is_none());
        assert!(settings.session_sweep_period().is_none());
    }

    #[rstest]
    fn blank_secret_counts_as_missing() {
        let _guard = lock_env(env_with(&[
            ("MINIPROGRAM_APPID", "wx-app"),
            ("MINIPROGRAM_SECRET", "  "),
        ]));

        let settings = load_from_empty_args();

        assert_eq!(settings.credentials().map(|_| ()), Err(SettingsError::Missing("secret")));
    }

    #[rstest]
    fn malformed_bind_addr_is_reported() {
        let _guard = lock_env(env_with(&[("MINIPROGRAM_BIND_ADDR", "not-an-address")]));

        let settings = load_from_empty_args();

        assert!(matches!(
            settings.bind_addr(),
            Err(SettingsError::BindAddr { value, .. }) if value == "not-an-address"
        ));
    }
}
