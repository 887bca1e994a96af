use std::{
    collections::HashMap,
    fmt,
    net::SocketAddr,
    path::Path,
    time::Duration,
};

use anyhow::{bail, Context};
use mail_relay::{oauth, template, MailerConfig, OAuthConfig, TemplateConfig};
use serde::Deserialize;
use url::Url;

pub const SETTINGS_FILE: &str = "relay.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MailBackendKind {
    #[default]
    Oauth,
    Template,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MailerSettings {
    pub backend: MailBackendKind,
}

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct OAuthSettings {
    pub token_url: String,
    pub send_url: String,
    pub refresh_token: String,
    pub client_id: String,
    pub client_secret: String,
    pub sender_address: String,
}

impl Default for OAuthSettings {
    fn default() -> Self {
        Self {
            token_url: oauth::DEFAULT_TOKEN_URL.into(),
            send_url: oauth::DEFAULT_SEND_URL.into(),
            refresh_token: String::new(),
            client_id: String::new(),
            client_secret: String::new(),
            sender_address: String::new(),
        }
    }
}

impl fmt::Debug for OAuthSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthSettings")
            .field("token_url", &self.token_url)
            .field("send_url", &self.send_url)
            .field("refresh_token", &redacted(&self.refresh_token))
            .field("client_id", &self.client_id)
            .field("client_secret", &redacted(&self.client_secret))
            .field("sender_address", &self.sender_address)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TemplateSettings {
    pub send_url: String,
    pub service_id: String,
    pub template_id: String,
    pub public_key: String,
}

impl Default for TemplateSettings {
    fn default() -> Self {
        Self {
            send_url: template::DEFAULT_SEND_URL.into(),
            service_id: String::new(),
            template_id: String::new(),
            public_key: String::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub bind_addr: String,
    pub allowed_origin: String,
    pub upstream_timeout_secs: u64,
    pub mailer: MailerSettings,
    pub oauth: OAuthSettings,
    pub template: TemplateSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8787".into(),
            allowed_origin: "https://www.redbridgesolutions.io".into(),
            upstream_timeout_secs: 15,
            mailer: MailerSettings::default(),
            oauth: OAuthSettings::default(),
            template: TemplateSettings::default(),
        }
    }
}

/// Deployment variables that predate the `APP__` scheme.
const LEGACY_ENV_KEYS: &[(&str, &str)] = &[
    ("SERVER_BIND", "bind_addr"),
    ("ZOHO_REFRESH_TOKEN", "oauth.refresh_token"),
    ("ZOHO_CLIENT_ID", "oauth.client_id"),
    ("ZOHO_CLIENT_SECRET", "oauth.client_secret"),
    ("ZOHO_ACCOUNT_EMAIL", "oauth.sender_address"),
    ("EMAILJS_SERVICE_ID", "template.service_id"),
    ("EMAILJS_TEMPLATE_ID", "template.template_id"),
    ("EMAILJS_PUBLIC_KEY", "template.public_key"),
];

pub fn load_settings() -> anyhow::Result<Settings> {
    load_settings_from(Path::new(SETTINGS_FILE), std::env::vars().collect())
}

/// Layers defaults, the optional settings file, `APP__*` variables and the
/// legacy variables, later layers winning.
pub fn load_settings_from(
    file: &Path,
    env: HashMap<String, String>,
) -> anyhow::Result<Settings> {
    let mut builder = ::config::Config::builder()
        .add_source(::config::File::from(file).required(false))
        .add_source(
            ::config::Environment::with_prefix("APP")
                .prefix_separator("__")
                .separator("__")
                .source(Some(env.clone())),
        );

    for (var, key) in LEGACY_ENV_KEYS {
        builder = builder.set_override_option(*key, env.get(*var).cloned())?;
    }

    builder
        .build()
        .context("failed to read relay settings")?
        .try_deserialize::<Settings>()
        .context("invalid relay settings")
}

impl Settings {
    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }

    pub fn bind_addr(&self) -> anyhow::Result<SocketAddr> {
        self.bind_addr
            .parse()
            .with_context(|| format!("invalid bind_addr '{}'", self.bind_addr))
    }

    /// Serialized origin (`scheme://host[:port]`) browsers send in `Origin`.
    pub fn site_origin(&self) -> anyhow::Result<String> {
        let url = Url::parse(self.allowed_origin.trim())
            .with_context(|| format!("invalid allowed_origin '{}'", self.allowed_origin))?;
        let origin = url.origin();
        if !origin.is_tuple() {
            bail!("allowed_origin '{}' has no host", self.allowed_origin);
        }
        Ok(origin.ascii_serialization())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.bind_addr()?;
        self.site_origin()?;
        if self.upstream_timeout_secs == 0 {
            bail!("upstream_timeout_secs must be greater than zero");
        }

        match self.mailer.backend {
            MailBackendKind::Oauth => {
                check_url("oauth.token_url", &self.oauth.token_url)?;
                check_url("oauth.send_url", &self.oauth.send_url)?;
                check_present("oauth.refresh_token", &self.oauth.refresh_token)?;
                check_present("oauth.client_id", &self.oauth.client_id)?;
                check_present("oauth.client_secret", &self.oauth.client_secret)?;
                check_present("oauth.sender_address", &self.oauth.sender_address)?;
            }
            MailBackendKind::Template => {
                check_url("template.send_url", &self.template.send_url)?;
                check_present("template.service_id", &self.template.service_id)?;
                check_present("template.template_id", &self.template.template_id)?;
                check_present("template.public_key", &self.template.public_key)?;
            }
        }
        Ok(())
    }

    pub fn mailer_config(&self) -> MailerConfig {
        match self.mailer.backend {
            MailBackendKind::Oauth => MailerConfig::OAuth(OAuthConfig {
                token_url: self.oauth.token_url.clone(),
                send_url: self.oauth.send_url.clone(),
                refresh_token: self.oauth.refresh_token.clone(),
                client_id: self.oauth.client_id.clone(),
                client_secret: self.oauth.client_secret.clone(),
                sender_address: self.oauth.sender_address.clone(),
            }),
            MailBackendKind::Template => MailerConfig::Template(TemplateConfig {
                send_url: self.template.send_url.clone(),
                service_id: self.template.service_id.clone(),
                template_id: self.template.template_id.clone(),
                public_key: self.template.public_key.clone(),
            }),
        }
    }
}

fn check_url(key: &str, value: &str) -> anyhow::Result<()> {
    Url::parse(value).with_context(|| format!("{key} is not a valid URL: '{value}'"))?;
    Ok(())
}

fn check_present(key: &str, value: &str) -> anyhow::Result<()> {
    if value.trim().is_empty() {
        bail!("{key} must be set for the selected mail backend");
    }
    Ok(())
}

fn redacted(value: &str) -> &'static str {
    if value.is_empty() {
        "<unset>"
    } else {
        "<redacted>"
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
