use std::{collections::HashMap, fs};

use anyhow::{bail, Context};
use server_api::RelayIdentity;

pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmtpSecurity {
    /// Implicit TLS from the first byte.
    Tls,
    StartTls,
    /// Plaintext, for local catch-all servers only.
    None,
}

impl SmtpSecurity {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "tls" | "ssl" | "smtps" => Some(Self::Tls),
            "starttls" => Some(Self::StartTls),
            "none" | "plain" => Some(Self::None),
            _ => None,
        }
    }

    pub fn default_port(self) -> u16 {
        match self {
            Self::Tls => 465,
            Self::StartTls => 587,
            Self::None => 25,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub server_bind: String,
    pub email_user: Option<String>,
    pub email_pass: Option<String>,
    pub smtp_host: String,
    pub smtp_port: Option<u16>,
    pub smtp_security: SmtpSecurity,
    pub site_name: String,
    pub signature_name: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: format!("0.0.0.0:{DEFAULT_PORT}"),
            email_user: None,
            email_pass: None,
            smtp_host: "smtp.gmail.com".into(),
            smtp_port: None,
            smtp_security: SmtpSecurity::Tls,
            site_name: "Agência DRK".into(),
            signature_name: "Derik Jamba".into(),
        }
    }
}

/// Mail account used both to authenticate and as the operator inbox.
#[derive(Debug, Clone)]
pub struct MailAccount {
    pub user: String,
    pub password: String,
}

impl Settings {
    pub fn mail_account(&self) -> anyhow::Result<MailAccount> {
        let user = self
            .email_user
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .context("EMAIL_USER is not set; the relay has no mail account")?;
        let password = self
            .email_pass
            .as_deref()
            .filter(|v| !v.is_empty())
            .context("EMAIL_PASS is not set; the relay cannot authenticate")?;

        if !shared::domain::is_valid_email(user) {
            bail!("EMAIL_USER '{user}' is not an email address");
        }

        Ok(MailAccount {
            user: user.to_string(),
            password: password.to_string(),
        })
    }

    pub fn smtp_port(&self) -> u16 {
        self.smtp_port
            .unwrap_or_else(|| self.smtp_security.default_port())
    }

    pub fn relay_identity(&self, account: &MailAccount) -> RelayIdentity {
        RelayIdentity {
            sender: account.user.clone(),
            operator: account.user.clone(),
            site_name: self.site_name.clone(),
            signature_name: self.signature_name.clone(),
        }
    }
}

/// Defaults, then `server.toml`, then the process environment. `.env` is
/// loaded into the environment by `main` before this runs.
pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("server.toml") {
        apply_file(&mut settings, &raw);
    }

    apply_env(&mut settings, |key| std::env::var(key).ok());

    settings
}

pub(crate) fn apply_file(settings: &mut Settings, raw: &str) {
    let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(raw) else {
        tracing::warn!("ignoring server.toml: expected a flat table of strings");
        return;
    };

    if let Some(v) = file_cfg.get("port") {
        set_port(settings, v);
    }
    if let Some(v) = file_cfg.get("bind_addr") {
        settings.server_bind = v.clone();
    }
    if let Some(v) = file_cfg.get("email_user") {
        settings.email_user = Some(v.clone());
    }
    if let Some(v) = file_cfg.get("email_pass") {
        settings.email_pass = Some(v.clone());
    }
    if let Some(v) = file_cfg.get("smtp_host") {
        settings.smtp_host = v.clone();
    }
    if let Some(v) = file_cfg.get("smtp_port") {
        set_smtp_port(settings, v);
    }
    if let Some(v) = file_cfg.get("smtp_tls") {
        set_security(settings, v);
    }
    if let Some(v) = file_cfg.get("site_name") {
        settings.site_name = v.clone();
    }
    if let Some(v) = file_cfg.get("signature_name") {
        settings.signature_name = v.clone();
    }
}

pub(crate) fn apply_env(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("PORT") {
        set_port(settings, &v);
    }
    if let Some(v) = lookup("SERVER_BIND") {
        settings.server_bind = v;
    }
    if let Some(v) = lookup("APP__BIND_ADDR") {
        settings.server_bind = v;
    }

    if let Some(v) = lookup("EMAIL_USER") {
        settings.email_user = Some(v);
    }
    if let Some(v) = lookup("APP__EMAIL_USER") {
        settings.email_user = Some(v);
    }

    if let Some(v) = lookup("EMAIL_PASS") {
        settings.email_pass = Some(v);
    }
    if let Some(v) = lookup("APP__EMAIL_PASS") {
        settings.email_pass = Some(v);
    }

    if let Some(v) = lookup("SMTP_HOST") {
        settings.smtp_host = v;
    }
    if let Some(v) = lookup("SMTP_PORT") {
        set_smtp_port(settings, &v);
    }
    if let Some(v) = lookup("SMTP_TLS") {
        set_security(settings, &v);
    }

    if let Some(v) = lookup("SITE_NAME") {
        settings.site_name = v;
    }
    if let Some(v) = lookup("SIGNATURE_NAME") {
        settings.signature_name = v;
    }
}

fn set_port(settings: &mut Settings, raw: &str) {
    match raw.trim().parse::<u16>() {
        Ok(port) => settings.server_bind = format!("0.0.0.0:{port}"),
        Err(_) => tracing::warn!(value = raw, "ignoring invalid PORT"),
    }
}

fn set_smtp_port(settings: &mut Settings, raw: &str) {
    match raw.trim().parse::<u16>() {
        Ok(port) => settings.smtp_port = Some(port),
        Err(_) => tracing::warn!(value = raw, "ignoring invalid SMTP_PORT"),
    }
}

fn set_security(settings: &mut Settings, raw: &str) {
    match SmtpSecurity::parse(raw) {
        Some(security) => settings.smtp_security = security,
        None => tracing::warn!(value = raw, "ignoring unknown SMTP_TLS mode"),
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
