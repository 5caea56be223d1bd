use std::{
    env, fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub bind_addr: String,
    pub database_url: String,
    pub media_root: String,
    pub media_public_url: String,
    pub admin_token_secret: String,
    pub admin_token_issuer: String,
    pub max_upload_bytes: usize,
    pub media_cleanup: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8443".into(),
            database_url: "sqlite://./data/gallery.db".into(),
            media_root: "./data/media".into(),
            media_public_url: "http://127.0.0.1:8443/media".into(),
            admin_token_secret: "devsecret".into(),
            admin_token_issuer: "gallery".into(),
            max_upload_bytes: 32 * 1024 * 1024,
            media_cleanup: true,
        }
    }
}

pub fn load_settings() -> anyhow::Result<Settings> {
    load_settings_from(Path::new("server.toml"))
}

/// Defaults, then the optional TOML file, then `APP__*` variables. The
/// legacy `DATABASE_URL`/`SERVER_BIND` variables apply only when their
/// `APP__` counterpart is unset.
pub fn load_settings_from(path: &Path) -> anyhow::Result<Settings> {
    let defaults = Settings::default();
    let mut builder = Config::builder()
        .set_default("bind_addr", defaults.bind_addr)?
        .set_default("database_url", defaults.database_url)?
        .set_default("media_root", defaults.media_root)?
        .set_default("media_public_url", defaults.media_public_url)?
        .set_default("admin_token_secret", defaults.admin_token_secret)?
        .set_default("admin_token_issuer", defaults.admin_token_issuer)?
        .set_default("max_upload_bytes", defaults.max_upload_bytes as i64)?
        .set_default("media_cleanup", defaults.media_cleanup)?
        .add_source(File::from(path).format(FileFormat::Toml).required(false))
        .add_source(
            Environment::with_prefix("APP")
                .separator("__")
                .try_parsing(true),
        );

    for (legacy, modern, key) in [
        ("DATABASE_URL", "APP__DATABASE_URL", "database_url"),
        ("SERVER_BIND", "APP__BIND_ADDR", "bind_addr"),
    ] {
        if env::var_os(modern).is_some() {
            continue;
        }
        if let Ok(value) = env::var(legacy) {
            builder = builder.set_override(key, value)?;
        }
    }

    builder
        .build()
        .with_context(|| format!("failed to load settings from '{}'", path.display()))?
        .try_deserialize()
        .context("invalid server settings")
}

pub fn prepare_database_url(raw_database_url: &str) -> anyhow::Result<String> {
    let database_url = normalize_database_url(raw_database_url);
    ensure_parent_dir_exists(&database_url)?;
    Ok(database_url)
}

fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return Settings::default().database_url;
    }

    if raw_database_url.starts_with("sqlite::memory:") {
        return raw_database_url.to_string();
    }

    if let Some(path) = raw_database_url.strip_prefix("sqlite://") {
        if has_windows_drive(path) {
            return format!("sqlite:{}", path.replace('\\', "/"));
        }
        return raw_database_url.to_string();
    }

    if raw_database_url.contains("://") {
        return raw_database_url.to_string();
    }

    if let Some(path) = raw_database_url.strip_prefix("sqlite:") {
        let path = path.replace('\\', "/");
        if has_windows_drive(&path) {
            return format!("sqlite:{path}");
        }
        return format!("sqlite://{path}");
    }

    let path = raw_database_url.replace('\\', "/");
    if has_windows_drive(&path) {
        return format!("sqlite:{path}");
    }
    format!("sqlite://{path}")
}

fn has_windows_drive(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

fn ensure_parent_dir_exists(database_url: &str) -> anyhow::Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url == "sqlite::memory:" || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
