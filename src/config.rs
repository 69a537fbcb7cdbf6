use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use reqwest::header::HeaderValue;
use serde::Deserialize as _;
use url::Url;

use crate::formats::Config;

/// Cookie name to value, sent with every request of the run.
pub type Cookies = BTreeMap<String, String>;

/// Failures that stop the run before any network activity.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("config file not found: {}", .0.display())]
    ConfigMissing(PathBuf),
    #[error("invalid config file {}: {reason}", path.display())]
    ConfigInvalid { path: PathBuf, reason: String },
    #[error("cookie file not found: {}", .0.display())]
    CookieMissing(PathBuf),
    #[error("invalid cookie file {}: {reason}", path.display())]
    CookieInvalid { path: PathBuf, reason: String },
}

pub fn load(path: &Path) -> Result<Config, StartupError> {
    if !path.exists() {
        return Err(StartupError::ConfigMissing(path.to_path_buf()));
    }
    let invalid = |reason: String| StartupError::ConfigInvalid {
        path: path.to_path_buf(),
        reason,
    };

    let object = read_json_object(path).map_err(invalid)?;
    let mut config = Config::deserialize(serde_json::Value::Object(object))
        .map_err(|err| invalid(err.to_string()))?;

    let root_url = Url::parse(&config.root_url)
        .map_err(|err| invalid(format!("root_url {:?}: {err}", config.root_url)))?;
    if root_url.scheme() != "http" && root_url.scheme() != "https" {
        return Err(invalid(format!(
            "root_url must be http/https: {}",
            config.root_url
        )));
    }
    config.root_url = config.root_url.trim_end_matches('/').to_owned();

    Ok(config)
}

/// Relative cookie paths are taken relative to the config file.
pub fn resolve_cookie_path(config_path: &Path, cookie_path: &str) -> PathBuf {
    let cookie_path = Path::new(cookie_path);
    if cookie_path.is_absolute() {
        return cookie_path.to_path_buf();
    }
    match config_path.parent() {
        Some(dir) => dir.join(cookie_path),
        None => cookie_path.to_path_buf(),
    }
}

pub fn load_cookies(path: &Path) -> Result<Cookies, StartupError> {
    if !path.exists() {
        return Err(StartupError::CookieMissing(path.to_path_buf()));
    }

    let object = read_json_object(path).map_err(|reason| StartupError::CookieInvalid {
        path: path.to_path_buf(),
        reason,
    })?;

    let cookies = object
        .into_iter()
        .map(|(name, value)| (name, cookie_value(value)))
        .collect::<Cookies>();

    // Every pair ends up in one `Cookie` header, which only carries visible ASCII.
    if let Some(name) = cookies.iter().find_map(|(name, value)| {
        HeaderValue::from_str(&format!("{name}={value}"))
            .is_err()
            .then_some(name)
    }) {
        return Err(StartupError::CookieInvalid {
            path: path.to_path_buf(),
            reason: format!("cookie {name:?} is not printable ASCII"),
        });
    }

    Ok(cookies)
}

fn cookie_value(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(value) => value,
        serde_json::Value::Bool(value) => value.to_string(),
        other => other.to_string(),
    }
}

fn read_json_object(path: &Path) -> Result<serde_json::Map<String, serde_json::Value>, String> {
    let contents = std::fs::read_to_string(path).map_err(|err| err.to_string())?;
    let value: serde_json::Value = serde_json::from_str(&contents).map_err(|err| err.to_string())?;
    match value {
        serde_json::Value::Object(object) => Ok(object),
        _ => Err("expected a JSON object".to_owned()),
    }
}
