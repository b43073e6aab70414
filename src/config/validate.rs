// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{RelaunchError, Result};
use crate::security::FORBIDDEN_CHARS;
use crate::watch::patterns::build_globset;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::RelaunchError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.watch, raw.supervisor, raw.security))
    }
}

pub fn validate_config(cfg: &RawConfigFile) -> Result<()> {
    validate_watch(cfg)?;
    validate_supervisor(cfg)?;
    validate_security(cfg)?;
    Ok(())
}

fn validate_watch(cfg: &RawConfigFile) -> Result<()> {
    if cfg.watch.poll_interval_ms == 0 {
        return Err(RelaunchError::ConfigError(
            "[watch].poll_interval_ms must be >= 1 (got 0)".to_string(),
        ));
    }

    if cfg.watch.extensions.is_empty() {
        return Err(RelaunchError::ConfigError(
            "[watch].extensions must list at least one extension".to_string(),
        ));
    }

    for ext in &cfg.watch.extensions {
        if !ext.starts_with('.') || ext.len() < 2 {
            return Err(RelaunchError::ConfigError(format!(
                "[watch].extensions entry '{ext}' must look like \".rs\""
            )));
        }
    }

    build_globset(&cfg.watch.exclude)
        .map_err(|e| RelaunchError::ConfigError(format!("[watch].exclude: {e:#}")))?;

    Ok(())
}

fn validate_supervisor(cfg: &RawConfigFile) -> Result<()> {
    let sup = &cfg.supervisor;

    if sup.grace_poll_ms == 0 {
        return Err(RelaunchError::ConfigError(
            "[supervisor].grace_poll_ms must be >= 1 (got 0)".to_string(),
        ));
    }

    if sup.grace_poll_ms > sup.grace_period_ms {
        return Err(RelaunchError::ConfigError(format!(
            "[supervisor].grace_poll_ms ({}) must not exceed grace_period_ms ({})",
            sup.grace_poll_ms, sup.grace_period_ms
        )));
    }

    Ok(())
}

fn validate_security(cfg: &RawConfigFile) -> Result<()> {
    for cmd in &cfg.security.allowed_commands {
        let single_token = !cmd.is_empty() && !cmd.chars().any(char::is_whitespace);
        if !single_token || cmd.contains(FORBIDDEN_CHARS) {
            return Err(RelaunchError::ConfigError(format!(
                "[security].allowed_commands entry '{cmd}' must be a single plain executable name"
            )));
        }
    }
    Ok(())
}
