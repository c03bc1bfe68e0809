// SPDX-FileCopyrightText: 2026 Harvest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./harvest.toml` > `~/.config/harvest/harvest.toml` > `/etc/harvest/harvest.toml`
//! with environment variable overrides via `HARVEST_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::HarvestConfig;

/// Local config file name, looked up in the working directory.
pub const LOCAL_CONFIG: &str = "harvest.toml";

/// System-wide config file.
pub const SYSTEM_CONFIG: &str = "/etc/harvest/harvest.toml";

/// Sections whose keys may be overridden from `HARVEST_<SECTION>_<KEY>`.
const ENV_SECTIONS: &[&str] = &["harvest", "source", "storage", "ingest", "retry", "report"];

/// Path of the per-user config file, if the platform has a config dir.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("harvest").join(LOCAL_CONFIG))
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/harvest/harvest.toml` (system-wide)
/// 3. `~/.config/harvest/harvest.toml` (user XDG config)
/// 4. `./harvest.toml` (local directory)
/// 5. `HARVEST_*` environment variables
pub fn load_config() -> Result<HarvestConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no files, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<HarvestConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(HarvestConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<HarvestConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(HarvestConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for the hierarchical lookup.
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(HarvestConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG))
        .merge(env_provider())
}

/// Create the environment variable provider.
///
/// Maps `HARVEST_<SECTION>_<KEY>` to `<section>.<key>` by matching the known
/// section prefix explicitly. Splitting on `_` would turn
/// `HARVEST_INGEST_BATCH_SIZE` into `ingest.batch.size`.
fn env_provider() -> Env {
    Env::prefixed("HARVEST_").map(|key| {
        let key_str = key.as_str();
        for section in ENV_SECTIONS {
            if let Some(rest) = key_str
                .strip_prefix(section)
                .and_then(|r| r.strip_prefix('_'))
            {
                return format!("{section}.{rest}").into();
            }
        }
        key_str.to_string().into()
    })
}
