// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};

use crate::{
    error::ConfigError,
    location::{location::LocationSpec, policy::AuthType, table::LocationTable},
};

/// Server-wide settings plus the raw location list, deserialized from a
/// single YAML document (§4.6).
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    #[serde(rename = "ServerName")]
    pub server_name: String,

    #[serde(rename = "Realm", default = "default_realm")]
    pub realm: String,

    /// Substituted for a Location's `type` when it names principals but
    /// leaves `type` at `None` (mirrors `DefaultAuthType` in the original
    /// daemon).
    #[serde(rename = "DefaultAuthType", default = "default_auth_type")]
    pub default_auth_type: AuthType,

    /// The ordered group list `@SYSTEM` expands to.
    #[serde(rename = "SystemGroups", default)]
    pub system_groups: Vec<String>,

    #[serde(rename = "Md5PasswordFile", default)]
    pub md5_password_file: Option<PathBuf>,

    #[serde(rename = "Locations", default)]
    pub locations: Vec<LocationSpec>,
}

fn default_realm() -> String {
    "CUPS".to_string()
}

fn default_auth_type() -> AuthType {
    AuthType::None
}

impl ServerConfig {
    /// Reads, deserializes, and validates a server configuration file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = fs::read_to_string(path.as_ref())
            .with_context(|| format!("failed to read config file {:?}", path.as_ref()))?;
        let mut cfg: ServerConfig =
            serde_yaml::from_str(&raw).context("failed to parse config YAML")?;
        cfg.validate_and_normalize()?;
        Ok(cfg)
    }

    /// Validates cross-field invariants the deserializer cannot express on
    /// its own (§4.6).
    pub fn validate_and_normalize(&mut self) -> Result<()> {
        ensure!(!self.server_name.is_empty(), "ServerName must not be empty");

        for loc in &self.locations {
            ensure!(
                loc.path.starts_with('/'),
                "location path {:?} must start with '/'",
                loc.path
            );
        }

        let names_system = self
            .locations
            .iter()
            .any(|loc| loc.names.iter().any(|n| n.eq_ignore_ascii_case("@system")));
        if names_system && self.system_groups.is_empty() {
            return Err(ConfigError::SystemGroupsEmpty.into());
        }

        Ok(())
    }

    /// Resolves every `LocationSpec` into a typed `Location` and loads the
    /// result into a fresh `LocationTable`, in file order (order matters
    /// for `find_best` tie-breaking, §4.1).
    pub fn build_location_table(&self) -> Result<LocationTable> {
        let mut table = LocationTable::new();
        for spec in &self.locations {
            let loc = spec
                .resolve()
                .with_context(|| format!("invalid location {:?}", spec.path))?;
            table.add(loc);
        }
        Ok(table)
    }
}
