// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use serde::{Deserialize, Serialize};

use crate::{
    error::ConfigError,
    location::{
        limit::Limit,
        policy::{AuthLevel, AuthType, Encryption, Order, Satisfy},
    },
    mask::authmask::AuthMask,
};

/// A principal or group named in a Location's `names` list (§3, §4.3 step
/// 10). `@OWNER` and `@SYSTEM` are placeholders expanded at evaluation
/// time; `@group` names a system or MD5-file group; a bare token names a
/// user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Principal {
    Owner,
    System,
    Group(String),
    User(String),
}

impl Principal {
    pub fn parse(token: &str) -> Result<Self, ConfigError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(ConfigError::InvalidPrincipal(
                token.to_string(),
                "empty token",
            ));
        }
        Ok(if token.eq_ignore_ascii_case("@owner") {
            Principal::Owner
        } else if token.eq_ignore_ascii_case("@system") {
            Principal::System
        } else if let Some(group) = token.strip_prefix('@') {
            if group.is_empty() {
                return Err(ConfigError::InvalidPrincipal(
                    token.to_string(),
                    "@group requires a non-empty name",
                ));
            }
            Principal::Group(group.to_string())
        } else {
            Principal::User(token.to_string())
        })
    }
}

/// A policy record keyed by an ASCII URL path prefix (§3).
#[derive(Debug, Clone)]
pub struct Location {
    pub path: String,
    pub limit: Limit,
    /// IPP operation identifier, used only for logging when `limit`
    /// includes the IPP bit.
    pub op: Option<u32>,
    pub order: Order,
    pub level: AuthLevel,
    pub auth_type: AuthType,
    pub satisfy: Satisfy,
    pub encryption: Encryption,
    pub names: Vec<Principal>,
    pub allow: Vec<AuthMask>,
    pub deny: Vec<AuthMask>,
}

impl Location {
    /// A zero-initialized Location with only `path` set, matching
    /// `LocationTable::add`'s contract (§4.1).
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            limit: Limit::ALL,
            op: None,
            order: Order::AllowDeny,
            level: AuthLevel::Anonymous,
            auth_type: AuthType::None,
            satisfy: Satisfy::All,
            encryption: Encryption::IfRequested,
            names: Vec::new(),
            allow: Vec::new(),
            deny: Vec::new(),
        }
    }

    /// Invariant (iv): a Location never selected by `find_best` unless its
    /// path begins with `/`.
    pub fn is_absolute(&self) -> bool {
        self.path.starts_with('/')
    }

    /// Whether this Location's path participates in the special
    /// case-insensitive prefix rule (§4.1): any path nested under
    /// `/printers/` or `/classes/`.
    fn uses_case_insensitive_prefix(&self) -> bool {
        let lower = self.path.to_ascii_lowercase();
        lower.starts_with("/printers/") || lower.starts_with("/classes/")
    }

    /// Whether `self.path` is a prefix of `uri`, applying the §4.1
    /// case-sensitivity rule.
    pub fn path_is_prefix_of(&self, uri: &str) -> bool {
        if uri.len() < self.path.len() {
            return false;
        }
        let candidate = &uri[..self.path.len()];
        if self.uses_case_insensitive_prefix() {
            candidate.eq_ignore_ascii_case(&self.path)
        } else {
            candidate == self.path
        }
    }
}

/// Deserialized shape of one `locations:` entry in the server config (§4.6).
/// Kept separate from [`Location`] so the wire format can evolve (string
/// mask/principal tokens) independently of the resolved in-memory record.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LocationSpec {
    pub path: String,
    #[serde(default)]
    pub limit: Vec<String>,
    #[serde(default)]
    pub op: Option<u32>,
    #[serde(default = "default_order")]
    pub order: Order,
    #[serde(default = "default_level")]
    pub level: AuthLevel,
    #[serde(default = "default_auth_type", rename = "type")]
    pub auth_type: AuthType,
    #[serde(default = "default_satisfy")]
    pub satisfy: Satisfy,
    #[serde(default = "default_encryption")]
    pub encryption: Encryption,
    #[serde(default)]
    pub names: Vec<String>,
    #[serde(default)]
    pub allow: Vec<String>,
    #[serde(default)]
    pub deny: Vec<String>,
}

fn default_order() -> Order {
    Order::AllowDeny
}
fn default_level() -> AuthLevel {
    AuthLevel::Anonymous
}
fn default_auth_type() -> AuthType {
    AuthType::None
}
fn default_satisfy() -> Satisfy {
    Satisfy::All
}
fn default_encryption() -> Encryption {
    Encryption::IfRequested
}

impl LocationSpec {
    /// Resolves the string tokens in a `LocationSpec` into a fully typed
    /// [`Location`], rejecting malformed masks/principals at configuration
    /// time (§7 error kind ii).
    pub fn resolve(&self) -> Result<Location, ConfigError> {
        if !self.path.starts_with('/') {
            return Err(ConfigError::PathMustBeAbsolute(self.path.clone()));
        }

        let mut limit = Limit::empty();
        if self.limit.is_empty() {
            limit = Limit::ALL;
        } else {
            for tok in &self.limit {
                let bit = Limit::from_token(tok).ok_or_else(|| {
                    ConfigError::InvalidMask(tok.clone(), "unknown HTTP method token")
                })?;
                limit |= bit;
            }
        }

        let names = self
            .names
            .iter()
            .map(|n| Principal::parse(n))
            .collect::<Result<Vec<_>, _>>()?;
        let allow = self
            .allow
            .iter()
            .map(|m| AuthMask::parse(m))
            .collect::<Result<Vec<_>, _>>()?;
        let deny = self
            .deny
            .iter()
            .map(|m| AuthMask::parse(m))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Location {
            path: self.path.clone(),
            limit,
            op: self.op,
            order: self.order,
            level: self.level,
            auth_type: self.auth_type,
            satisfy: self.satisfy,
            encryption: self.encryption,
            names,
            allow,
            deny,
        })
    }
}
