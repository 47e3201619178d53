// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use core::fmt;

use serde::{Deserialize, Serialize};

/// Composition rule between a Location's allow and deny mask lists (§4.3
/// step 3). Controls both evaluation order and the default verdict when
/// no mask matches.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    #[serde(rename = "Allow,Deny", alias = "allow,deny")]
    AllowDeny,
    #[serde(rename = "Deny,Allow", alias = "deny,allow")]
    DenyAllow,
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Order::AllowDeny => "Allow,Deny",
            Order::DenyAllow => "Deny,Allow",
        })
    }
}

/// What class of principal a Location authorizes against.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthLevel {
    #[serde(rename = "Anonymous", alias = "anonymous")]
    Anonymous,
    #[serde(rename = "User", alias = "user")]
    User,
    #[serde(rename = "Group", alias = "group")]
    Group,
}

/// Credential scheme a Location demands.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthType {
    #[serde(rename = "None", alias = "none")]
    None,
    #[serde(rename = "Basic", alias = "basic")]
    Basic,
    #[serde(rename = "Digest", alias = "digest")]
    Digest,
    #[serde(rename = "BasicDigest", alias = "basicdigest")]
    BasicDigest,
}

/// Whether host-level allow alone suffices (`Any`) or credentials must
/// also succeed (`All`).
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Satisfy {
    #[serde(rename = "All", alias = "all")]
    All,
    #[serde(rename = "Any", alias = "any")]
    Any,
}

/// Minimum transport encryption a Location requires.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Encryption {
    #[serde(rename = "Never", alias = "never")]
    Never,
    #[serde(rename = "IfRequested", alias = "ifrequested")]
    IfRequested,
    #[serde(rename = "Required", alias = "required")]
    Required,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encryption_ordering_places_required_highest() {
        assert!(Encryption::Required > Encryption::IfRequested);
        assert!(Encryption::IfRequested > Encryption::Never);
    }

    #[test]
    fn order_display_matches_config_syntax() {
        assert_eq!(Order::AllowDeny.to_string(), "Allow,Deny");
        assert_eq!(Order::DenyAllow.to_string(), "Deny,Allow");
    }
}
