// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::net::{IpAddr, Ipv4Addr};

use ipnet::{Ipv4Net, Ipv6Net};

use crate::{
    error::ConfigError,
    netaddr::{Words4, ipv4_prefix_mask, ipv6_prefix_mask, ipv6_to_words4, to_words4},
};

/// Which local interfaces an [`AuthMask::Interface`] mask matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterfaceTarget {
    /// `@LOCAL` — any local interface.
    Any,
    /// `@IF(name)` — a single named interface.
    Named(String),
}

/// One allow/deny predicate. See §3 and §6 (mask syntax) of the design
/// document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthMask {
    /// IPv4/IPv6 network: matches when `(client & netmask) == address`.
    Ip { address: Words4, netmask: Words4 },
    /// Exact hostname, or (if `value` starts with `.`) a domain suffix.
    Name { value: String },
    /// Local-interface subnet membership.
    Interface { target: InterfaceTarget },
}

impl AuthMask {
    /// Parses one config-file mask token per the vocabulary in §6:
    /// `@LOCAL`, `@IF(name)`, a leading-dot domain suffix, an IP literal
    /// with optional netmask, or a bare hostname.
    pub fn parse(token: &str) -> Result<Self, ConfigError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(ConfigError::InvalidMask(token.to_string(), "empty token"));
        }

        if token.eq_ignore_ascii_case("@local") {
            return Ok(AuthMask::Interface {
                target: InterfaceTarget::Any,
            });
        }

        if let Some(rest) = strip_if(token) {
            if rest.is_empty() {
                return Err(ConfigError::InvalidMask(
                    token.to_string(),
                    "@IF(name) requires a non-empty name",
                ));
            }
            return Ok(AuthMask::Interface {
                target: InterfaceTarget::Named(rest.to_string()),
            });
        }

        if let Some((addr_part, mask_part)) = token.split_once('/') {
            if let Ok(addr) = addr_part.parse::<IpAddr>() {
                let netmask = parse_netmask(&addr, mask_part)
                    .ok_or_else(|| ConfigError::InvalidMask(token.to_string(), "bad netmask"))?;
                return Ok(AuthMask::Ip {
                    address: to_words4(addr),
                    netmask,
                });
            }
        }

        if let Ok(addr) = token.parse::<IpAddr>() {
            let netmask = match addr {
                IpAddr::V4(_) => ipv4_prefix_mask(32),
                IpAddr::V6(_) => ipv6_prefix_mask(128),
            };
            return Ok(AuthMask::Ip {
                address: to_words4(addr),
                netmask,
            });
        }

        Ok(AuthMask::Name {
            value: token.to_string(),
        })
    }
}

fn strip_if(token: &str) -> Option<&str> {
    let lower_prefix_len = "@if(".len();
    if token.len() > lower_prefix_len
        && token[..lower_prefix_len].eq_ignore_ascii_case("@if(")
        && token.ends_with(')')
    {
        Some(&token[lower_prefix_len..token.len() - 1])
    } else {
        None
    }
}

fn parse_netmask(addr: &IpAddr, mask_part: &str) -> Option<Words4> {
    match addr {
        IpAddr::V4(v4) => {
            if mask_part.contains('.') {
                let dotted: Ipv4Addr = mask_part.parse().ok()?;
                Some([0, 0, 0, u32::from_be_bytes(dotted.octets())])
            } else {
                let prefix: u8 = mask_part.parse().ok()?;
                let net = Ipv4Net::new(*v4, prefix).ok()?;
                Some([0, 0, 0, u32::from_be_bytes(net.netmask().octets())])
            }
        },
        IpAddr::V6(v6) => {
            let prefix: u8 = mask_part.parse().ok()?;
            let net = Ipv6Net::new(*v6, prefix).ok()?;
            Some(ipv6_to_words4(net.netmask()))
        },
    }
}
