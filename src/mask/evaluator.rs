// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use crate::{
    mask::{
        authmask::{AuthMask, InterfaceTarget},
        interfaces::NetworkInterfaceProvider,
    },
    netaddr::{Words4, subnet_matches},
};

/// Tests one client against an ordered mask list, returning true on the
/// first match (§4.2). An empty or all-non-matching list returns false.
pub fn check(
    client_ip: Words4,
    client_host: &str,
    masks: &[AuthMask],
    interfaces: &mut dyn NetworkInterfaceProvider,
) -> bool {
    masks
        .iter()
        .any(|mask| mask_matches(mask, client_ip, client_host, interfaces))
}

fn mask_matches(
    mask: &AuthMask,
    client_ip: Words4,
    client_host: &str,
    interfaces: &mut dyn NetworkInterfaceProvider,
) -> bool {
    match mask {
        AuthMask::Ip { address, netmask } => subnet_matches(client_ip, *address, *netmask),
        AuthMask::Name { value } => name_matches(value, client_host),
        AuthMask::Interface { target } => interface_matches(target, client_ip, interfaces),
    }
}

fn name_matches(mask_value: &str, client_host: &str) -> bool {
    if mask_value.eq_ignore_ascii_case(client_host) {
        return true;
    }
    if let Some(suffix) = mask_value.strip_prefix('.') {
        let suffix_len = suffix.len();
        if client_host.len() >= suffix_len {
            let tail = &client_host[client_host.len() - suffix_len..];
            return tail.eq_ignore_ascii_case(suffix);
        }
    }
    false
}

fn interface_matches(
    target: &InterfaceTarget,
    client_ip: Words4,
    interfaces: &mut dyn NetworkInterfaceProvider,
) -> bool {
    interfaces.refresh();
    match target {
        InterfaceTarget::Any => interfaces
            .interfaces()
            .iter()
            .any(|iface| subnet_matches(client_ip, network_of(iface), iface.netmask)),
        InterfaceTarget::Named(name) => interfaces
            .by_name(name)
            .is_some_and(|iface| subnet_matches(client_ip, network_of(iface), iface.netmask)),
    }
}

fn network_of(iface: &crate::mask::interfaces::Interface) -> Words4 {
    let mut net = [0u32; 4];
    for k in 0..4 {
        net[k] = iface.address[k] & iface.netmask[k];
    }
    net
}
