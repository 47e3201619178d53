// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use crate::{location::limit::RequestMethod, netaddr::Words4};

/// The immutable client/request view the orchestrator consumes (§3 "Client
/// view"). Everything here is already extracted by the surrounding HTTP/IPP
/// layer — the engine does no header parsing of its own.
#[derive(Debug, Clone)]
pub struct ClientRequest {
    pub method: RequestMethod,
    pub path: String,

    pub client_ip: Words4,
    pub client_hostname: String,
    pub transport_secured: bool,

    pub username: Option<String>,
    /// Basic: the cleartext password. Digest: the client's computed
    /// response hash. `None` when no credentials were presented.
    pub secret: Option<String>,
    /// The raw `Authorization` header value, used for the `"Local"` prefix
    /// check (§4.3 step 9) and to extract named sub-fields like `nonce`.
    pub auth_header: Option<String>,
    /// The `nonce` sub-field of `auth_header`, pre-extracted by the HTTP
    /// layer for Digest requests.
    pub nonce: Option<String>,

    /// Present when the HTTP/IPP layer parsed an IPP request carrying a
    /// `requesting-user-name` attribute (§4.3 step 7).
    pub ipp_requesting_user_name: Option<String>,
    /// The resource owner's username, for `@OWNER` comparisons (§4.3 step
    /// 10); `None` when the request does not target an owned resource.
    pub owner: Option<String>,
}

impl ClientRequest {
    /// Whether the Authorization field begins with `"Local"` and the
    /// client is the loopback host — the "local certificate" shortcut of
    /// §4.3 step 9 / §9's second open question.
    pub fn is_local_certificate(&self) -> bool {
        self.client_hostname.eq_ignore_ascii_case("localhost")
            && self
                .auth_header
                .as_deref()
                .is_some_and(|h| h.starts_with("Local"))
    }

    pub fn username_or_empty(&self) -> &str {
        self.username.as_deref().unwrap_or("")
    }
}
