// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use serde::{Deserialize, Serialize};

bitflags::bitflags! {
    /// Bitmask of HTTP methods (plus a synthetic IPP bit) a [`crate::location::location::Location`]
    /// applies to.
    #[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Limit: u16 {
        const GET     = 0b0000_0000_0001;
        const HEAD    = 0b0000_0000_0010;
        const POST    = 0b0000_0000_0100;
        const PUT     = 0b0000_0000_1000;
        const DELETE  = 0b0000_0001_0000;
        const OPTIONS = 0b0000_0010_0000;
        const TRACE   = 0b0000_0100_0000;
        /// Synthetic bit set on Locations whose `limit` covers IPP requests.
        const IPP     = 0b0000_1000_0000;
        const ALL = Self::GET.bits() | Self::HEAD.bits() | Self::POST.bits()
            | Self::PUT.bits() | Self::DELETE.bits() | Self::OPTIONS.bits()
            | Self::TRACE.bits() | Self::IPP.bits();
    }
}

impl Limit {
    /// Parses one `<Limit>` config token (case-insensitive).
    pub fn from_token(token: &str) -> Option<Self> {
        Some(match token.to_ascii_uppercase().as_str() {
            "ALL" => Limit::ALL,
            "GET" => Limit::GET,
            "HEAD" => Limit::HEAD,
            "POST" => Limit::POST,
            "PUT" => Limit::PUT,
            "DELETE" => Limit::DELETE,
            "OPTIONS" => Limit::OPTIONS,
            "TRACE" => Limit::TRACE,
            "IPP" => Limit::IPP,
            _ => return None,
        })
    }
}

/// The HTTP/IPP request state the method mapping in §4.1 is defined over.
/// `Waiting`/`Close`/`Status` are connection-lifecycle pseudo-methods from
/// the surrounding HTTP layer that always map to `Limit::ALL`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RequestMethod {
    Waiting,
    Close,
    Status,
    Get,
    Head,
    Post,
    Put,
    Delete,
    Options,
    Trace,
}

impl RequestMethod {
    /// The HTTP method token used in `md5_final`'s `method` parameter
    /// (§4.3 step 9 Digest path).
    pub fn as_http_token(self) -> &'static str {
        match self {
            RequestMethod::Waiting | RequestMethod::Close | RequestMethod::Status => "GET",
            RequestMethod::Get => "GET",
            RequestMethod::Head => "HEAD",
            RequestMethod::Post => "POST",
            RequestMethod::Put => "PUT",
            RequestMethod::Delete => "DELETE",
            RequestMethod::Options => "OPTIONS",
            RequestMethod::Trace => "TRACE",
        }
    }

    /// Maps a request method to the single `Limit` bit `find_best` tests
    /// against (§4.1).
    pub fn to_limit_bit(self) -> Limit {
        match self {
            RequestMethod::Waiting | RequestMethod::Close | RequestMethod::Status => Limit::ALL,
            RequestMethod::Get => Limit::GET,
            RequestMethod::Head => Limit::HEAD,
            RequestMethod::Post => Limit::POST,
            RequestMethod::Put => Limit::PUT,
            RequestMethod::Delete => Limit::DELETE,
            RequestMethod::Options => Limit::OPTIONS,
            RequestMethod::Trace => Limit::TRACE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_covers_every_single_bit() {
        for bit in [
            Limit::GET,
            Limit::HEAD,
            Limit::POST,
            Limit::PUT,
            Limit::DELETE,
            Limit::OPTIONS,
            Limit::TRACE,
            Limit::IPP,
        ] {
            assert!(Limit::ALL.contains(bit));
        }
    }

    #[test]
    fn waiting_close_status_map_to_all() {
        assert_eq!(RequestMethod::Waiting.to_limit_bit(), Limit::ALL);
        assert_eq!(RequestMethod::Close.to_limit_bit(), Limit::ALL);
        assert_eq!(RequestMethod::Status.to_limit_bit(), Limit::ALL);
    }

    #[test]
    fn get_maps_to_get_bit_only() {
        assert_eq!(RequestMethod::Get.to_limit_bit(), Limit::GET);
    }

    #[test]
    fn as_http_token_matches_method_name() {
        assert_eq!(RequestMethod::Get.as_http_token(), "GET");
        assert_eq!(RequestMethod::Delete.as_http_token(), "DELETE");
    }

    #[test]
    fn from_token_is_case_insensitive() {
        assert_eq!(Limit::from_token("get"), Some(Limit::GET));
        assert_eq!(Limit::from_token("IPP"), Some(Limit::IPP));
        assert_eq!(Limit::from_token("bogus"), None);
    }
}
