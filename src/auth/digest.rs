// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! The HTTP digest helpers (`md5_ha1`, `md5_final`) are collaborators per
//! the design notes — simple, well-known compositions of MD5, kept here
//! because no external crate in this stack provides them.

use md5::{Digest as _, Md5};

fn md5_hex(input: &str) -> String {
    let digest = Md5::new_with_prefix(input).finalize();
    hex::encode(digest)
}

/// `HA1 = MD5(username:realm:password)`, lowercase hex (§4.3 BasicDigest
/// path, §6 `md5_ha1`).
pub fn md5_ha1(username: &str, realm: &str, password: &str) -> String {
    md5_hex(&format!("{username}:{realm}:{password}"))
}

/// `response = MD5(ha1:nonce:MD5(method:uri))`, lowercase hex (§4.3 Digest
/// path, §6 `md5_final`). No `qop`/nonce-count — the nonce here is bound
/// to the client hostname, not a server-generated challenge value.
pub fn md5_final(nonce: &str, method: &str, uri: &str, ha1: &str) -> String {
    let ha2 = md5_hex(&format!("{method}:{uri}"));
    md5_hex(&format!("{ha1}:{nonce}:{ha2}"))
}
