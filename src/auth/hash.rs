// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Portable MD5-crypt (`$1$salt$...`) plus the pluggable-host-authentication
//! seam (§9 "Platform authentication as a trait/interface").

use std::ffi::{CStr, CString};

use md5::{Digest as _, Md5};

use crate::identity::passwd::UserDirectory;

const TO64: &[u8; 64] = b"./0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

fn to64(mut value: u32, chars: usize, out: &mut String) {
    for _ in 0..chars {
        out.push(TO64[(value & 0x3f) as usize] as char);
        value >>= 6;
    }
}

/// The standard FreeBSD `crypt_md5` stretch (§4.5). `salt` is the bare
/// segment between the `$1$` tag and the trailing `$` — at most 8 bytes,
/// already trimmed by the caller.
pub fn crypt_md5(password: &str, salt: &str) -> String {
    let pw = password.as_bytes();
    let salt = salt.as_bytes();

    let mixed = {
        let mut ctx = Md5::new();
        ctx.update(pw);
        ctx.update(salt);
        ctx.update(pw);
        ctx.finalize()
    };

    let mut ctx1 = Md5::new();
    ctx1.update(pw);
    ctx1.update(b"$1$");
    ctx1.update(salt);

    let mut remaining = pw.len();
    while remaining > 0 {
        let take = remaining.min(16);
        ctx1.update(&mixed[..take]);
        remaining -= take;
    }

    let mut i = pw.len();
    while i > 0 {
        if i & 1 != 0 {
            ctx1.update([0u8]);
        } else {
            ctx1.update(&pw[..1]);
        }
        i >>= 1;
    }
    let mut digest = ctx1.finalize();

    for i in 0..1000 {
        let mut ctx2 = Md5::new();
        if i & 1 != 0 {
            ctx2.update(pw);
        } else {
            ctx2.update(digest);
        }
        if i % 3 != 0 {
            ctx2.update(salt);
        }
        if i % 7 != 0 {
            ctx2.update(pw);
        }
        if i & 1 != 0 {
            ctx2.update(digest);
        } else {
            ctx2.update(pw);
        }
        digest = ctx2.finalize();
    }

    let d = digest.as_slice();
    let mut encoded = String::with_capacity(22);
    to64(
        ((d[0] as u32) << 16) | ((d[6] as u32) << 8) | d[12] as u32,
        4,
        &mut encoded,
    );
    to64(
        ((d[1] as u32) << 16) | ((d[7] as u32) << 8) | d[13] as u32,
        4,
        &mut encoded,
    );
    to64(
        ((d[2] as u32) << 16) | ((d[8] as u32) << 8) | d[14] as u32,
        4,
        &mut encoded,
    );
    to64(
        ((d[3] as u32) << 16) | ((d[9] as u32) << 8) | d[15] as u32,
        4,
        &mut encoded,
    );
    to64(
        ((d[4] as u32) << 16) | ((d[10] as u32) << 8) | d[5] as u32,
        4,
        &mut encoded,
    );
    to64(d[11] as u32, 2, &mut encoded);

    format!("$1${}${}", std::str::from_utf8(salt).unwrap_or(""), encoded)
}

/// Extracts the salt segment from a stored `$1$salt$hash` value.
fn md5_salt(stored: &str) -> Option<&str> {
    let rest = stored.strip_prefix("$1$")?;
    let end = rest.find('$')?;
    Some(&rest[..end.min(8)])
}

/// Compares `password` against a stored hash, dispatching on whether it
/// carries the `$1$` MD5-crypt tag or a traditional DES-crypt hash.
fn crypt_matches(password: &str, stored: &str) -> bool {
    if stored.is_empty() {
        return false;
    }
    if let Some(salt) = md5_salt(stored) {
        return crypt_md5(password, salt) == stored;
    }
    traditional_crypt(password, stored)
        .map(|computed| computed == stored)
        .unwrap_or(false)
}

#[cfg(unix)]
fn traditional_crypt(password: &str, salt_and_hash: &str) -> Option<String> {
    let salt = &salt_and_hash[..salt_and_hash.len().min(2)];
    let key = CString::new(password).ok()?;
    let salt = CString::new(salt).ok()?;
    // SAFETY: both arguments are valid NUL-terminated C strings; `crypt`
    // returns either NULL or a pointer into a thread-local static buffer
    // that we copy out of immediately.
    let result = unsafe { libc::crypt(key.as_ptr(), salt.as_ptr()) };
    if result.is_null() {
        return None;
    }
    // SAFETY: `result` is non-null and NUL-terminated per `crypt(3)`.
    let s = unsafe { CStr::from_ptr(result) };
    s.to_str().ok().map(|s| s.to_string())
}

#[cfg(not(unix))]
fn traditional_crypt(_password: &str, _salt_and_hash: &str) -> Option<String> {
    None
}

/// What a [`HostAuthenticator`] decided about one Basic-auth attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOutcome {
    Ok,
    UnknownUser,
    WrongPassword,
    HostUnavailable,
}

/// The pluggable Basic-auth seam (§9): the orchestrator only ever talks to
/// this trait, never to `crypt`/PAM/etc. directly.
pub trait HostAuthenticator: Send + Sync {
    fn authenticate(&self, username: &str, password: &str) -> AuthOutcome;
}

/// The always-available fallback: system passwd/shadow via [`UserDirectory`]
/// plus `crypt`-compare. Embedding daemons may additionally offer a PAM (or
/// similar) implementation of [`HostAuthenticator`] ahead of this one.
/// Holds its directory behind an `Arc` rather than a borrow so it can be
/// boxed into a long-lived orchestrator alongside the same directory used
/// for group/identity lookups.
pub struct SystemAuthenticator {
    directory: std::sync::Arc<dyn UserDirectory>,
}

impl SystemAuthenticator {
    pub fn new(directory: std::sync::Arc<dyn UserDirectory>) -> Self {
        Self { directory }
    }
}

impl HostAuthenticator for SystemAuthenticator {
    fn authenticate(&self, username: &str, password: &str) -> AuthOutcome {
        let Some(user) = self.directory.lookup_user(username) else {
            return AuthOutcome::UnknownUser;
        };
        match user.password_hash.as_deref() {
            Some(hash) if !hash.is_empty() && crypt_matches(password, hash) => AuthOutcome::Ok,
            _ => AuthOutcome::WrongPassword,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::passwd::{PasswdEntry, StaticUserDirectory};

    #[test]
    fn crypt_md5_is_deterministic_and_34_chars() {
        let h1 = crypt_md5("secret", "abcdefgh");
        let h2 = crypt_md5("secret", "abcdefgh");
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 3 + 8 + 1 + 22);
        assert!(h1.starts_with("$1$abcdefgh$"));
    }

    #[test]
    fn crypt_md5_differs_with_salt() {
        let h1 = crypt_md5("secret", "aaaaaaaa");
        let h2 = crypt_md5("secret", "bbbbbbbb");
        assert_ne!(h1, h2);
    }

    #[test]
    fn crypt_md5_differs_with_password() {
        let h1 = crypt_md5("secret", "abcdefgh");
        let h2 = crypt_md5("hunter2", "abcdefgh");
        assert_ne!(h1, h2);
    }

    #[test]
    fn system_authenticator_accepts_matching_md5_password() {
        let stored = crypt_md5("hunter2", "saltsalt");
        let dir = StaticUserDirectory::new().with_user(PasswdEntry {
            name: "bob".to_string(),
            uid: 1000,
            gid: 1000,
            password_hash: Some(stored),
        });
        let auth = SystemAuthenticator::new(std::sync::Arc::new(dir));
        assert_eq!(auth.authenticate("bob", "hunter2"), AuthOutcome::Ok);
        assert_eq!(auth.authenticate("bob", "wrong"), AuthOutcome::WrongPassword);
    }

    #[test]
    fn system_authenticator_rejects_unknown_user() {
        let dir = StaticUserDirectory::new();
        let auth = SystemAuthenticator::new(std::sync::Arc::new(dir));
        assert_eq!(auth.authenticate("nobody", "x"), AuthOutcome::UnknownUser);
    }

    #[test]
    fn system_authenticator_rejects_blank_stored_password() {
        let dir = StaticUserDirectory::new().with_user(PasswdEntry {
            name: "bob".to_string(),
            uid: 1000,
            gid: 1000,
            password_hash: Some(String::new()),
        });
        let auth = SystemAuthenticator::new(std::sync::Arc::new(dir));
        assert_eq!(auth.authenticate("bob", ""), AuthOutcome::WrongPassword);
    }
}
