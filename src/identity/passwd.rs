// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! The platform user database is an external collaborator (§1): this
//! module defines the [`UserDirectory`] trait the rest of the engine
//! consults, plus a `libc`-backed implementation that pairs every
//! `getpwnam_r`/`getgrnam_r`/`getspnam_r` call with its own scoped buffer
//! (§5 resource discipline — there is no separate "end" call to forget in
//! the reentrant API).

use std::collections::HashMap;
use std::ffi::{CStr, CString};

/// One `/etc/passwd` (+ `/etc/shadow`, if readable) record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswdEntry {
    pub name: String,
    pub uid: u32,
    pub gid: u32,
    /// The crypt-hashed password, from shadow if present, else from the
    /// passwd record itself. `None`/blank must never authenticate (§4.3
    /// step 9 Basic path).
    pub password_hash: Option<String>,
}

/// One `/etc/group` record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupEntry {
    pub name: String,
    pub gid: u32,
    pub members: Vec<String>,
}

/// Platform user/group database lookup. The orchestrator and credential
/// verifier only ever see this trait — see "Platform authentication as a
/// trait/interface" in the design notes.
pub trait UserDirectory: Send + Sync {
    fn lookup_user(&self, username: &str) -> Option<PasswdEntry>;
    fn lookup_group(&self, groupname: &str) -> Option<GroupEntry>;
}

/// An in-memory directory for tests and for daemons that want to keep
/// their own identity store rather than shelling out to the OS.
#[derive(Debug, Default, Clone)]
pub struct StaticUserDirectory {
    users: HashMap<String, PasswdEntry>,
    groups: HashMap<String, GroupEntry>,
}

impl StaticUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, entry: PasswdEntry) -> Self {
        self.users.insert(entry.name.to_ascii_lowercase(), entry);
        self
    }

    pub fn with_group(mut self, entry: GroupEntry) -> Self {
        self.groups.insert(entry.name.to_ascii_lowercase(), entry);
        self
    }
}

impl UserDirectory for StaticUserDirectory {
    fn lookup_user(&self, username: &str) -> Option<PasswdEntry> {
        self.users.get(&username.to_ascii_lowercase()).cloned()
    }

    fn lookup_group(&self, groupname: &str) -> Option<GroupEntry> {
        self.groups.get(&groupname.to_ascii_lowercase()).cloned()
    }
}

/// Looks the user/group database up through the OS via the POSIX
/// reentrant `_r` calls. Unix-only; the embedding daemon supplies an
/// alternative `UserDirectory` on platforms without one (e.g. via a
/// pluggable authentication host).
#[cfg(unix)]
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemUserDirectory;

#[cfg(unix)]
impl UserDirectory for SystemUserDirectory {
    fn lookup_user(&self, username: &str) -> Option<PasswdEntry> {
        let hash = system_shadow_hash(username);
        let (uid, gid, pw_hash) = system_getpwnam(username)?;
        Some(PasswdEntry {
            name: username.to_string(),
            uid,
            gid,
            password_hash: hash.or(pw_hash),
        })
    }

    fn lookup_group(&self, groupname: &str) -> Option<GroupEntry> {
        system_getgrnam(groupname)
    }
}

#[cfg(unix)]
fn system_getpwnam(username: &str) -> Option<(u32, u32, Option<String>)> {
    let cname = CString::new(username).ok()?;
    let mut buf = vec![0i8; initial_buf_size()];
    let mut pwd: libc::passwd = unsafe { std::mem::zeroed() };
    let mut result: *mut libc::passwd = std::ptr::null_mut();

    loop {
        // SAFETY: `buf` is sized and passed with its exact length; `pwd`
        // is populated in place and `result` aliases it only on success.
        let rc = unsafe {
            libc::getpwnam_r(
                cname.as_ptr(),
                &mut pwd,
                buf.as_mut_ptr(),
                buf.len(),
                &mut result,
            )
        };
        if rc == libc::ERANGE {
            buf.resize(buf.len() * 2, 0);
            continue;
        }
        if rc != 0 || result.is_null() {
            return None;
        }
        break;
    }

    let pw_passwd = unsafe { CStr::from_ptr(pwd.pw_passwd) }
        .to_str()
        .ok()
        .map(|s| s.to_string())
        .filter(|s| !s.is_empty());

    Some((pwd.pw_uid, pwd.pw_gid, pw_passwd))
}

#[cfg(unix)]
fn system_getgrnam(groupname: &str) -> Option<GroupEntry> {
    let cname = CString::new(groupname).ok()?;
    let mut buf = vec![0i8; initial_buf_size()];
    let mut grp: libc::group = unsafe { std::mem::zeroed() };
    let mut result: *mut libc::group = std::ptr::null_mut();

    loop {
        // SAFETY: see `system_getpwnam`.
        let rc = unsafe {
            libc::getgrnam_r(
                cname.as_ptr(),
                &mut grp,
                buf.as_mut_ptr(),
                buf.len(),
                &mut result,
            )
        };
        if rc == libc::ERANGE {
            buf.resize(buf.len() * 2, 0);
            continue;
        }
        if rc != 0 || result.is_null() {
            return None;
        }
        break;
    }

    let mut members = Vec::new();
    // SAFETY: `gr_mem` is a NULL-terminated array of NUL-terminated C
    // strings, valid as long as `buf` (which backs `grp`) is alive.
    unsafe {
        let mut cursor = grp.gr_mem;
        while !(*cursor).is_null() {
            if let Ok(s) = CStr::from_ptr(*cursor).to_str() {
                members.push(s.to_string());
            }
            cursor = cursor.add(1);
        }
    }

    let name = unsafe { CStr::from_ptr(grp.gr_name) }
        .to_str()
        .ok()?
        .to_string();

    Some(GroupEntry {
        name,
        gid: grp.gr_gid,
        members,
    })
}

#[cfg(unix)]
fn system_shadow_hash(username: &str) -> Option<String> {
    let cname = CString::new(username).ok()?;
    let mut buf = vec![0i8; initial_buf_size()];
    let mut spwd: libc::spwd = unsafe { std::mem::zeroed() };
    let mut result: *mut libc::spwd = std::ptr::null_mut();

    loop {
        // SAFETY: see `system_getpwnam`. Absence of a readable shadow
        // database (permission denied, no NSS shadow module) is not an
        // error here — the passwd `pw_passwd` field is the fallback.
        let rc = unsafe {
            libc::getspnam_r(
                cname.as_ptr(),
                &mut spwd,
                buf.as_mut_ptr(),
                buf.len(),
                &mut result,
            )
        };
        if rc == libc::ERANGE {
            buf.resize(buf.len() * 2, 0);
            continue;
        }
        if rc != 0 || result.is_null() {
            return None;
        }
        break;
    }

    unsafe { CStr::from_ptr(spwd.sp_pwdp) }
        .to_str()
        .ok()
        .map(|s| s.to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(unix)]
fn initial_buf_size() -> usize {
    let hint = unsafe { libc::sysconf(libc::_SC_GETPW_R_SIZE_MAX) };
    if hint > 0 { hint as usize } else { 16 * 1024 }
}
