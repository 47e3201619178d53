// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::path::Path;

use crate::identity::{
    md5file,
    passwd::{PasswdEntry, UserDirectory},
};

/// `check_group(user, passwd_entry, groupname)` from §4.3: true when the
/// system group database says `user` belongs to `groupname` (by member
/// list or primary gid), or when `passwd.md5` carries a synthetic
/// `user:groupname:*` entry.
pub fn check_group(
    username: &str,
    user: &PasswdEntry,
    groupname: &str,
    directory: &dyn UserDirectory,
    md5_path: Option<&Path>,
) -> bool {
    if let Some(group) = directory.lookup_group(groupname) {
        let is_member = group
            .members
            .iter()
            .any(|m| m.eq_ignore_ascii_case(username));
        if is_member || group.gid == user.gid {
            return true;
        }
    }

    md5_path.is_some_and(|path| md5file::has_group_entry(path, username, groupname))
}

/// `@SYSTEM` expansion: true when `user` belongs to any of the configured
/// administrative groups.
pub fn in_any_system_group(
    username: &str,
    user: &PasswdEntry,
    system_groups: &[String],
    directory: &dyn UserDirectory,
    md5_path: Option<&Path>,
) -> bool {
    system_groups
        .iter()
        .any(|g| check_group(username, user, g, directory, md5_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::passwd::{GroupEntry, StaticUserDirectory};

    fn user(gid: u32) -> PasswdEntry {
        PasswdEntry {
            name: "bob".to_string(),
            uid: 1001,
            gid,
            password_hash: None,
        }
    }

    #[test]
    fn check_group_true_via_member_list() {
        let dir = StaticUserDirectory::new().with_group(GroupEntry {
            name: "lp".to_string(),
            gid: 9,
            members: vec!["bob".to_string()],
        });
        assert!(check_group("bob", &user(1001), "lp", &dir, None));
    }

    #[test]
    fn check_group_true_via_primary_gid() {
        let dir = StaticUserDirectory::new().with_group(GroupEntry {
            name: "lp".to_string(),
            gid: 1001,
            members: vec![],
        });
        assert!(check_group("bob", &user(1001), "lp", &dir, None));
    }

    #[test]
    fn check_group_false_when_group_unknown_and_no_md5_entry() {
        let dir = StaticUserDirectory::new();
        assert!(!check_group("bob", &user(1001), "lp", &dir, None));
    }

    #[test]
    fn check_group_falls_back_to_md5_synthetic_group() {
        use std::io::Write;
        let mut f = tempfile::NamedTempFile::new().expect("tmp");
        writeln!(f, "bob:printops:0123456789abcdef0123456789abcdef").expect("write");

        let dir = StaticUserDirectory::new();
        assert!(check_group(
            "bob",
            &user(1001),
            "printops",
            &dir,
            Some(f.path())
        ));
    }

    #[test]
    fn in_any_system_group_checks_all_configured_groups() {
        let dir = StaticUserDirectory::new().with_group(GroupEntry {
            name: "sys".to_string(),
            gid: 7,
            members: vec!["bob".to_string()],
        });
        let groups = vec!["wheel".to_string(), "sys".to_string()];
        assert!(in_any_system_group("bob", &user(1001), &groups, &dir, None));
    }
}
