// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! The `passwd.md5` fallback credential store (§4.4): `user:group:md5hex`
//! lines, re-read on every lookup (§5 — no caching).

use std::{fs, path::Path};

/// One parsed `passwd.md5` record.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Md5Entry {
    user: String,
    group: String,
    md5_hex: String,
}

fn parse_line(line: &str) -> Option<Md5Entry> {
    let mut parts = line.splitn(3, ':');
    let user = parts.next()?;
    let group = parts.next()?;
    let md5_hex = parts.next()?;

    if user.len() > 32 || group.len() > 32 || md5_hex.len() > 32 {
        return None;
    }
    if user.is_empty() || md5_hex.is_empty() {
        return None;
    }

    Some(Md5Entry {
        user: user.to_string(),
        group: group.to_string(),
        md5_hex: md5_hex.to_string(),
    })
}

fn read_entries(path: &Path) -> Vec<Md5Entry> {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(err) => {
            tracing::error!(path = %path.display(), error = %err, "failed to open passwd.md5");
            return Vec::new();
        },
    };

    let mut entries = Vec::new();
    for (lineno, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match parse_line(line) {
            Some(entry) => entries.push(entry),
            None => {
                tracing::warn!(
                    path = %path.display(),
                    line = lineno + 1,
                    "malformed passwd.md5 entry, skipping"
                );
            },
        }
    }
    entries
}

/// Returns the first entry whose user matches exactly and whose group is
/// absent-on-the-caller-side or matches exactly (§4.4). Returns the
/// 32-character lowercase hex HA1.
pub fn get_md5(path: &Path, user: &str, group: Option<&str>) -> Option<String> {
    read_entries(path)
        .into_iter()
        .find(|e| e.user == user && group.is_none_or(|g| e.group == g))
        .map(|e| e.md5_hex)
}

/// Whether `passwd.md5` carries an entry binding `user` to `group`,
/// regardless of the stored hash value. Used by [`crate::identity::groups::check_group`]
/// to let the MD5 file define synthetic groups the system does not know
/// about.
pub fn has_group_entry(path: &Path, user: &str, group: &str) -> bool {
    read_entries(path)
        .into_iter()
        .any(|e| e.user == user && e.group == group)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_fixture(contents: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().expect("create temp file");
        f.write_all(contents.as_bytes()).expect("write fixture");
        f
    }

    #[test]
    fn finds_first_matching_user_and_group() {
        let f = write_fixture("bob:lp:0123456789abcdef0123456789abcdef\nbob:sys:ffffffffffffffffffffffffffffffff\n");
        let hash = get_md5(f.path(), "bob", Some("lp")).expect("found");
        assert_eq!(hash, "0123456789abcdef0123456789abcdef");
    }

    #[test]
    fn group_none_matches_first_user_line() {
        let f = write_fixture("bob:lp:0123456789abcdef0123456789abcdef\n");
        assert!(get_md5(f.path(), "bob", None).is_some());
    }

    #[test]
    fn unknown_user_returns_none() {
        let f = write_fixture("bob:lp:0123456789abcdef0123456789abcdef\n");
        assert!(get_md5(f.path(), "mallory", None).is_none());
    }

    #[test]
    fn malformed_lines_are_skipped_not_fatal() {
        let f = write_fixture("garbage-line-no-colons\nbob:lp:0123456789abcdef0123456789abcdef\n");
        assert!(get_md5(f.path(), "bob", Some("lp")).is_some());
    }

    #[test]
    fn missing_file_returns_none_without_panicking() {
        assert!(get_md5(Path::new("/nonexistent/passwd.md5"), "bob", None).is_none());
    }

    #[test]
    fn has_group_entry_finds_synthetic_group() {
        let f = write_fixture("carol:printops:0123456789abcdef0123456789abcdef\n");
        assert!(has_group_entry(f.path(), "carol", "printops"));
        assert!(!has_group_entry(f.path(), "carol", "lp"));
    }
}
