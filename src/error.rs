// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Leaf error types raised synchronously by the engine, as opposed to the
//! `anyhow::Result` chains used for configuration loading and I/O.

use thiserror::Error;

/// A malformed authmask or principal token rejected at configuration time.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid host/IP mask {0:?}: {1}")]
    InvalidMask(String, &'static str),
    #[error("invalid principal {0:?}: {1}")]
    InvalidPrincipal(String, &'static str),
    #[error("location path {0:?} must start with '/'")]
    PathMustBeAbsolute(String),
    #[error("location names @SYSTEM but no system_groups are configured")]
    SystemGroupsEmpty,
}

/// Conditions the credential verifier can raise before the orchestrator
/// folds them into a [`crate::orchestrator::decision::Decision`]. Every
/// variant here maps to `Unauthorized` — see §7 of the design document.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("no username presented")]
    NoUsername,
    #[error("unknown user {0:?}")]
    UnknownUser(String),
    #[error("wrong password")]
    WrongPassword,
    #[error("digest nonce {got:?} does not match client hostname {want:?}")]
    NonceMismatch { got: String, want: String },
    #[error("no MD5 password-file entry for user {0:?}")]
    NoMd5Entry(String),
    #[error("digest response mismatch")]
    DigestMismatch,
    #[error("missing Authorization sub-field {0:?}")]
    MissingSubField(&'static str),
    #[error("pluggable authentication host failed to start")]
    HostStartFailed,
}
