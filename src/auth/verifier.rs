// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Dispatch for §4.3 step 9: Basic, Digest, and BasicDigest credential
//! verification.

use std::path::Path;

use crate::{
    auth::{
        digest::{md5_final, md5_ha1},
        hash::{AuthOutcome, HostAuthenticator},
    },
    error::AuthError,
    identity::md5file,
    location::policy::AuthType,
};

/// Everything the verifier needs, gathered by the orchestrator from the
/// request, the matched Location, and the sealed configuration.
pub struct CredentialRequest<'a> {
    pub auth_type: AuthType,
    pub username: &'a str,
    /// Basic: the cleartext password. Digest: the client's computed
    /// response hash.
    pub secret: &'a str,
    /// The `nonce` sub-field of the Authorization header, required for
    /// Digest.
    pub nonce: Option<&'a str>,
    pub method: &'a str,
    pub uri: &'a str,
    pub realm: &'a str,
    /// The resolved client hostname; Digest nonces must equal this exactly
    /// (§4.3 step 9, server-side nonce binding).
    pub client_hostname: &'a str,
    /// Groups to search for an MD5 entry: the Location's own group names
    /// plus any `@SYSTEM` groups already expanded by the caller.
    pub candidate_groups: &'a [String],
    pub md5_password_file: Option<&'a Path>,
    pub authenticator: &'a dyn HostAuthenticator,
}

/// Verifies one credential presentation against `req.auth_type`. Every
/// failure path maps to [`AuthError`] — the orchestrator folds all of
/// them into `Decision::Unauthorized` (§7 "fail closed").
pub fn verify(req: &CredentialRequest<'_>) -> Result<(), AuthError> {
    if req.username.is_empty() {
        return Err(AuthError::NoUsername);
    }
    match req.auth_type {
        AuthType::None => Ok(()),
        AuthType::Basic => verify_basic(req),
        AuthType::Digest => verify_digest(req),
        AuthType::BasicDigest => verify_basic_digest(req),
    }
}

fn verify_basic(req: &CredentialRequest<'_>) -> Result<(), AuthError> {
    match req.authenticator.authenticate(req.username, req.secret) {
        AuthOutcome::Ok => Ok(()),
        AuthOutcome::UnknownUser => Err(AuthError::UnknownUser(req.username.to_string())),
        AuthOutcome::WrongPassword => Err(AuthError::WrongPassword),
        AuthOutcome::HostUnavailable => Err(AuthError::HostStartFailed),
    }
}

fn find_ha1(req: &CredentialRequest<'_>) -> Result<String, AuthError> {
    let path = req
        .md5_password_file
        .ok_or_else(|| AuthError::NoMd5Entry(req.username.to_string()))?;

    req.candidate_groups
        .iter()
        .find_map(|group| md5file::get_md5(path, req.username, Some(group)))
        .or_else(|| md5file::get_md5(path, req.username, None))
        .ok_or_else(|| AuthError::NoMd5Entry(req.username.to_string()))
}

fn verify_digest(req: &CredentialRequest<'_>) -> Result<(), AuthError> {
    let nonce = req.nonce.ok_or(AuthError::MissingSubField("nonce"))?;

    // Digest nonces are bound to the requesting client's hostname — any
    // other value is rejected before an MD5 lookup is even attempted.
    if nonce != req.client_hostname {
        return Err(AuthError::NonceMismatch {
            got: nonce.to_string(),
            want: req.client_hostname.to_string(),
        });
    }

    let ha1 = find_ha1(req)?;
    let expected_response = md5_final(nonce, req.method, req.uri, &ha1);
    if expected_response == req.secret {
        Ok(())
    } else {
        Err(AuthError::DigestMismatch)
    }
}

fn verify_basic_digest(req: &CredentialRequest<'_>) -> Result<(), AuthError> {
    let stored_ha1 = find_ha1(req)?;
    let computed = md5_ha1(req.username, req.realm, req.secret);
    if computed == stored_ha1 {
        Ok(())
    } else {
        Err(AuthError::DigestMismatch)
    }
}
