// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! `AuthEngine::is_authorized`: the top-level composition described in §4.3.

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};

use crate::{
    auth::{
        hash::HostAuthenticator,
        verifier::{CredentialRequest, verify},
    },
    cfg::config::ServerConfig,
    identity::{groups, passwd::UserDirectory},
    location::{
        limit::Limit,
        location::{Location, Principal},
        policy::{AuthLevel, AuthType, Encryption, Satisfy},
        table::LocationTable,
    },
    mask::{evaluator, interfaces::NetworkInterfaceProvider},
    orchestrator::{decision::Decision, request::ClientRequest},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HostVerdict {
    Allow,
    Deny,
}

/// The sealed, injected configuration plus the pluggable collaborators the
/// orchestrator composes (§9 "Global configuration", "Platform
/// authentication as a trait/interface").
pub struct AuthEngine {
    server_name: String,
    realm: String,
    default_auth_type: AuthType,
    system_groups: Vec<String>,
    md5_password_file: Option<PathBuf>,
    locations: LocationTable,
    directory: Arc<dyn UserDirectory>,
    authenticator: Box<dyn HostAuthenticator>,
    interfaces: Box<dyn NetworkInterfaceProvider>,
}

impl AuthEngine {
    pub fn new(
        config: &ServerConfig,
        directory: Arc<dyn UserDirectory>,
        authenticator: Box<dyn HostAuthenticator>,
        interfaces: Box<dyn NetworkInterfaceProvider>,
    ) -> Result<Self> {
        let locations = config
            .build_location_table()
            .context("failed to build location table from configuration")?;
        Ok(Self {
            server_name: config.server_name.clone(),
            realm: config.realm.clone(),
            default_auth_type: config.default_auth_type,
            system_groups: config.system_groups.clone(),
            md5_password_file: config.md5_password_file.clone(),
            locations,
            directory,
            authenticator,
            interfaces,
        })
    }

    /// The top-level decision function (§4.3). Never returns an error type
    /// to the caller — every failure path is folded into one of the four
    /// `Decision` variants, with diagnostic detail going to the log.
    pub fn is_authorized(&mut self, req: &ClientRequest) -> Decision {
        let Some(loc_id) = self.locations.find_best(&req.path, req.method) else {
            let decision = if req.client_hostname.eq_ignore_ascii_case("localhost")
                || req.client_hostname.eq_ignore_ascii_case(&self.server_name)
            {
                Decision::Ok
            } else {
                Decision::Forbidden
            };
            tracing::info!(path = %req.path, ?decision, "no matching location");
            return decision;
        };
        // Clone out of the table so `evaluate` doesn't hold a borrow of
        // `self.locations` across the `&mut self` calls it makes below.
        let loc = self
            .locations
            .get(loc_id)
            .expect("id from find_best is always valid")
            .clone();

        let decision = self.evaluate(&loc, req);
        tracing::info!(
            path = %req.path,
            location = %loc.path,
            ?decision,
            "authorization decision"
        );
        decision
    }

    fn evaluate(&mut self, loc: &Location, req: &ClientRequest) -> Decision {
        let auth = self.host_verdict(loc, req);

        if loc.satisfy == Satisfy::All && auth == HostVerdict::Deny {
            return Decision::Forbidden;
        }

        if loc.encryption >= Encryption::Required && !req.transport_secured {
            return Decision::UpgradeRequired;
        }

        if loc.level == AuthLevel::Anonymous
            || (loc.auth_type == AuthType::None && loc.names.is_empty())
        {
            return Decision::Ok;
        }

        if loc.auth_type == AuthType::None
            && loc.limit.contains(Limit::IPP)
            && req.ipp_requesting_user_name.is_some()
        {
            return Decision::Ok;
        }

        let username = match req.username.as_deref() {
            Some(u) if !u.is_empty() => u,
            _ => {
                return if loc.satisfy == Satisfy::All || auth == HostVerdict::Deny {
                    Decision::Unauthorized
                } else {
                    Decision::Ok
                };
            },
        };

        if !req.is_local_certificate() {
            let effective_type = if loc.auth_type == AuthType::None {
                self.default_auth_type
            } else {
                loc.auth_type
            };
            if effective_type != AuthType::None {
                if let Err(err) = self.verify_credentials(loc, req, username, effective_type) {
                    tracing::warn!(username, error = %err, "credential verification failed");
                    return Decision::Unauthorized;
                }
            }
        }

        self.authorize_principal(loc, username, req)
    }

    /// §4.3 step 3: host/IP verdict.
    fn host_verdict(&mut self, loc: &Location, req: &ClientRequest) -> HostVerdict {
        if req.client_hostname.eq_ignore_ascii_case("localhost") {
            return HostVerdict::Allow;
        }

        let allow_matches =
            evaluator::check(req.client_ip, &req.client_hostname, &loc.allow, &mut *self.interfaces);
        let deny_matches =
            evaluator::check(req.client_ip, &req.client_hostname, &loc.deny, &mut *self.interfaces);

        // The list named second in `order` is evaluated last and wins on a
        // tie where both lists match (§4.3 step 3, §9 "Open question —
        // overwrite semantics of allow/deny"): deliberate, not a
        // short-circuit bug.
        match loc.order {
            crate::location::policy::Order::DenyAllow => {
                let mut verdict = HostVerdict::Deny;
                if allow_matches {
                    verdict = HostVerdict::Allow;
                }
                verdict
            },
            crate::location::policy::Order::AllowDeny => {
                let mut verdict = HostVerdict::Allow;
                if deny_matches {
                    verdict = HostVerdict::Deny;
                }
                verdict
            },
        }
    }

    /// The groups an MD5-entry search should try for a Digest/BasicDigest
    /// lookup: every `@group` named directly, plus every configured system
    /// group when `@SYSTEM` is named (§4.3 step 9).
    fn candidate_groups(&self, loc: &Location) -> Vec<String> {
        let mut groups = Vec::new();
        for name in &loc.names {
            match name {
                Principal::Group(g) => groups.push(g.clone()),
                Principal::System => groups.extend(self.system_groups.iter().cloned()),
                Principal::Owner | Principal::User(_) => {},
            }
        }
        groups
    }

    fn verify_credentials(
        &self,
        loc: &Location,
        req: &ClientRequest,
        username: &str,
        auth_type: AuthType,
    ) -> Result<(), crate::error::AuthError> {
        let candidate_groups = self.candidate_groups(loc);
        let secret = req.secret.as_deref().unwrap_or("");
        let method = req.method.as_http_token();
        let credential_request = CredentialRequest {
            auth_type,
            username,
            secret,
            nonce: req.nonce.as_deref(),
            method,
            uri: &req.path,
            realm: &self.realm,
            client_hostname: &req.client_hostname,
            candidate_groups: &candidate_groups,
            md5_password_file: self.md5_password_file.as_deref(),
            authenticator: self.authenticator.as_ref(),
        };
        verify(&credential_request)
    }

    /// §4.3 step 10: authorization by principal, once credentials (if
    /// required) have already verified.
    fn authorize_principal(&self, loc: &Location, username: &str, req: &ClientRequest) -> Decision {
        if username.eq_ignore_ascii_case("root") {
            return Decision::Ok;
        }

        match loc.level {
            AuthLevel::User => {
                if loc.names.is_empty() {
                    return Decision::Ok;
                }
                if self.any_principal_matches(loc, username, req) {
                    Decision::Ok
                } else {
                    Decision::Unauthorized
                }
            },
            AuthLevel::Group if loc.auth_type == AuthType::Basic => {
                if self.any_group_matches(loc, username) {
                    Decision::Ok
                } else {
                    Decision::Unauthorized
                }
            },
            _ => Decision::Ok,
        }
    }

    fn any_principal_matches(&self, loc: &Location, username: &str, req: &ClientRequest) -> bool {
        loc.names.iter().any(|name| match name {
            Principal::Owner => req.owner.as_deref().is_some_and(|o| o.eq_ignore_ascii_case(username)),
            Principal::System => self.in_any_system_group(username),
            Principal::Group(g) => self.check_group(username, g),
            Principal::User(u) => u.eq_ignore_ascii_case(username),
        })
    }

    fn any_group_matches(&self, loc: &Location, username: &str) -> bool {
        loc.names.iter().any(|name| match name {
            Principal::Group(g) => self.check_group(username, g),
            Principal::System => self.in_any_system_group(username),
            Principal::Owner | Principal::User(_) => false,
        })
    }

    fn check_group(&self, username: &str, groupname: &str) -> bool {
        let Some(user) = self.directory.lookup_user(username) else {
            return false;
        };
        groups::check_group(
            username,
            &user,
            groupname,
            self.directory.as_ref(),
            self.md5_password_file.as_deref(),
        )
    }

    fn in_any_system_group(&self, username: &str) -> bool {
        let Some(user) = self.directory.lookup_user(username) else {
            return false;
        };
        groups::in_any_system_group(
            username,
            &user,
            &self.system_groups,
            self.directory.as_ref(),
            self.md5_password_file.as_deref(),
        )
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::net::Ipv4Addr;

    use super::*;
    use crate::{
        auth::hash::SystemAuthenticator,
        identity::passwd::{PasswdEntry, StaticUserDirectory},
        mask::interfaces::StaticInterfaceProvider,
        netaddr::ipv4_to_words4,
    };

    fn config_with_locations(yaml: &str) -> ServerConfig {
        serde_yaml::from_str(yaml).expect("valid test fixture yaml")
    }

    fn base_request(path: &str, ip: Ipv4Addr, hostname: &str) -> ClientRequest {
        ClientRequest {
            method: crate::location::limit::RequestMethod::Get,
            path: path.to_string(),
            client_ip: ipv4_to_words4(ip),
            client_hostname: hostname.to_string(),
            transport_secured: false,
            username: None,
            secret: None,
            auth_header: None,
            nonce: None,
            ipp_requesting_user_name: None,
            owner: None,
        }
    }

    fn engine_with(config: &ServerConfig, directory: Arc<dyn UserDirectory>) -> AuthEngine {
        let authenticator = Box::new(SystemAuthenticator::new(directory.clone()));
        AuthEngine::new(config, directory, authenticator, Box::new(StaticInterfaceProvider::default()))
            .expect("engine builds")
    }

    #[test]
    fn scenario_1_host_mask_allow_and_forbid() {
        let config = config_with_locations(
            r#"
ServerName: printd.example
Locations:
  - path: /admin
    order: "Deny,Allow"
    allow: ["127.0.0.1/255.255.255.255"]
    deny: ["0.0.0.0/0.0.0.0"]
    level: Anonymous
"#,
        );
        let dir: Arc<dyn UserDirectory> = Arc::new(StaticUserDirectory::new());
        let mut engine = engine_with(&config, dir);

        let allowed = base_request("/admin/index", Ipv4Addr::new(127, 0, 0, 1), "client");
        assert_eq!(engine.is_authorized(&allowed), Decision::Ok);

        let denied = base_request("/admin/index", Ipv4Addr::new(10, 0, 0, 1), "client");
        assert_eq!(engine.is_authorized(&denied), Decision::Forbidden);
    }

    #[test]
    fn scenario_2_basic_auth_user_level() {
        let stored = crate::auth::hash::crypt_md5("s3cret", "saltsalt");
        let config = config_with_locations(
            r#"
ServerName: printd.example
SystemGroups: ["sys"]
Locations:
  - path: /printers
    level: User
    type: Basic
    names: ["alice", "@SYSTEM"]
    satisfy: All
    allow: ["0.0.0.0/0.0.0.0"]
"#,
        );
        let dir: Arc<dyn UserDirectory> = Arc::new(StaticUserDirectory::new().with_user(PasswdEntry {
            name: "alice".to_string(),
            uid: 1001,
            gid: 1001,
            password_hash: Some(stored),
        }));
        let mut engine = engine_with(&config, dir);

        let mut ok_req = base_request("/printers/foo", Ipv4Addr::new(10, 0, 0, 5), "client");
        ok_req.username = Some("alice".to_string());
        ok_req.secret = Some("s3cret".to_string());
        assert_eq!(engine.is_authorized(&ok_req), Decision::Ok);

        let mut unknown_req = base_request("/printers/foo", Ipv4Addr::new(10, 0, 0, 5), "client");
        unknown_req.username = Some("mallory".to_string());
        unknown_req.secret = Some("whatever".to_string());
        assert_eq!(engine.is_authorized(&unknown_req), Decision::Unauthorized);
    }

    #[test]
    fn scenario_3_encryption_required() {
        let config = config_with_locations(
            r#"
ServerName: printd.example
Locations:
  - path: /
    encryption: Required
    level: Anonymous
"#,
        );
        let dir: Arc<dyn UserDirectory> = Arc::new(StaticUserDirectory::new());
        let mut engine = engine_with(&config, dir);

        let cleartext = base_request("/", Ipv4Addr::new(10, 0, 0, 1), "client");
        assert_eq!(engine.is_authorized(&cleartext), Decision::UpgradeRequired);

        let mut secured = cleartext.clone();
        secured.transport_secured = true;
        assert_eq!(engine.is_authorized(&secured), Decision::Ok);
    }

    #[test]
    fn scenario_4_digest_nonce_binding() {
        let mut f = tempfile::NamedTempFile::new().expect("tmp");
        let ha1 = crate::auth::digest::md5_ha1("bob", "CUPS", "hunter2");
        writeln!(f, "bob:lp:{ha1}").expect("write");

        let config = config_with_locations(&format!(
            r#"
ServerName: host.example
SystemGroups: ["lp"]
Md5PasswordFile: {:?}
Locations:
  - path: /jobs
    level: User
    type: Digest
    names: ["@SYSTEM"]
"#,
            f.path()
        ));
        let dir: Arc<dyn UserDirectory> = Arc::new(StaticUserDirectory::new().with_user(PasswdEntry {
            name: "bob".to_string(),
            uid: 1000,
            gid: 1000,
            password_hash: None,
        }));
        let mut engine = engine_with(&config, dir);

        let response = crate::auth::digest::md5_final("host.example", "GET", "/jobs", &ha1);
        let mut ok_req = base_request("/jobs", Ipv4Addr::new(10, 0, 0, 1), "host.example");
        ok_req.username = Some("bob".to_string());
        ok_req.secret = Some(response);
        ok_req.nonce = Some("host.example".to_string());
        assert_eq!(engine.is_authorized(&ok_req), Decision::Ok);

        let mut bad_nonce = ok_req.clone();
        bad_nonce.nonce = Some("evil".to_string());
        assert_eq!(engine.is_authorized(&bad_nonce), Decision::Unauthorized);
    }

    #[test]
    fn root_bypasses_principal_checks() {
        let config = config_with_locations(
            r#"
ServerName: printd.example
Locations:
  - path: /admin
    level: User
    type: Basic
    names: ["alice"]
"#,
        );
        let stored = crate::auth::hash::crypt_md5("toor", "saltsalt");
        let dir: Arc<dyn UserDirectory> = Arc::new(StaticUserDirectory::new().with_user(PasswdEntry {
            name: "root".to_string(),
            uid: 0,
            gid: 0,
            password_hash: Some(stored),
        }));
        let mut engine = engine_with(&config, dir);

        let mut req = base_request("/admin/conf", Ipv4Addr::new(10, 0, 0, 1), "client");
        req.username = Some("root".to_string());
        req.secret = Some("toor".to_string());
        assert_eq!(engine.is_authorized(&req), Decision::Ok);
    }

    #[test]
    fn no_matching_location_falls_back_to_server_name_check() {
        let config = config_with_locations(
            r#"
ServerName: printd.example
Locations:
  - path: /printers
"#,
        );
        let dir: Arc<dyn UserDirectory> = Arc::new(StaticUserDirectory::new());
        let mut engine = engine_with(&config, dir);

        let req = base_request("/unmapped", Ipv4Addr::new(10, 0, 0, 1), "printd.example");
        assert_eq!(engine.is_authorized(&req), Decision::Ok);

        let other = base_request("/unmapped", Ipv4Addr::new(10, 0, 0, 1), "evil.example");
        assert_eq!(engine.is_authorized(&other), Decision::Forbidden);
    }
}
