// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! End-to-end scenarios driving [`AuthEngine::is_authorized`] through the
//! public crate API, starting from a YAML configuration document rather
//! than hand-built `Location`s.

use std::{io::Write, net::Ipv4Addr, sync::Arc};

use printd_authcore::{
    auth::hash::SystemAuthenticator,
    cfg::config::ServerConfig,
    identity::passwd::{PasswdEntry, StaticUserDirectory, UserDirectory},
    location::limit::RequestMethod,
    mask::interfaces::StaticInterfaceProvider,
    netaddr::ipv4_to_words4,
    orchestrator::{decision::Decision, engine::AuthEngine, request::ClientRequest},
};

const CONFIG_YAML: &str = r#"
ServerName: printd.example.com
Realm: CUPS
SystemGroups: ["sys"]
Locations:
  - path: /
    level: Anonymous

  - path: /admin
    level: Group
    type: Basic
    satisfy: All
    order: "Deny,Allow"
    allow: ["127.0.0.1/255.255.255.255"]
    deny: ["0.0.0.0/0.0.0.0"]
    names: ["@SYSTEM"]

  - path: /admin/conf
    level: Group
    type: Basic
    encryption: Required
    names: ["@SYSTEM"]

  - path: /printers/secret
    level: User
    type: Basic
    names: ["alice"]
"#;

fn base_request(path: &str, ip: Ipv4Addr, hostname: &str) -> ClientRequest {
    ClientRequest {
        method: RequestMethod::Get,
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

fn build_engine(config: &ServerConfig, directory: Arc<dyn UserDirectory>) -> AuthEngine {
    let authenticator = Box::new(SystemAuthenticator::new(directory.clone()));
    AuthEngine::new(
        config,
        directory,
        authenticator,
        Box::new(StaticInterfaceProvider::default()),
    )
    .expect("engine builds from a valid config")
}

#[test]
fn anonymous_root_is_always_ok() {
    let mut config: ServerConfig = serde_yaml::from_str(CONFIG_YAML).expect("valid yaml");
    config.validate_and_normalize().expect("valid config");
    let directory: Arc<dyn UserDirectory> = Arc::new(StaticUserDirectory::new());
    let mut engine = build_engine(&config, directory);

    let req = base_request("/index.html", Ipv4Addr::new(203, 0, 113, 9), "client.example.com");
    assert_eq!(engine.is_authorized(&req), Decision::Ok);
}

#[test]
fn admin_host_mask_allows_loopback_and_forbids_everyone_else() {
    let mut config: ServerConfig = serde_yaml::from_str(CONFIG_YAML).expect("valid yaml");
    config.validate_and_normalize().expect("valid config");
    let sys_user = PasswdEntry {
        name: "carol".to_string(),
        uid: 1002,
        gid: 1002,
        password_hash: Some(printd_authcore::auth::hash::crypt_md5("adminpw", "saltsalt")),
    };
    let directory: Arc<dyn UserDirectory> =
        Arc::new(StaticUserDirectory::new().with_user(sys_user).with_group(
            printd_authcore::identity::passwd::GroupEntry {
                name: "sys".to_string(),
                gid: 1002,
                members: vec!["carol".to_string()],
            },
        ));
    let mut engine = build_engine(&config, directory);

    let mut allowed = base_request("/admin/printers.conf", Ipv4Addr::new(127, 0, 0, 1), "localhost");
    allowed.username = Some("carol".to_string());
    allowed.secret = Some("adminpw".to_string());
    assert_eq!(engine.is_authorized(&allowed), Decision::Ok);

    let mut rejected = base_request("/admin/printers.conf", Ipv4Addr::new(198, 51, 100, 4), "outsider.example.com");
    rejected.username = Some("carol".to_string());
    rejected.secret = Some("adminpw".to_string());
    assert_eq!(engine.is_authorized(&rejected), Decision::Forbidden);
}

#[test]
fn admin_conf_requires_encrypted_transport() {
    let mut config: ServerConfig = serde_yaml::from_str(CONFIG_YAML).expect("valid yaml");
    config.validate_and_normalize().expect("valid config");
    let directory: Arc<dyn UserDirectory> = Arc::new(StaticUserDirectory::new());
    let mut engine = build_engine(&config, directory);

    let cleartext = base_request("/admin/conf/printers.conf", Ipv4Addr::new(127, 0, 0, 1), "localhost");
    assert_eq!(engine.is_authorized(&cleartext), Decision::UpgradeRequired);

    let mut secured = cleartext.clone();
    secured.transport_secured = true;
    // Group-level auth with no presented credentials and no host satisfy
    // issue still needs Basic verification, so this stays Unauthorized
    // until credentials are supplied.
    assert_eq!(engine.is_authorized(&secured), Decision::Unauthorized);
}

#[test]
fn ppd_suffix_is_stripped_before_prefix_matching() {
    let mut config: ServerConfig = serde_yaml::from_str(CONFIG_YAML).expect("valid yaml");
    config.validate_and_normalize().expect("valid config");
    let stored = printd_authcore::auth::hash::crypt_md5("hunter2", "saltsalt");
    let directory: Arc<dyn UserDirectory> = Arc::new(StaticUserDirectory::new().with_user(PasswdEntry {
        name: "alice".to_string(),
        uid: 1001,
        gid: 1001,
        password_hash: Some(stored),
    }));
    let mut engine = build_engine(&config, directory);

    let mut req = base_request("/printers/secret.ppd", Ipv4Addr::new(10, 0, 0, 5), "client");
    req.username = Some("alice".to_string());
    req.secret = Some("hunter2".to_string());
    assert_eq!(engine.is_authorized(&req), Decision::Ok);

    let mut wrong_password = req.clone();
    wrong_password.secret = Some("wrong".to_string());
    assert_eq!(engine.is_authorized(&wrong_password), Decision::Unauthorized);
}

#[test]
fn load_from_file_round_trips_through_the_engine() {
    let mut file = tempfile::NamedTempFile::new().expect("create temp config");
    file.write_all(CONFIG_YAML.as_bytes()).expect("write fixture");

    let config = ServerConfig::load_from_file(file.path()).expect("loads and validates");
    let directory: Arc<dyn UserDirectory> = Arc::new(StaticUserDirectory::new());
    let mut engine = build_engine(&config, directory);

    let req = base_request("/", Ipv4Addr::new(127, 0, 0, 1), "localhost");
    assert_eq!(engine.is_authorized(&req), Decision::Ok);
}
