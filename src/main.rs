// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::{net::Ipv4Addr, sync::Arc};

use anyhow::{Context, Result};
use printd_authcore::{
    auth::hash::SystemAuthenticator,
    cfg::{cli::resolve_config_path, config::ServerConfig, logger::init_logger},
    identity::passwd::StaticUserDirectory,
    location::limit::RequestMethod,
    mask::interfaces::StaticInterfaceProvider,
    netaddr::ipv4_to_words4,
    orchestrator::{engine::AuthEngine, request::ClientRequest},
};
use tracing::info;

/// Demonstrates wiring a [`ServerConfig`] into an [`AuthEngine`] and
/// running a single synthetic request through `is_authorized`. Real
/// daemons wire `ClientRequest` from their own HTTP/IPP front end instead.
fn main() -> Result<()> {
    let _guard = init_logger("config_logger.yaml").context("failed to initialize logger")?;

    let config_path =
        resolve_config_path("printd.yaml").context("failed to resolve config path")?;
    let config = ServerConfig::load_from_file(&config_path).context("failed to load config")?;

    let directory: Arc<dyn printd_authcore::identity::passwd::UserDirectory> =
        Arc::new(StaticUserDirectory::new());
    let authenticator = Box::new(SystemAuthenticator::new(directory.clone()));
    let interfaces = Box::new(StaticInterfaceProvider::default());

    let mut engine = AuthEngine::new(&config, directory, authenticator, interfaces)
        .context("failed to build authorization engine")?;

    let request = ClientRequest {
        method: RequestMethod::Get,
        path: "/".to_string(),
        client_ip: ipv4_to_words4(Ipv4Addr::new(127, 0, 0, 1)),
        client_hostname: "localhost".to_string(),
        transport_secured: false,
        username: None,
        secret: None,
        auth_header: None,
        nonce: None,
        ipp_requesting_user_name: None,
        owner: None,
    };

    let decision = engine.is_authorized(&request);
    info!(?decision, status = decision.status_code(), "demo request evaluated");

    Ok(())
}
