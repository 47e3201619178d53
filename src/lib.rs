// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Authorization core for a print-server daemon.
//!
//! Given a client (address, hostname, presented credentials) and a request
//! (path, HTTP method), [`orchestrator::engine::AuthEngine::is_authorized`]
//! decides whether to allow, challenge, forbid, or require an encrypted
//! transport. The crate composes a longest-prefix location matcher, an
//! order-sensitive allow/deny mask evaluator, pluggable credential
//! verification, and system/MD5-file identity resolution.

pub mod auth;
pub mod cfg;
pub mod error;
pub mod identity;
pub mod location;
pub mod mask;
pub mod netaddr;
pub mod orchestrator;
