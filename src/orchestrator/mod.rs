// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! The top-level `is_authorized` composition (§4.3): location lookup, host
//! mask verdict, encryption requirement, credential verification, and
//! principal authorization.

/// `Decision` — the four outcomes the HTTP layer understands.
pub mod decision;
/// `AuthEngine` and `is_authorized`.
pub mod engine;
/// `ClientRequest` — the immutable client/request view.
pub mod request;
