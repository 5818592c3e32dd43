// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

pub mod audit;
pub mod auth;
pub mod auth_middleware;
pub mod browser;
pub mod db;
pub mod guard;
pub mod links;
pub mod logging;
pub mod orchestrator;
pub mod reachability;
pub mod snapshot;
pub mod storage;
