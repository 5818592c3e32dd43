// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Serialize, Deserialize, ToSchema)]
pub struct VersionResponse {
    pub agent: String,
    pub version: String,
    /// Browser-driven probes enabled in this process
    pub snapshots_enabled: bool,
    pub audits_enabled: bool,
}
