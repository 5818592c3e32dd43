// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

pub mod link;
pub mod probe;
pub mod storage;
pub mod version;
