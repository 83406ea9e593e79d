// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules, one per storage entity.

pub mod profiles;
pub mod sessions;
