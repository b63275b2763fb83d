// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain model types for storage entities.
//!
//! The canonical types live in `cadence-core::types` for use across the
//! adapter trait boundary. This module re-exports them for convenience
//! within the storage crate.

pub use cadence_core::types::{
    DeliveryAttempt, Group, Recipient, Schedule, Template,
};
