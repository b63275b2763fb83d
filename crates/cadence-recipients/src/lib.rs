// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Recipient set resolution for the Cadence campaign engine.
//!
//! Expands a schedule's recipient selector into a deduplicated list ordered
//! by recipient creation, so repeated resolution against an unchanged
//! recipient set is deterministic (and re-dispatch after a crash targets
//! the same recipients in the same order).

mod phone;
mod resolver;

pub use phone::canonical_phone;
pub use resolver::{RecipientResolver, ResolvePolicy};
