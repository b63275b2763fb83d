// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Delivery tracking for the Cadence campaign engine.
//!
//! The [`DeliveryTracker`] owns the `DeliveryAttempt` lifecycle: one record
//! per `(schedule run, recipient)`, transitioned independently to `sent`,
//! `failed`, or `retrying` based on the channel's per-recipient outcome.
//! Transient failures re-dispatch with exponential backoff; partial batch
//! failure is an aggregated result, never an error.

mod retry;
mod tracker;

pub use retry::RetryPolicy;
pub use tracker::{Delivery, DeliveryTracker, RetrySweep};
