// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Cadence integration tests.
//!
//! [`MockChannel`] is a scriptable delivery channel; [`TestHarness`] wires a
//! complete engine stack (temp SQLite store, mock channel, tracker,
//! orchestrator, service) for end-to-end tests.

pub mod fixtures;
pub mod harness;
pub mod mock_channel;

pub use harness::{TestHarness, TestHarnessBuilder};
pub use mock_channel::{MockChannel, SentMessage};
