// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pure recurrence-rule evaluation.
//!
//! [`compute_next_run`] maps a schedule's rule plus a reference time to its
//! next occurrence. No I/O, no shared state; safe to call repeatedly and
//! from multiple threads. Periodic occurrences are found by stepping the
//! local calendar one period at a time, so month-length and offset edges
//! are handled exactly rather than by naive date arithmetic.

mod calendar;
mod resolver;

pub use resolver::{compute_next_run, validate_rule};
