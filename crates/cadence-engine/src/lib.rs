// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Schedule orchestration for the Cadence campaign engine.
//!
//! The [`Orchestrator`] drives the periodic tick: select due schedules,
//! resolve recipients, render payloads, dispatch batches, and advance
//! recurrence state. [`CampaignService`] is the synchronous request/response
//! surface the presentation layer consumes.

pub mod orchestrator;
pub mod runner;
pub mod service;
pub mod stats;

pub use orchestrator::{Orchestrator, TickSummary};
pub use runner::run_tick_loop;
pub use service::{
    CampaignService, GroupSpec, MediaSpec, RecipientSpec, ScheduleFilter, ScheduleSpec,
    TemplateSpec,
};
pub use stats::EngineStats;
