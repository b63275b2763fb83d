// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter traits implemented by storage backends and delivery transports.

pub mod channel;
pub mod store;

pub use channel::{ChannelError, ChannelReceipt, DeliveryChannel};
pub use store::{AttemptTotals, CampaignStore, RecipientFilter};
