// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Selector expansion against the campaign store.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use cadence_core::{
    CadenceError, CampaignStore, Recipient, RecipientFilter, RecipientSelector, RecipientStatus,
};

/// Policy knobs for a single resolution.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolvePolicy {
    /// Include recipients with `inactive` status. Blocked recipients are
    /// always excluded.
    pub include_inactive: bool,
}

/// Resolves recipient selectors into ordered, deduplicated recipient lists.
pub struct RecipientResolver {
    store: Arc<dyn CampaignStore>,
}

impl RecipientResolver {
    pub fn new(store: Arc<dyn CampaignStore>) -> Self {
        Self { store }
    }

    /// Expand `selector` into recipients, unioned across its terms.
    ///
    /// A recipient matched by several terms appears once. Ordering is by
    /// recipient creation (ties broken by id) regardless of which term
    /// matched, so resolution is stable across calls. A group name with no
    /// backing group fails with [`CadenceError::UnknownGroup`] rather than
    /// being skipped.
    pub async fn resolve(
        &self,
        selector: &RecipientSelector,
        policy: ResolvePolicy,
    ) -> Result<Vec<Recipient>, CadenceError> {
        let mut matched = match selector {
            RecipientSelector::Groups { names } => {
                if names.is_empty() {
                    return Err(CadenceError::Validation(
                        "recipient selector has no group names".to_string(),
                    ));
                }
                let mut acc = Vec::new();
                for name in names {
                    if self.store.get_group_by_name(name).await?.is_none() {
                        return Err(CadenceError::UnknownGroup { name: name.clone() });
                    }
                    let filter = RecipientFilter {
                        group: Some(name.clone()),
                        ..RecipientFilter::default()
                    };
                    acc.extend(self.store.list_recipients(&filter).await?);
                }
                acc
            }
            RecipientSelector::Tags { tags } => {
                if tags.is_empty() {
                    return Err(CadenceError::Validation(
                        "recipient selector has no tags".to_string(),
                    ));
                }
                let mut acc = Vec::new();
                for tag in tags {
                    let filter = RecipientFilter {
                        tag: Some(tag.clone()),
                        ..RecipientFilter::default()
                    };
                    acc.extend(self.store.list_recipients(&filter).await?);
                }
                acc
            }
            RecipientSelector::All => {
                self.store
                    .list_recipients(&RecipientFilter::default())
                    .await?
            }
        };

        matched.retain(|r| match r.status {
            RecipientStatus::Active => true,
            RecipientStatus::Inactive => policy.include_inactive,
            RecipientStatus::Blocked => false,
        });

        let mut seen = HashSet::new();
        matched.retain(|r| seen.insert(r.id.clone()));
        matched.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.0.cmp(&b.id.0))
        });

        debug!(count = matched.len(), "recipient selector resolved");
        Ok(matched)
    }
}
