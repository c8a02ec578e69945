//! Batched resolution of pasted link collections
//!
//! Bulk input is deduplicated preserving first-seen order, then resolved in
//! fixed-size batches so at most [`BATCH_SIZE`] provider requests are in
//! flight at once. A failed item never aborts its batch.

use crate::core::queue::{QueueEvent, QueueItem, QueueStore, ResolvedFields};
use crate::resolve::resolver::Resolve;
use crate::utils::url::extract_links;
use chrono::Utc;
use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

/// Maximum concurrent provider resolutions in bulk mode
pub const BATCH_SIZE: usize = 3;

/// Deduplicated link collection extracted from pasted text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedInput {
    /// Unique links in first-seen order
    pub links: Vec<String>,
    /// How many pasted links were dropped as duplicates
    pub duplicates_removed: usize,
}

/// Parse pasted text into unique platform links
pub fn parse_input(raw: &str) -> ParsedInput {
    let all = extract_links(raw);
    let mut seen = HashSet::new();
    let mut links = Vec::new();
    for link in &all {
        if seen.insert(link.clone()) {
            links.push(link.clone());
        }
    }
    ParsedInput {
        duplicates_removed: all.len() - links.len(),
        links,
    }
}

/// What to do with a parsed input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchPlan {
    /// Nothing usable was pasted
    Empty,
    /// Exactly one unique link degrades to the single-item flow
    Single(String),
    /// Two or more unique links become a queue
    Batch(Vec<QueueItem>),
}

impl BatchPlan {
    /// Build the plan for a parsed input
    pub fn from_parsed(parsed: &ParsedInput) -> Self {
        match parsed.links.as_slice() {
            [] => BatchPlan::Empty,
            [single] => BatchPlan::Single(single.clone()),
            links => {
                let stamp = Utc::now().timestamp_millis();
                BatchPlan::Batch(
                    links
                        .iter()
                        .enumerate()
                        .map(|(i, url)| QueueItem::new(format!("item-{}-{}", stamp, i), url))
                        .collect(),
                )
            }
        }
    }
}

/// Resolves queue items against the shared store in bounded batches
pub struct BatchScheduler {
    resolver: Arc<dyn Resolve>,
    store: Arc<QueueStore>,
}

impl BatchScheduler {
    pub fn new(resolver: Arc<dyn Resolve>, store: Arc<QueueStore>) -> Self {
        Self { resolver, store }
    }

    pub fn store(&self) -> Arc<QueueStore> {
        self.store.clone()
    }

    /// Seed the store with fresh items and resolve them all
    pub async fn enqueue(&self, items: Vec<QueueItem>) {
        let ids: Vec<String> = items.iter().map(|it| it.id.clone()).collect();
        self.store.seed(items);
        self.resolve_ids(&ids).await;
    }

    /// Re-resolve items that never produced a playable URL.
    ///
    /// Failed and still-pending items only; when every item already resolved,
    /// the whole queue is refreshed instead.
    pub async fn reload(&self) {
        use crate::core::queue::ItemStatus;

        let snapshot = self.store.snapshot();
        let mut ids: Vec<String> = snapshot
            .iter()
            .filter(|it| matches!(it.status, ItemStatus::Failed | ItemStatus::Pending))
            .map(|it| it.id.clone())
            .collect();

        if ids.is_empty() {
            ids = snapshot.iter().map(|it| it.id.clone()).collect();
        }

        info!("Reloading {} queue item(s)", ids.len());
        self.resolve_ids(&ids).await;
    }

    /// Remove an item; any in-flight work for it becomes a store no-op
    pub fn remove(&self, id: &str) {
        self.store.remove(id);
    }

    async fn resolve_ids(&self, ids: &[String]) {
        for batch in ids.chunks(BATCH_SIZE) {
            join_all(batch.iter().map(|id| self.resolve_item(id))).await;
        }
    }

    async fn resolve_item(&self, id: &str) {
        let Some(item) = self.store.get(id) else {
            return;
        };

        self.store.apply(id, QueueEvent::Dispatched);
        match self.resolver.resolve(&item.url).await {
            Ok(descriptor) => {
                self.store
                    .apply(id, QueueEvent::Resolved(ResolvedFields::from(&descriptor)));
            }
            Err(e) => {
                warn!("Resolution failed for {}: {}", item.url, e);
                self.store.apply(id, QueueEvent::ResolveFailed(e.to_string()));
            }
        }
    }
}
