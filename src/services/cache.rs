// Classification cache
// Per-item state machine tracking which items have already been scored,
// so each item is scored at most once and policy changes (thresholds,
// enabled flag) re-derive tiers from stored raw scores without re-running
// the scorer.

use std::collections::HashMap;

use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, warn};

use crate::models::{Settings, SuspicionTier, ThresholdError};
use crate::services::scorer::classifier::TextClassifier;
use crate::services::scorer::ensemble;
use crate::services::scorer::tiers::score_to_tier;

/// Opaque stable identity assigned by the host for each observed item.
/// The host's own lifecycle decides when an id may be forgotten; the
/// cache never keeps an item alive.
pub type ItemId = u64;

#[derive(Debug, Copy, Clone, PartialEq)]
enum ItemState {
    /// First observed while classification was disabled; never scored.
    SkippedDisabled,
    /// A scoring call is running; further observations are no-ops.
    InFlight,
    /// Scored; the raw score is retained so tier changes are free.
    Scored { raw_score: f64 },
}

/// Notifications emitted by the cache. Consumers (presentation, stats)
/// must treat them as eventually consistent and idempotent.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum CacheEvent {
    /// The item's presented tier, assigned on first scoring and re-emitted
    /// on every settings change.
    TierAssigned { item: ItemId, tier: SuspicionTier },
    /// Fired exactly once per item, on its first non-clean classification.
    StatIncrement { tier: SuspicionTier },
}

pub struct ClassificationCache<C> {
    classifier: C,
    records: Mutex<HashMap<ItemId, ItemState>>,
    settings: RwLock<Settings>,
    events: UnboundedSender<CacheEvent>,
}

impl<C: TextClassifier> ClassificationCache<C> {
    /// Build a cache around a classifier and an initial settings snapshot.
    /// Malformed thresholds are rejected here, not tolerated downstream.
    pub fn new(
        classifier: C,
        settings: Settings,
    ) -> Result<(Self, UnboundedReceiver<CacheEvent>), ThresholdError> {
        settings.thresholds.validate()?;
        let (events, receiver) = mpsc::unbounded_channel();
        let cache = Self {
            classifier,
            records: Mutex::new(HashMap::new()),
            settings: RwLock::new(settings),
            events,
        };
        Ok((cache, receiver))
    }

    /// Drive the per-item state machine for one observation.
    ///
    /// The claim is atomic: checking for an existing record and marking
    /// the item in-flight happen under one lock, so concurrent
    /// observations of the same item result in at most one scoring call.
    /// The scorer itself runs outside the lock.
    pub async fn classify(&self, item: ItemId, text: &str) {
        {
            let enabled = self.settings.read().enabled;
            let mut records = self.records.lock();
            if records.contains_key(&item) {
                return;
            }
            if !enabled {
                records.insert(item, ItemState::SkippedDisabled);
                return;
            }
            records.insert(item, ItemState::InFlight);
        }

        let raw = ensemble::score_text(text, &self.classifier).await;

        match raw {
            None => {
                // Too short to score. Release the claim so a future host
                // observation (e.g. after the text changed) can retry;
                // the cache itself never retries.
                let mut records = self.records.lock();
                if records.get(&item) == Some(&ItemState::InFlight) {
                    records.remove(&item);
                }
            }
            Some(raw_score) => {
                let settings = *self.settings.read();
                let tier = {
                    let mut records = self.records.lock();
                    match records.get_mut(&item) {
                        None => {
                            // Forgotten while the call was in flight.
                            debug!(item, "discarding score for forgotten item");
                            return;
                        }
                        Some(state) => {
                            *state = ItemState::Scored { raw_score };
                            presented_tier(raw_score, &settings)
                        }
                    }
                };
                self.emit(CacheEvent::TierAssigned { item, tier });
                if tier != SuspicionTier::Clean {
                    self.emit(CacheEvent::StatIncrement { tier });
                }
            }
        }
    }

    /// Swap in a new settings snapshot and re-derive every scored item's
    /// tier from its stored raw score. Never re-invokes the scorer and
    /// never re-emits stats. Idempotent; safe to call repeatedly.
    pub fn reconcile(&self, settings: Settings) -> Result<(), ThresholdError> {
        settings.thresholds.validate()?;
        *self.settings.write() = settings;

        let assignments: Vec<(ItemId, SuspicionTier)> = {
            let mut records = self.records.lock();
            if settings.enabled {
                // Items first seen while disabled were never scored; let
                // the host's next scan observe them as new.
                records.retain(|_, state| *state != ItemState::SkippedDisabled);
            }
            records
                .iter()
                .filter_map(|(&item, state)| match state {
                    ItemState::Scored { raw_score } => {
                        Some((item, presented_tier(*raw_score, &settings)))
                    }
                    _ => None,
                })
                .collect()
        };

        for (item, tier) in assignments {
            self.emit(CacheEvent::TierAssigned { item, tier });
        }
        Ok(())
    }

    /// Host lifecycle hook: the item identity is gone, drop its record.
    /// A scoring call still in flight for it completes harmlessly.
    pub fn forget(&self, item: ItemId) {
        self.records.lock().remove(&item);
    }

    /// Current settings snapshot.
    pub fn settings(&self) -> Settings {
        *self.settings.read()
    }

    /// Stored raw score for an item, if it has been scored.
    pub fn raw_score(&self, item: ItemId) -> Option<f64> {
        match self.records.lock().get(&item) {
            Some(ItemState::Scored { raw_score }) => Some(*raw_score),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    // Best-effort notification: a missing consumer must never block or
    // roll back a state transition.
    fn emit(&self, event: CacheEvent) {
        if self.events.send(event).is_err() {
            warn!(?event, "event receiver dropped; discarding cache event");
        }
    }
}

fn presented_tier(raw_score: f64, settings: &Settings) -> SuspicionTier {
    if settings.enabled {
        score_to_tier(raw_score, &settings.thresholds)
    } else {
        SuspicionTier::Clean
    }
}
