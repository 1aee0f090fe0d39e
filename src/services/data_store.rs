use std::collections::BTreeSet;
use std::sync::{Arc, RwLock};
use tracing::info;

use crate::models::{MetadataResponse, Preference, RestaurantRecord};
use crate::services::retrieval::filter_records;

/// In-memory restaurant collection.
///
/// Loading swaps the whole collection at once; readers holding a snapshot
/// keep seeing the previous records until they drop it.
#[derive(Debug, Default)]
pub struct RestaurantDataStore {
    records: RwLock<Arc<Vec<RestaurantRecord>>>,
}

impl RestaurantDataStore {
    pub fn new(records: Vec<RestaurantRecord>) -> Self {
        Self {
            records: RwLock::new(Arc::new(records)),
        }
    }

    /// Replace all records.
    pub fn load(&self, records: Vec<RestaurantRecord>) {
        let count = records.len();
        let fresh = Arc::new(records);
        match self.records.write() {
            Ok(mut guard) => *guard = fresh,
            // A panicked writer cannot leave a half-built Arc behind.
            Err(poisoned) => *poisoned.into_inner() = fresh,
        }
        info!("Restaurant data store loaded with {} records", count);
    }

    /// Current records as a cheap shared handle.
    pub fn snapshot(&self) -> Arc<Vec<RestaurantRecord>> {
        match self.records.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Records matching every present field of `preference`, in load order.
    pub fn query(&self, preference: &Preference) -> Vec<RestaurantRecord> {
        filter_records(self.snapshot().iter(), preference)
    }

    /// Distinct areas and cuisines, sorted case-insensitively.
    pub fn metadata(&self) -> MetadataResponse {
        let records = self.snapshot();
        // Keyed by (lowercase, original) so ordering ignores case but distinct spellings survive.
        let mut areas = BTreeSet::new();
        let mut cuisines = BTreeSet::new();

        for record in records.iter() {
            if let Some(location) = record.location.as_deref().map(str::trim) {
                if !location.is_empty() {
                    areas.insert((location.to_lowercase(), location.to_string()));
                }
            }
            for cuisine in record.cuisines.iter().flat_map(|c| c.split(',')) {
                let cuisine = cuisine.trim();
                if !cuisine.is_empty() {
                    cuisines.insert((cuisine.to_lowercase(), cuisine.to_string()));
                }
            }
        }

        MetadataResponse {
            areas: areas.into_iter().map(|(_, original)| original).collect(),
            cuisines: cuisines.into_iter().map(|(_, original)| original).collect(),
        }
    }
}
