//! Preference breakdowns
//!
//! Counts preference entries by backing store and by value type.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::preference::{PreferenceRecord, StorageType};

/// Summary of the current preference snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreferencesMetrics {
    pub total_preferences: u64,
    pub system_preferences: u64,
    pub user_preferences: u64,
    pub by_storage_type: BTreeMap<StorageType, u64>,
    /// Keyed by [`PreferenceValue::type_name`](crate::models::preference::PreferenceValue::type_name)
    pub by_value_type: BTreeMap<String, u64>,
    pub most_common_type: Option<String>,
    pub most_common_storage: Option<StorageType>,
}

/// Key with the highest count; ties go to the smallest key
fn most_common<K: Clone + Ord>(counts: &BTreeMap<K, u64>) -> Option<K> {
    let mut best: Option<(&K, u64)> = None;
    for (key, &count) in counts {
        match best {
            Some((_, best_count)) if count <= best_count => {}
            _ => best = Some((key, count)),
        }
    }
    best.map(|(key, _)| key.clone())
}

/// Break down a preference snapshot
pub fn analyze_preferences(preferences: &[PreferenceRecord]) -> PreferencesMetrics {
    let mut by_storage_type: BTreeMap<StorageType, u64> = BTreeMap::new();
    let mut by_value_type: BTreeMap<String, u64> = BTreeMap::new();
    let mut system_preferences = 0u64;

    for pref in preferences {
        *by_storage_type.entry(pref.storage_type).or_insert(0) += 1;
        *by_value_type.entry(pref.value.type_name().to_string()).or_insert(0) += 1;
        if pref.is_system_preference {
            system_preferences += 1;
        }
    }

    let total_preferences = preferences.len() as u64;

    PreferencesMetrics {
        total_preferences,
        system_preferences,
        user_preferences: total_preferences - system_preferences,
        most_common_type: most_common(&by_value_type),
        most_common_storage: most_common(&by_storage_type),
        by_storage_type,
        by_value_type,
    }
}
