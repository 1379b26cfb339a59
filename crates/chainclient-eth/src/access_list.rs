//! Building EIP-2930 access lists by hand.

use std::collections::{BTreeMap, BTreeSet};

use alloy_eips::eip2930::{AccessList, AccessListItem};
use alloy_primitives::{Address, B256};

/// Accumulates `(address, storage key)` pairs into an [`AccessList`].
///
/// Entries are deduplicated and emitted in address order with sorted storage
/// keys, so the same set of pairs always builds the same list.
#[derive(Debug, Default, Clone)]
pub struct AccessListBuilder {
    entries: BTreeMap<Address, BTreeSet<B256>>,
}

impl AccessListBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a storage key access for `address`.
    pub fn add(&mut self, address: Address, storage_key: B256) -> &mut Self {
        self.entries.entry(address).or_default().insert(storage_key);
        self
    }

    /// Record an address access with no storage keys.
    pub fn add_address(&mut self, address: Address) -> &mut Self {
        self.entries.entry(address).or_default();
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn build(&self) -> AccessList {
        AccessList(
            self.entries
                .iter()
                .map(|(address, keys)| AccessListItem {
                    address: *address,
                    storage_keys: keys.iter().copied().collect(),
                })
                .collect(),
        )
    }
}
