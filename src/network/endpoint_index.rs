use std::collections::HashMap;

use crate::net::host_of;

/// Reverse lookup from a bare client host (`host:port`) to a member slot.
///
/// Built once at bootstrap and never mutated afterwards.
#[derive(Debug, Default, Clone)]
pub struct EndpointIndex {
    hosts: HashMap<String, usize>,
}

impl EndpointIndex {
    pub fn with_capacity(size: usize) -> Self {
        Self {
            hosts: HashMap::with_capacity(size),
        }
    }

    pub fn insert(
        &mut self,
        endpoint: &str,
        index: usize,
    ) {
        self.hosts.insert(host_of(endpoint).to_string(), index);
    }

    /// Finds the slot serving `endpoint`, given with or without scheme.
    pub fn find(
        &self,
        endpoint: &str,
    ) -> Option<usize> {
        self.hosts.get(host_of(endpoint)).copied()
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }
}
