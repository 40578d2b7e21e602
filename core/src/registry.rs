// Copyright 2026 bgpcore Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Per-server maps from peer host to a driver handle. Collision
//! arbitration looks the opposite task up here; unique-key insert keeps
//! at most one driver of each kind per peer.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::{Arc, Mutex};

#[derive(Debug, PartialEq, Eq)]
pub struct AlreadyRegistered;

#[derive(Debug)]
pub struct Registry<T> {
    inner: Arc<Mutex<HashMap<IpAddr, T>>>,
}

impl<T> Clone for Registry<T> {
    fn clone(&self) -> Self {
        Registry {
            inner: self.inner.clone(),
        }
    }
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Registry::new()
    }
}

impl<T> Registry<T> {
    pub fn new() -> Self {
        Registry {
            inner: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Insert fails if the key is taken.
    pub fn register(&self, peer: IpAddr, value: T) -> Result<(), AlreadyRegistered> {
        let mut map = self.inner.lock().expect("registry lock poisoned");
        if map.contains_key(&peer) {
            return Err(AlreadyRegistered);
        }
        map.insert(peer, value);
        Ok(())
    }

    pub fn unregister(&self, peer: IpAddr) {
        self.inner
            .lock()
            .expect("registry lock poisoned")
            .remove(&peer);
    }

    pub fn contains(&self, peer: IpAddr) -> bool {
        self.inner
            .lock()
            .expect("registry lock poisoned")
            .contains_key(&peer)
    }
}

impl<T: Clone> Registry<T> {
    pub fn lookup(&self, peer: IpAddr) -> Option<T> {
        self.inner
            .lock()
            .expect("registry lock poisoned")
            .get(&peer)
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_lookup_unregister() {
        let registry: Registry<u32> = Registry::new();
        let peer: IpAddr = "10.0.0.1".parse().unwrap();

        assert!(registry.lookup(peer).is_none());
        registry.register(peer, 7).unwrap();
        assert_eq!(registry.lookup(peer), Some(7));
        assert!(registry.contains(peer));

        registry.unregister(peer);
        assert!(registry.lookup(peer).is_none());
    }

    #[test]
    fn test_duplicate_insert_fails() {
        let registry: Registry<u32> = Registry::new();
        let peer: IpAddr = "10.0.0.1".parse().unwrap();

        registry.register(peer, 1).unwrap();
        assert_eq!(registry.register(peer, 2), Err(AlreadyRegistered));
        // First registration untouched
        assert_eq!(registry.lookup(peer), Some(1));
    }

    #[test]
    fn test_clone_shares_state() {
        let registry: Registry<u32> = Registry::new();
        let clone = registry.clone();
        let peer: IpAddr = "10.0.0.2".parse().unwrap();

        registry.register(peer, 3).unwrap();
        assert_eq!(clone.lookup(peer), Some(3));
    }
}
