use lru::LruCache;
use prost::Message;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::config::{BridgeConfig, MIN_POLL_INTERVAL};
use crate::error::{BridgeError, Result};
use crate::protocol::JoinGroupLinkRsp;

/// Length prefix in front of the `GroupSvc.JoinGroupLink` response body.
const JOIN_LINK_PREFIX_LEN: usize = 4;

/// Share-link ark cache: group number -> ark text
///
/// Filled only by inbound `GroupSvc.JoinGroupLink` responses. Entries can be
/// evicted at any time once capacity is exceeded, so readers re-check on every
/// poll tick instead of assuming an entry that appeared is still there.
pub struct ArkCache {
    entries: Mutex<LruCache<u64, String>>,
    poll_interval: Duration,
    timeout: Duration,
}

impl ArkCache {
    pub fn new(capacity: NonZeroUsize, poll_interval: Duration, timeout: Duration) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            poll_interval: poll_interval.max(MIN_POLL_INTERVAL),
            timeout,
        }
    }

    pub fn from_config(config: &BridgeConfig) -> Self {
        Self::new(config.ark_capacity(), config.ark_poll(), config.ark_timeout())
    }

    fn entries(&self) -> MutexGuard<'_, LruCache<u64, String>> {
        // A panic while holding the lock cannot leave the LRU half-updated.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store an inbound ark, evicting the least recently used entry when full.
    pub fn on_event(&self, group_id: u64, payload: String) {
        let mut cache = self.entries();
        if let Some((evicted, _)) = cache.push(group_id, payload) {
            if evicted != group_id {
                log::debug!("Ark cache full, evicted group {}", evicted);
            }
        }
        log::debug!("Ark cached for group {} (cache size: {})", group_id, cache.len());
    }

    /// Read an entry, marking it most recently used.
    pub fn get(&self, group_id: u64) -> Option<String> {
        self.entries().get(&group_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries().clear();
    }

    /// Return the ark for `group_id`, requesting it if it is not cached.
    ///
    /// On a miss `send` is invoked once to issue the outbound request, then the
    /// cache is polled until the ark shows up or the budget runs out. Concurrent
    /// requests for the same group each issue their own outbound request.
    pub async fn request<F>(&self, group_id: u64, send: F) -> Result<String>
    where
        F: FnOnce() -> Result<()>,
    {
        if let Some(text) = self.get(group_id) {
            log::debug!("Ark cache hit for group {}", group_id);
            return Ok(text);
        }

        send()?;

        let poll = async {
            loop {
                tokio::time::sleep(self.poll_interval).await;
                if let Some(text) = self.get(group_id) {
                    return text;
                }
            }
        };

        match tokio::time::timeout(self.timeout, poll).await {
            Ok(text) => Ok(text),
            Err(_) => {
                log::warn!("No ark for group {} after {:?}", group_id, self.timeout);
                Err(BridgeError::Timeout {
                    what: "share-link ark",
                    after: self.timeout,
                })
            }
        }
    }

    /// Decode an inbound `GroupSvc.JoinGroupLink` response and cache its ark.
    ///
    /// Returns the group the ark belongs to.
    pub fn handle_join_group_link(&self, raw: &[u8]) -> Result<u64> {
        if raw.len() < JOIN_LINK_PREFIX_LEN {
            return Err(BridgeError::Decode(format!(
                "join link response too short: {} bytes",
                raw.len()
            )));
        }

        let rsp = JoinGroupLinkRsp::decode(&raw[JOIN_LINK_PREFIX_LEN..])?;
        let group_id = rsp
            .group_code
            .ok_or_else(|| BridgeError::Decode("join link response without group".into()))?;
        let text = String::from_utf8_lossy(rsp.signed_ark.as_deref().unwrap_or_default()).into_owned();

        self.on_event(group_id, text);
        Ok(group_id)
    }
}
