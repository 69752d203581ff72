#![no_main]
use groupbridge::{ArkCache, BridgeConfig};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let cache = ArkCache::from_config(&BridgeConfig::default());

    // Arbitrary inbound packets must be rejected or cached, never panic
    if let Ok(group_id) = cache.handle_join_group_link(data) {
        assert!(cache.get(group_id).is_some());
    }
    assert!(cache.len() <= 1);
});
