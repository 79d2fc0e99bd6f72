//! # Configuration Tests
//!
//! Tests for configuration structures, deserialization, defaults, and validation.

use memsim_core::SimError;
use memsim_core::config::*;

#[test]
fn test_config_default() {
    let config = SimConfig::default();
    assert_eq!(config.memory_size, 100);
    assert_eq!(config.allocation_policy, AllocationPolicy::FirstFit);
    assert_eq!(config.fragment_threshold, 10);
    assert_eq!(config.paging.page_size, 10);
    assert_eq!(config.paging.num_frames, 10);
    assert_eq!(config.paging.replacement_policy, ReplacementPolicy::Fifo);
    assert!(config.validate().is_ok());
}

#[test]
fn test_empty_json_uses_defaults() {
    let config: SimConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(config, SimConfig::default());
}

#[test]
fn test_policy_aliases() {
    let json = r#"{
        "allocation_policy": "NextFit",
        "paging": { "pageSize": 4, "numFrames": 3, "replacementPolicy": "Lru" }
    }"#;
    let config: SimConfig = serde_json::from_str(json).unwrap();
    assert_eq!(config.allocation_policy, AllocationPolicy::NextFit);
    assert_eq!(config.paging, PagingConfig::new(4, 3, ReplacementPolicy::Lru));
}

#[test]
fn test_policy_names_round_trip_through_serde() {
    for policy in AllocationPolicy::ALL {
        let json = serde_json::to_string(&policy).unwrap();
        assert_eq!(json, format!("\"{}\"", policy.name()));
    }
    assert_eq!(serde_json::to_string(&ReplacementPolicy::Lru).unwrap(), "\"LRU\"");
}

#[test]
fn test_unknown_policy_rejected() {
    let result: Result<SimConfig, _> = serde_json::from_str(r#"{"allocation_policy": "quick_fit"}"#);
    assert!(result.is_err());
}

#[test]
fn test_zero_memory_rejected() {
    let config = SimConfig {
        memory_size: 0,
        ..SimConfig::default()
    };
    assert_eq!(config.validate(), Err(SimError::MemorySizeInvalid(0)));
}

#[test]
fn test_zero_page_size_or_frames_rejected() {
    for (page_size, num_frames) in [(0, 4), (4, 0), (0, 0)] {
        let paging = PagingConfig::new(page_size, num_frames, ReplacementPolicy::Fifo);
        assert_eq!(
            paging.validate(),
            Err(SimError::PagingConfigInvalid {
                page_size,
                num_frames
            })
        );
    }
}

#[test]
fn test_pages_for_rounds_up() {
    let paging = PagingConfig::new(4, 2, ReplacementPolicy::Fifo);
    assert_eq!(paging.pages_for(1), 1);
    assert_eq!(paging.pages_for(4), 1);
    assert_eq!(paging.pages_for(10), 3);
    assert_eq!(paging.pages_for(12), 3);
}
