//! Scenario Persistence Tests.
//!
//! Save-then-load must reproduce the snapshot exactly, a hand-written record with only
//! the required fields must load, and every structurally invalid record must be rejected
//! without touching the running simulation.

use memsim_core::common::{BlockId, ProcessId, SegmentId, SimError};
use memsim_core::config::{AllocationPolicy, ReplacementPolicy};
use memsim_core::{Scenario, SimConfig, Simulator};
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::{Value, json};

use crate::common::harness::TestContext;

/// A valid record: P1 owns [0,40), touched pages 0 and 1 (both resident), segment "A".
fn base() -> Value {
    json!({
        "memorySize": 100,
        "blocks": [
            { "start": 0, "size": 40, "status": "allocated", "processId": 1, "blockId": 1 },
            { "start": 40, "size": 60, "status": "free", "blockId": 0 }
        ],
        "currentPolicy": "best_fit",
        "pagingConfig": { "pageSize": 4, "numFrames": 2, "replacementPolicy": "LRU" },
        "segments": [
            { "name": "A", "size": 8, "pageIds": [0, 1], "processId": 1 }
        ],
        "pageTables": [
            {
                "processId": 1,
                "entries": [
                    { "virtualPage": 0, "frame": 0, "lastAccessTick": 2, "loadedTick": 2 },
                    { "virtualPage": 1, "frame": 1, "lastAccessTick": 3, "loadedTick": 3 }
                ]
            }
        ],
        "tick": 3
    })
}

fn parse(value: &Value) -> Scenario {
    Scenario::from_json(&value.to_string()).unwrap()
}

/// A simulator with blocks, evicted and resident pages, segments and a moved cursor.
fn busy() -> TestContext {
    let mut ctx = TestContext::with_paging(4, 3, ReplacementPolicy::Lru);
    ctx.set_policy(AllocationPolicy::NextFit);
    let a = ctx.alloc_for(1, 12);
    let _ = ctx.alloc_for(2, 30);
    let _ = ctx.alloc_for(1, 7);
    let _ = ctx.free(a.block);
    let _ = ctx.sim.create_segment("heap", 10, ProcessId(1)).unwrap();
    let _ = ctx.sim.access_page(ProcessId(2), 4);
    let _ = ctx.sim.access_page(ProcessId(1), 0);
    let _ = ctx.sim.create_segment("stack", 3, ProcessId(2)).unwrap();
    let _ = ctx.sim.delete_segment("heap").unwrap();
    assert!(ctx.sim.allocate_for(ProcessId(3), 90).is_err());
    ctx.assert_invariants();
    ctx
}

#[test]
fn save_then_load_reproduces_snapshot() {
    let ctx = busy();
    let saved = ctx.sim.save_scenario();
    let json = saved.to_json().unwrap();

    let mut restored = Simulator::new(&SimConfig::default()).unwrap();
    restored.load_scenario(&Scenario::from_json(&json).unwrap()).unwrap();

    assert_eq!(restored.snapshot(), ctx.sim.snapshot());
    assert_eq!(restored.save_scenario(), saved);
    assert!(restored.check_invariants().is_ok());
}

#[test]
fn usage_history_survives_a_round_trip() {
    let ctx = busy();
    let samples = ctx.sim.usage_history().samples().to_vec();
    // Three allocations and one free; the failed allocation records nothing.
    assert_eq!(samples.len(), 4);

    let json = ctx.sim.save_scenario().to_json().unwrap();
    let mut restored = Simulator::new(&SimConfig::default()).unwrap();
    restored.load_scenario(&Scenario::from_json(&json).unwrap()).unwrap();

    assert_eq!(restored.usage_history().samples(), samples.as_slice());
    assert_eq!(
        restored.stats_report().usage_history,
        ctx.sim.stats_report().usage_history
    );
}

#[test]
fn restored_simulator_continues_identically() {
    let mut original = busy();
    let mut restored = Simulator::new(&SimConfig::default()).unwrap();
    restored.load_scenario(&original.sim.save_scenario()).unwrap();

    let a = original.sim.allocate(5, AllocationPolicy::NextFit).unwrap();
    let b = restored.allocate(5, AllocationPolicy::NextFit).unwrap();
    assert_eq!(a, b);
    assert_eq!(
        original.sim.access_page(ProcessId(1), 9),
        restored.access_page(ProcessId(1), 9)
    );
    let s1 = original.sim.create_segment("data", 4, ProcessId(2)).unwrap();
    let s2 = restored.create_segment("data", 4, ProcessId(2)).unwrap();
    assert_eq!(s1, s2);
    assert_eq!(restored.snapshot(), original.sim.snapshot());
}

#[test]
fn required_fields_alone_load() {
    let mut value = base();
    let object = value.as_object_mut().unwrap();
    let _ = object.remove("pageTables");
    let _ = object.remove("tick");

    let mut sim = Simulator::new(&SimConfig::default()).unwrap();
    sim.load_scenario(&parse(&value)).unwrap();

    let config = sim.config();
    assert_eq!(config.allocation_policy, AllocationPolicy::BestFit);
    assert_eq!(config.paging.page_size, 4);
    assert_eq!(config.paging.replacement_policy, ReplacementPolicy::Lru);
    assert_eq!(config.fragment_threshold, 10);
    assert_eq!(sim.tick(), 0);
    assert_eq!(sim.stats().bytes_allocated, 40);
    assert!(sim.usage_history().is_empty());
    assert_eq!(sim.segments()[0].id, SegmentId(1));
    assert!(sim.process(ProcessId(1)).is_some());

    // Ids continue past the loaded ones.
    let next = sim.allocate(10, AllocationPolicy::FirstFit).unwrap();
    assert_eq!(next.block, BlockId(2));
    assert_eq!(next.process, ProcessId(2));
    assert!(sim.check_invariants().is_ok());
}

#[test]
fn page_tables_rebuild_the_frame_pool() {
    let mut sim = Simulator::new(&SimConfig::default()).unwrap();
    sim.load_scenario(&parse(&base())).unwrap();

    assert_eq!(sim.tick(), 3);
    assert_eq!(sim.frames().occupied(), 2);
    // LRU: page 0 (tick 2) is older than page 1 (tick 3).
    let out = sim.access_page(ProcessId(1), 7);
    assert_eq!(out.evicted().map(|r| r.page), Some(0));
    assert!(sim.check_invariants().is_ok());
}

#[rstest]
#[case::gap(|v: &mut Value| v["blocks"][1]["start"] = json!(41))]
#[case::overlap(|v: &mut Value| v["blocks"][1]["start"] = json!(39))]
#[case::short_coverage(|v: &mut Value| v["blocks"][1]["size"] = json!(50))]
#[case::zero_size_block(|v: &mut Value| {
    v["blocks"][0]["size"] = json!(0);
    v["blocks"][1]["start"] = json!(0);
    v["blocks"][1]["size"] = json!(100);
})]
#[case::free_block_with_owner(|v: &mut Value| v["blocks"][1]["processId"] = json!(2))]
#[case::allocated_without_owner(|v: &mut Value| v["blocks"][0]["processId"] = Value::Null)]
#[case::adjacent_free(|v: &mut Value| {
    v["blocks"][0]["status"] = json!("free");
    v["blocks"][0]["processId"] = Value::Null;
})]
#[case::duplicate_block_id(|v: &mut Value| v["blocks"][1]["blockId"] = json!(1))]
#[case::frame_out_of_range(|v: &mut Value| v["pageTables"][0]["entries"][1]["frame"] = json!(2))]
#[case::frame_mapped_twice(|v: &mut Value| v["pageTables"][0]["entries"][1]["frame"] = json!(0))]
#[case::duplicate_entry(|v: &mut Value| v["pageTables"][0]["entries"][1]["virtualPage"] = json!(0))]
#[case::loaded_after_access(|v: &mut Value| v["pageTables"][0]["entries"][1]["loadedTick"] = json!(9))]
#[case::tick_behind_entries(|v: &mut Value| v["tick"] = json!(1))]
#[case::segment_page_count(|v: &mut Value| v["segments"][0]["size"] = json!(9))]
#[case::duplicate_segment_name(|v: &mut Value| {
    let copy = v["segments"][0].clone();
    v["segments"].as_array_mut().unwrap().push(copy);
})]
#[case::zero_page_size(|v: &mut Value| v["pagingConfig"]["pageSize"] = json!(0))]
#[case::zero_frames(|v: &mut Value| v["pagingConfig"]["numFrames"] = json!(0))]
#[case::zero_memory(|v: &mut Value| v["memorySize"] = json!(0))]
#[case::cursor_outside_memory(|v: &mut Value| v["nextFitCursor"] = json!(101))]
#[case::next_block_id_in_use(|v: &mut Value| v["nextBlockId"] = json!(1))]
#[case::usage_after_clock(|v: &mut Value| v["usageHistory"] = json!([{ "tick": 4, "bytes": 40 }]))]
#[case::usage_going_backwards(|v: &mut Value| {
    v["usageHistory"] = json!([{ "tick": 2, "bytes": 40 }, { "tick": 1, "bytes": 0 }]);
})]
fn invalid_scenario_is_rejected_and_state_kept(#[case] corrupt: fn(&mut Value)) {
    let mut ctx = busy();
    let before = ctx.sim.snapshot();

    let mut value = base();
    corrupt(&mut value);
    let result = ctx.sim.load_scenario(&parse(&value));

    assert!(
        matches!(result, Err(SimError::ConfigLoadInvalid(_))),
        "{result:?}"
    );
    assert_eq!(ctx.sim.snapshot(), before);
}

#[test]
fn malformed_json_is_a_load_error() {
    assert!(matches!(
        Scenario::from_json("{ \"memorySize\": 100 }"),
        Err(SimError::ConfigLoadInvalid(_))
    ));
    assert!(matches!(
        Scenario::from_json("not json"),
        Err(SimError::ConfigLoadInvalid(_))
    ));
    let mut value = base();
    value["blocks"][0]["status"] = json!("reserved");
    assert!(Scenario::from_json(&value.to_string()).is_err());
}

#[test]
fn saved_json_uses_persisted_field_names() {
    let ctx = busy();
    let value: Value = serde_json::from_str(&ctx.sim.save_scenario().to_json().unwrap()).unwrap();
    for key in [
        "memorySize",
        "blocks",
        "currentPolicy",
        "pagingConfig",
        "segments",
        "pageTables",
        "tick",
        "nextFitCursor",
        "statistics",
        "usageHistory",
    ] {
        assert!(value.get(key).is_some(), "missing {key}");
    }
    let block = &value["blocks"][0];
    for key in ["start", "size", "status", "processId", "blockId"] {
        assert!(block.get(key).is_some(), "block missing {key}");
    }
    let segment = &value["segments"][0];
    for key in ["name", "size", "pageIds", "processId"] {
        assert!(segment.get(key).is_some(), "segment missing {key}");
    }
    assert_eq!(value["pagingConfig"]["replacementPolicy"], "LRU");
    assert_eq!(value["currentPolicy"], "next_fit");
}
