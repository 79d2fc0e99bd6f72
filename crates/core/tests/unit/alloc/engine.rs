//! Allocation Engine Tests.
//!
//! Splitting on allocation, exhaustive coalescing on deallocation, block id rules and
//! the error kinds the engine reports.

use memsim_core::alloc::AllocationEngine;
use memsim_core::alloc::address_space::INITIAL_BLOCK;
use memsim_core::common::{AllocationFailure, BlockId, ProcessId, SimError};
use memsim_core::config::AllocationPolicy;
use pretty_assertions::assert_eq;

use crate::common::harness::TestContext;

// ══════════════════════════════════════════════════════════
// 1. Allocate / free walk-through (memory size 100)
// ══════════════════════════════════════════════════════════

#[test]
fn first_fit_walkthrough_ends_in_one_free_block() {
    let mut ctx = TestContext::new();

    let first = ctx.alloc_for(1, 10);
    assert_eq!(ctx.layout(), vec![(0, 10, false), (10, 90, true)]);

    let second = ctx.alloc_for(1, 20);
    assert_eq!(
        ctx.layout(),
        vec![(0, 10, false), (10, 20, false), (30, 70, true)]
    );

    let _ = ctx.free(first.block);
    assert_eq!(
        ctx.layout(),
        vec![(0, 10, true), (10, 20, false), (30, 70, true)]
    );
    ctx.assert_invariants();

    let _ = ctx.free(second.block);
    assert_eq!(ctx.layout(), vec![(0, 100, true)]);
    ctx.assert_invariants();
}

#[test]
fn exact_fit_leaves_no_remainder() {
    let mut ctx = TestContext::new();
    let all = ctx.alloc_for(1, 100);
    assert_eq!(ctx.layout(), vec![(0, 100, false)]);
    assert_eq!(all.start, 0);

    let mut ctx = TestContext::fragmented();
    let _ = ctx.alloc_for(3, 15);
    assert_eq!(ctx.sim.blocks().len(), 6);
    assert_eq!(ctx.layout()[2], (10, 15, false));
}

#[test]
fn freeing_sole_allocation_restores_single_block() {
    let mut ctx = TestContext::new();
    let only = ctx.alloc_for(7, 42);
    let _ = ctx.free(only.block);
    assert_eq!(ctx.layout(), vec![(0, 100, true)]);
}

#[test]
fn coalesces_both_neighbours_in_one_step() {
    let mut ctx = TestContext::new();
    let a = ctx.alloc_for(1, 10);
    let b = ctx.alloc_for(1, 10);
    let c = ctx.alloc_for(1, 10);
    let _ = ctx.free(a.block);
    let _ = ctx.free(c.block);
    assert_eq!(
        ctx.layout(),
        vec![(0, 10, true), (10, 10, false), (20, 80, true)]
    );

    let _ = ctx.free(b.block);
    assert_eq!(ctx.layout(), vec![(0, 100, true)]);
}

// ══════════════════════════════════════════════════════════
// 2. Block ids
// ══════════════════════════════════════════════════════════

#[test]
fn ids_follow_split_and_merge_rules() {
    let mut engine = AllocationEngine::new(100, AllocationPolicy::FirstFit);
    let a = engine.allocate_current(10, ProcessId(1)).unwrap();
    let b = engine.allocate_current(20, ProcessId(1)).unwrap();
    assert_eq!((a.id, b.id), (BlockId(1), BlockId(2)));
    // Remainder keeps the id of the block it was cut from.
    assert_eq!(engine.blocks()[2].id, INITIAL_BLOCK);

    let _ = engine.deallocate(a.id).unwrap();
    let _ = engine.deallocate(b.id).unwrap();
    // The merged block keeps its lowest-addressed constituent's id.
    assert_eq!(engine.blocks().len(), 1);
    assert_eq!(engine.blocks()[0].id, a.id);
}

#[test]
fn stale_id_cannot_free_a_later_allocation() {
    let mut engine = AllocationEngine::new(100, AllocationPolicy::FirstFit);
    let a = engine.allocate_current(10, ProcessId(1)).unwrap();
    let _ = engine.deallocate(a.id).unwrap();
    let b = engine.allocate_current(10, ProcessId(2)).unwrap();
    assert_eq!(b.start, a.start);
    assert_ne!(b.id, a.id);
}

// ══════════════════════════════════════════════════════════
// 3. Errors leave the engine untouched
// ══════════════════════════════════════════════════════════

#[test]
fn deallocating_free_or_unknown_block_is_invalid() {
    let mut engine = AllocationEngine::new(100, AllocationPolicy::FirstFit);
    let a = engine.allocate_current(10, ProcessId(1)).unwrap();
    let _ = engine.deallocate(a.id).unwrap();
    let before = engine.blocks().to_vec();

    assert_eq!(engine.deallocate(a.id), Err(SimError::InvalidBlock(a.id)));
    assert_eq!(engine.deallocate(BlockId(99)), Err(SimError::InvalidBlock(BlockId(99))));
    assert_eq!(engine.blocks(), before.as_slice());
}

#[test]
fn failed_allocation_reports_reason() {
    let mut ctx = TestContext::fragmented();
    let before = ctx.layout();

    assert_eq!(
        ctx.sim.allocate_for(ProcessId(3), 30),
        Err(SimError::AllocationFailed(AllocationFailure::NoSuitableBlock))
    );
    assert_eq!(
        ctx.sim.allocate_for(ProcessId(3), 101),
        Err(SimError::AllocationFailed(AllocationFailure::ExceedsMemory))
    );
    assert_eq!(ctx.sim.allocate_for(ProcessId(3), 0), Err(SimError::InvalidSize));
    assert_eq!(ctx.layout(), before);
    assert_eq!(ctx.sim.stats().failed_allocations, 2);
}

#[test]
fn deallocate_process_frees_all_its_blocks() {
    let mut ctx = TestContext::fragmented();
    // P2 owns [5,10), [25,30) and [55,100); freeing them leaves one free block.
    let freed = ctx.sim.deallocate_process(ProcessId(2)).unwrap();
    assert_eq!(freed.len(), 3);
    assert_eq!(ctx.layout(), vec![(0, 100, true)]);
    assert_eq!(
        ctx.sim.deallocate_process(ProcessId(2)),
        Err(SimError::InvalidProcess(ProcessId(2)))
    );
}

#[test]
fn resize_replaces_the_address_space() {
    let mut ctx = TestContext::new();
    let _ = ctx.alloc_for(1, 60);
    ctx.sim.set_memory_size(256).unwrap();
    assert_eq!(ctx.layout(), vec![(0, 256, true)]);
    assert_eq!(ctx.sim.stats().bytes_allocated, 0);
    assert_eq!(ctx.sim.set_memory_size(0), Err(SimError::MemorySizeInvalid(0)));
    assert_eq!(ctx.sim.config().memory_size, 256);
    ctx.assert_invariants();
}
