//! Segmentation Tests.
//!
//! Segment creation through the paging engine, placement, name and page conflicts, lazy
//! deletion and internal fragmentation.

use memsim_core::common::{ProcessId, SegmentId, SimError};
use memsim_core::config::ReplacementPolicy;
use pretty_assertions::assert_eq;

use crate::common::harness::TestContext;

const P1: ProcessId = ProcessId(1);
const P2: ProcessId = ProcessId(2);

fn ctx() -> TestContext {
    TestContext::with_paging(4, 10, ReplacementPolicy::Fifo)
}

#[test]
fn segment_requests_ceil_size_over_page_size_pages() {
    let mut ctx = ctx();
    let created = ctx.sim.create_segment("A", 10, P1).unwrap();

    assert_eq!(created.id, SegmentId(1));
    assert_eq!(created.pages, vec![0, 1, 2]);
    assert_eq!(created.faults(), 3);
    assert_eq!(ctx.sim.tick(), 3);
    assert_eq!(ctx.sim.stats().page_faults, 3);
    assert_eq!(ctx.resident_pages(1), vec![0, 1, 2]);
    ctx.assert_invariants();
}

#[test]
fn duplicate_name_is_rejected_without_side_effects() {
    let mut ctx = ctx();
    let _ = ctx.sim.create_segment("A", 10, P1).unwrap();
    let before = ctx.sim.snapshot();

    assert_eq!(
        ctx.sim.create_segment("A", 4, P2),
        Err(SimError::SegmentNameConflict("A".into()))
    );
    assert_eq!(ctx.sim.snapshot(), before);
}

#[test]
fn automatic_placement_follows_used_pages() {
    let mut ctx = ctx();
    let _ = ctx.sim.access_page(P1, 7);
    let b = ctx.sim.create_segment("B", 5, P1).unwrap();
    assert_eq!(b.pages, vec![8, 9]);

    let c = ctx.sim.create_segment("C", 1, P1).unwrap();
    assert_eq!(c.pages, vec![10]);

    // Another process starts from page 0.
    let d = ctx.sim.create_segment("D", 1, P2).unwrap();
    assert_eq!(d.pages, vec![0]);
}

#[test]
fn explicit_overlap_is_a_page_conflict() {
    let mut ctx = ctx();
    let _ = ctx.sim.create_segment("A", 10, P1).unwrap();
    let tick = ctx.sim.tick();

    assert_eq!(
        ctx.sim.create_segment_at("C", 8, P1, 1),
        Err(SimError::SegmentPageConflict {
            name: "C".into(),
            existing: "A".into(),
            page: 1,
        })
    );
    assert_eq!(ctx.sim.tick(), tick);
    assert!(ctx.sim.segments().iter().all(|s| s.name != "C"));

    // Same pages in another process are fine.
    let other = ctx.sim.create_segment_at("C", 8, P2, 1).unwrap();
    assert_eq!(other.pages, vec![1, 2]);

    // Adjacent pages in the same process are fine too.
    let next = ctx.sim.create_segment_at("E", 4, P1, 3).unwrap();
    assert_eq!(next.pages, vec![3]);
    ctx.assert_invariants();
}

#[test]
fn zero_size_is_rejected() {
    let mut ctx = ctx();
    assert_eq!(ctx.sim.create_segment("Z", 0, P1), Err(SimError::InvalidSize));
    assert!(ctx.sim.segments().is_empty());
    assert_eq!(ctx.sim.tick(), 0);
}

#[test]
fn oversized_segment_is_rejected_before_touching_pages() {
    let mut ctx = ctx();
    assert_eq!(
        ctx.sim.create_segment("huge", u64::MAX, P1),
        Err(SimError::InvalidSize)
    );
    assert_eq!(
        ctx.sim.create_segment_at("huge", u64::MAX / 2, P1, 0),
        Err(SimError::InvalidSize)
    );
    assert!(ctx.sim.segments().is_empty());
    assert!(ctx.sim.paging().page_tables().is_empty());
    assert_eq!(ctx.sim.tick(), 0);
    ctx.assert_invariants();
}

#[test]
fn delete_leaves_pages_resident() {
    let mut ctx = ctx();
    let _ = ctx.sim.create_segment("A", 10, P1).unwrap();

    let removed = ctx.sim.delete_segment("A").unwrap();
    assert_eq!(removed.page_ids, vec![0, 1, 2]);
    assert!(ctx.sim.segments().is_empty());
    assert_eq!(ctx.resident_pages(1), vec![0, 1, 2]);

    assert_eq!(
        ctx.sim.delete_segment("A"),
        Err(SimError::SegmentNotFound("A".into()))
    );
    // The name is free again.
    let again = ctx.sim.create_segment("A", 4, P1).unwrap();
    assert_eq!(again.id, SegmentId(2));
    assert_eq!(again.pages, vec![3]);
}

#[test]
fn deleted_segment_pages_are_evicted_normally() {
    let mut ctx = TestContext::with_paging(4, 3, ReplacementPolicy::Fifo);
    let _ = ctx.sim.create_segment("A", 12, P1).unwrap();
    let _ = ctx.sim.delete_segment("A").unwrap();

    let out = ctx.sim.access_page(P2, 0);
    assert_eq!(out.evicted().map(|r| (r.process, r.page)), Some((P1, 0)));
}

#[test]
fn internal_fragmentation_is_unused_tail_of_last_page() {
    let mut ctx = ctx();
    let _ = ctx.sim.create_segment("A", 10, P1).unwrap();
    let _ = ctx.sim.create_segment("B", 8, P1).unwrap();
    assert_eq!(ctx.sim.stats_report().internal_fragmentation, 2);
    assert_eq!(ctx.sim.segments()[0].internal_fragmentation(4), 2);
}

#[test]
fn paging_reconfiguration_clears_segments() {
    let mut ctx = ctx();
    let _ = ctx.alloc_for(1, 30);
    let _ = ctx.sim.create_segment("A", 10, P1).unwrap();

    ctx.sim
        .set_paging_config(8, 4, ReplacementPolicy::Lru)
        .unwrap();
    assert!(ctx.sim.segments().is_empty());
    assert!(ctx.sim.paging().page_tables().is_empty());
    assert_eq!(ctx.sim.stats().page_faults, 0);
    // Blocks survive.
    assert_eq!(ctx.layout(), vec![(0, 30, false), (30, 70, true)]);
    ctx.assert_invariants();

    assert!(matches!(
        ctx.sim.set_paging_config(0, 4, ReplacementPolicy::Lru),
        Err(SimError::PagingConfigInvalid { .. })
    ));
    assert_eq!(ctx.sim.config().paging.page_size, 8);
}
