use memsim_core::alloc::address_space::{Block, BlockStatus};
use memsim_core::common::{BlockId, ProcessId};
use memsim_core::config::{AllocationPolicy, PagingConfig, ReplacementPolicy, SimConfig};
use memsim_core::sim::Allocation;
use memsim_core::Simulator;

/// Installs a `tracing` subscriber once per test binary; `RUST_LOG` controls output.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Simple `(start, size, free)` view of a block.
pub type Span = (u64, u64, bool);

pub struct TestContext {
    pub sim: Simulator,
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl TestContext {
    /// Memory size 100, first-fit, default paging.
    pub fn new() -> Self {
        Self::with_config(SimConfig::default())
    }

    pub fn with_config(config: SimConfig) -> Self {
        init_tracing();
        let sim = Simulator::new(&config).unwrap();
        Self { sim }
    }

    /// Memory size 100 with the given paging parameters.
    pub fn with_paging(page_size: u64, num_frames: u32, policy: ReplacementPolicy) -> Self {
        Self::with_config(SimConfig {
            paging: PagingConfig::new(page_size, num_frames, policy),
            ..SimConfig::default()
        })
    }

    /// Allocates for process `pid` with the current policy; panics on failure.
    pub fn alloc_for(&mut self, pid: u32, size: u64) -> Allocation {
        self.sim.allocate_for(ProcessId(pid), size).unwrap()
    }

    pub fn free(&mut self, block: BlockId) -> Block {
        self.sim.deallocate(block).unwrap()
    }

    /// Free blocks of sizes 5, 15 and 25 at increasing addresses, separated by allocations.
    ///
    /// Resulting layout: free [0,5), used [5,10), free [10,25), used [25,30),
    /// free [30,55), used [55,100).
    pub fn fragmented() -> Self {
        let mut ctx = Self::new();
        let a = ctx.alloc_for(1, 5);
        let _ = ctx.alloc_for(2, 5);
        let c = ctx.alloc_for(1, 15);
        let _ = ctx.alloc_for(2, 5);
        let e = ctx.alloc_for(1, 25);
        let _ = ctx.alloc_for(2, 45);
        for block in [a.block, c.block, e.block] {
            let _ = ctx.free(block);
        }
        ctx.assert_invariants();
        ctx
    }

    /// Current layout as `(start, size, free)` triples.
    pub fn layout(&self) -> Vec<Span> {
        self.sim
            .blocks()
            .iter()
            .map(|b| (b.start, b.size, b.status == BlockStatus::Free))
            .collect()
    }

    /// Resident page numbers of `pid`, in page order.
    pub fn resident_pages(&self, pid: u32) -> Vec<u64> {
        self.sim
            .paging()
            .page_table(ProcessId(pid))
            .map(|t| t.resident().map(|e| e.virtual_page).collect())
            .unwrap_or_default()
    }

    pub fn set_policy(&mut self, policy: AllocationPolicy) {
        self.sim.set_policy(policy);
    }

    pub fn assert_invariants(&self) {
        if let Err(violation) = self.sim.check_invariants() {
            panic!("invariant violated: {violation}\nstate: {:#?}", self.sim.snapshot());
        }
    }
}
