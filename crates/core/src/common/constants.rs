//! Global simulation constants.

/// Largest memory size a configuration may declare.
pub const MAX_MEMORY_SIZE: u64 = 1 << 32;

/// Largest frame count a paging configuration may declare.
pub const MAX_FRAMES: u32 = 1 << 20;

/// Largest number of pages a single segment may span.
pub const MAX_SEGMENT_PAGES: u64 = 1 << 20;
