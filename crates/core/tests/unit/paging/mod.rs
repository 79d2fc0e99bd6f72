//! Paging engine tests.
