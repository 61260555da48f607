//! Runtime support for memoized getters.
//!
//! This module provides the dependency tracking context that records which
//! state paths each getter reads and invalidates getters on overlapping writes.

mod context;

pub(crate) use context::DependencyContext;
