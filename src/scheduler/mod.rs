//! Scheduling primitives: the per-worker priority lane set.

pub(crate) mod lanes;
