pub mod counters;

pub use counters::{CountersSnapshot, ReconcileCounters};
