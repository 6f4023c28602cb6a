mod pipeline;
mod service;

pub use pipeline::{CycleReport, Watcher};
pub use service::{WatchEvent, WatchHandle, WatchService};

#[cfg(test)]
pub(crate) use pipeline::testing;
