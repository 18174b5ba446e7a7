//! Fixed-horizon buffer for on-policy methods.
//!
//! [`TrajectoryStore`] records exactly one rollout of `horizon` steps. Once it is
//! full, [`generate_batches()`](TrajectoryStore::generate_batches) partitions a
//! shuffled permutation of the step indices into minibatches, and the caller
//! drains the store with [`clear_memory()`](TrajectoryStore::clear_memory) after
//! learning.
mod base;
mod batch;
mod config;
pub use base::TrajectoryStore;
pub use batch::TrajectoryBatch;
pub use config::TrajectoryStoreConfig;
