//! Fixed-capacity circular replay buffer of single-agent transitions.
//!
//! [`TransitionStore`] keeps parallel columns for observations, actions, next
//! observations, rewards and episode flags. The write counter grows without
//! bound and the write position is the counter modulo the capacity, so once the
//! store is full the oldest transition is overwritten.
//!
//! ```rust
//! use kelp_core::{TransitionStore, TransitionStoreConfig};
//!
//! let config = TransitionStoreConfig::default()
//!     .capacity(4)
//!     .batch_size(2)
//!     .obs_dim(1)
//!     .act_dim(1);
//! let mut store = TransitionStore::<i64>::build(&config).unwrap();
//!
//! for t in 0..6 {
//!     let s = [t as f32];
//!     store.store(&s, &[0], t as f32, &s, false, false).unwrap();
//! }
//! assert_eq!(store.len(), 4);
//! assert_eq!(store.get(0).unwrap().reward, 2.0);
//!
//! let batch = store.sample(2).unwrap();
//! assert_eq!(batch.len(), 2);
//! ```
mod base;
mod batch;
mod config;
pub use base::TransitionStore;
pub(crate) use base::sample_indices;
pub use batch::{TransitionBatch, TransitionRef};
pub use config::TransitionStoreConfig;
