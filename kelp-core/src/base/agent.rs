//! Agent.
use crate::record::Record;
use anyhow::Result;
use std::path::{Path, PathBuf};

/// Represents a trainable policy owning its experience store.
///
/// Action selection is agent specific, so it is not a part of this trait.
/// Agents expose it as an inherent `choose_action` method.
pub trait Agent {
    /// Set the policy to training mode.
    fn train(&mut self);

    /// Set the policy to evaluation mode.
    fn eval(&mut self);

    /// Return if it is in training mode.
    fn is_train(&self) -> bool;

    /// Performs a learning step with the transitions in the agent's store.
    ///
    /// Returns `Ok(None)` when the store does not hold enough data yet.
    fn learn(&mut self) -> Result<Option<Record>>;

    /// Saves the parameters of the agent in the given directory.
    ///
    /// One file is written per network, named `{network_name}_{algorithm_suffix}`.
    /// Optimizer states are not saved. Returns the paths of the written files.
    fn save_params(&self, path: &Path) -> Result<Vec<PathBuf>>;

    /// Loads the parameters of the agent from the given directory.
    fn load_params(&mut self, path: &Path) -> Result<()>;
}
