/// swout — output aggregation and dissemination for daily ecohydrology
/// simulations.
///
/// Re-exports the engine of `swout-core`; see that crate for the modules.
pub use swout_core::*;
