pub mod aggregator;
pub mod consensus;
pub mod eps_model;
pub mod extrapolation;
pub mod sources;

pub use aggregator::*;
pub use consensus::*;
pub use eps_model::*;
pub use extrapolation::*;
pub use sources::*;
