pub mod indicators;
pub mod votes;
pub mod engine;
pub mod conditions;


pub use indicators::*;
pub use votes::*;
pub use engine::*;
pub use conditions::*;
