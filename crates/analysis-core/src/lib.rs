pub mod config;
pub mod error;
pub mod numeric;
pub mod symbol;
pub mod traits;
pub mod types;
pub mod validation;

pub use config::*;
pub use error::*;
pub use symbol::*;
pub use traits::*;
pub use types::*;
