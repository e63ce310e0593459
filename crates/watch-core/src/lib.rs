pub mod error;
pub mod evaluator;
pub mod traits;
pub mod types;

pub use error::*;
pub use evaluator::*;
pub use traits::*;
pub use types::*;
