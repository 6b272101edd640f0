pub mod allocation;
pub mod error;
pub mod plan;
pub mod rounding;
pub mod tax;
pub mod types;

pub use error::RebalanceError;
pub use rounding::{round_divide, RoundingMode, DEFAULT_ROUNDING};
pub use types::*;

/// Standard result type for all rebalance operations
pub type RebalanceResult<T> = Result<T, RebalanceError>;
