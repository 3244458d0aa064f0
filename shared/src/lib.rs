pub mod error;
pub mod models;
pub mod validation;
pub mod user_info;
pub mod tally;

pub use error::{CastError, Error, ErrorCode};
pub use models::*;
pub use validation::*;
pub use user_info::*;
pub use tally::{participation_percent, position_results, tally_from_votes};

#[cfg(test)]
mod tests;
