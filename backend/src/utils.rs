use crate::error::ApiError;
use std::str::FromStr;

pub fn parse_id<T: FromStr>(id: &str) -> Result<T, ApiError> {
    id.parse().map_err(|_| ApiError::InvalidId)
}
