use async_trait::async_trait;
use carfinder_core::domain::vehicle::VehicleRecord;
use carfinder_core::search::{SearchError, VehicleSearch};
use thiserror::Error;

pub mod memory;
pub mod vehicle;

pub use memory::InMemoryVehicleRepository;
pub use vehicle::SqlVehicleRepository;

/// Page size used when a caller asks for something outside `1..=MAX_PAGE_SIZE`.
pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<RepositoryError> for SearchError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::Database(error) => Self::Unavailable(error.to_string()),
            RepositoryError::Decode(message) => Self::InvalidRecord(message),
        }
    }
}

/// Write side of the catalog. Reads go through [`VehicleSearch`].
#[async_trait]
pub trait VehicleRepository: VehicleSearch {
    /// Stores a record and returns its assigned id; any `id` on the input is ignored.
    async fn insert(&self, vehicle: &VehicleRecord) -> Result<i64, RepositoryError>;
    async fn count(&self) -> Result<i64, RepositoryError>;
}

pub(crate) fn effective_limit(limit: u32) -> u32 {
    if (1..=MAX_PAGE_SIZE).contains(&limit) {
        limit
    } else {
        DEFAULT_PAGE_SIZE
    }
}

#[cfg(test)]
mod tests {
    use carfinder_core::search::SearchError;

    use super::{effective_limit, RepositoryError};

    #[test]
    fn out_of_range_limits_fall_back_to_default_page() {
        assert_eq!(effective_limit(0), 20);
        assert_eq!(effective_limit(1), 1);
        assert_eq!(effective_limit(100), 100);
        assert_eq!(effective_limit(101), 20);
    }

    #[test]
    fn repository_errors_keep_failure_distinct_from_empty() {
        let error: SearchError = RepositoryError::Database(sqlx::Error::PoolTimedOut).into();
        assert!(matches!(error, SearchError::Unavailable(_)));
        let error: SearchError = RepositoryError::Decode("fuel `steam`".to_string()).into();
        assert!(matches!(error, SearchError::InvalidRecord(_)));
    }
}
