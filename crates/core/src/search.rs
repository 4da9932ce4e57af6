//! Port to the vehicle catalog.
//!
//! The dialogue core only ever needs one capability from storage: run a
//! positive filter and hand back an ordered page of records. Failures are a
//! distinct outcome from an empty page.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::filter::SearchFilter;
use crate::domain::vehicle::VehicleRecord;
use crate::errors::ApplicationError;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search backend unavailable: {0}")]
    Unavailable(String),
    #[error("search backend returned an invalid record: {0}")]
    InvalidRecord(String),
}

impl From<SearchError> for ApplicationError {
    fn from(value: SearchError) -> Self {
        match value {
            SearchError::Unavailable(message) => Self::Integration(message),
            SearchError::InvalidRecord(message) => Self::Persistence(message),
        }
    }
}

#[async_trait]
pub trait VehicleSearch: Send + Sync {
    async fn search(
        &self,
        filter: &SearchFilter,
        limit: u32,
    ) -> Result<Vec<VehicleRecord>, SearchError>;
}

#[async_trait]
impl<T> VehicleSearch for Arc<T>
where
    T: VehicleSearch + ?Sized,
{
    async fn search(
        &self,
        filter: &SearchFilter,
        limit: u32,
    ) -> Result<Vec<VehicleRecord>, SearchError> {
        (**self).search(filter, limit).await
    }
}
