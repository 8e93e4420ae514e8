//! A fetched record table with paging and local removal after delete.

use crate::api::{ApiError, CrmClient, Resource, ResourceApi};
use crate::utils::Paginator;

pub struct RecordList<R> {
    pages: Paginator<R>,
}

impl<R: Resource> RecordList<R> {
    pub fn new(records: Vec<R>, page_size: usize) -> Self {
        Self {
            pages: Paginator::new(records, page_size),
        }
    }

    pub async fn load(client: &CrmClient, page_size: usize) -> Result<Self, ApiError> {
        let records = ResourceApi::<R>::new(client).list().await?;
        tracing::debug!(kind = R::PLURAL, count = records.len(), "Loaded records");
        Ok(Self::new(records, page_size))
    }

    pub fn pages(&self) -> &Paginator<R> {
        &self.pages
    }

    pub fn pages_mut(&mut self) -> &mut Paginator<R> {
        &mut self.pages
    }

    /// Delete on the backend, then drop the record locally without refetching.
    /// Returns the backend's confirmation message.
    pub async fn delete(&mut self, client: &CrmClient, id: &str) -> Result<String, ApiError> {
        let message = ResourceApi::<R>::new(client).delete(id).await?;
        if self
            .pages
            .remove_where(|record| record.record_id() == Some(id))
            .is_none()
        {
            tracing::debug!(kind = R::SINGULAR, id, "Deleted record was not in the local list");
        }
        Ok(message)
    }
}
