use crate::core::depreciation::DepreciationPolicy;
use crate::domain::model::{Document, FieldMap};
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// External document store holding the listings collection.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn list_all(&self, collection: &str) -> Result<Vec<Document>>;

    /// Partial update: only the given fields change. Fails if the document is gone.
    async fn update_fields(&self, collection: &str, id: &str, fields: &FieldMap) -> Result<()>;
}

#[async_trait]
impl<S: DocumentStore + ?Sized> DocumentStore for Box<S> {
    async fn list_all(&self, collection: &str) -> Result<Vec<Document>> {
        (**self).list_all(collection).await
    }

    async fn update_fields(&self, collection: &str, id: &str, fields: &FieldMap) -> Result<()> {
        (**self).update_fields(collection, id, fields).await
    }
}

#[async_trait]
impl<S: DocumentStore + ?Sized> DocumentStore for Arc<S> {
    async fn list_all(&self, collection: &str) -> Result<Vec<Document>> {
        (**self).list_all(collection).await
    }

    async fn update_fields(&self, collection: &str, id: &str, fields: &FieldMap) -> Result<()> {
        (**self).update_fields(collection, id, fields).await
    }
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

pub trait ConfigProvider: Send + Sync {
    fn collection(&self) -> &str;
    fn concurrency(&self) -> usize;
    fn policy(&self) -> DepreciationPolicy;
}
