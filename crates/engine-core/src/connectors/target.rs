use crate::error::StoreError;
use async_trait::async_trait;
use model::records::{TargetRecord, key::NaturalKey};
use std::collections::HashMap;

/// Write side of the new store for one record family.
#[async_trait]
pub trait TargetStore<T: TargetRecord>: Send + Sync {
    /// Bulk membership check by natural key.
    ///
    /// Returns every requested key that already exists, mapped to the id of
    /// the target record holding it. Must be answered with one round trip per
    /// call, never one query per key.
    async fn find_existing(
        &self,
        keys: &[NaturalKey],
    ) -> Result<HashMap<NaturalKey, String>, StoreError>;

    /// Inserts the rows in order as a single atomic operation.
    async fn insert(&self, rows: &[T]) -> Result<(), StoreError>;

    /// Inserts the dependent rows (accounts, statistics) of already inserted
    /// primary rows. Returns the number of dependent rows written.
    async fn insert_dependents(&self, rows: &[T]) -> Result<usize, StoreError>;
}
