//! Name-to-resource resolution within a scope
//!
//! One lookup is issued per name, all concurrently. A name with no match
//! comes back as `None` in its slot instead of failing the batch, so a model
//! can reference an absent MTL or texture and still load.

use crate::error::TransferError;
use crate::fetch::{ResourceRef, ResourceScope, StorageClient};
use crate::runtime::bounded;
use futures::future::try_join_all;
use std::time::Duration;

/// Resolve every name in `names` against `scope`.
///
/// The result has one slot per input name, in input order.
pub async fn locate(
    storage: &dyn StorageClient,
    scope: &ResourceScope,
    names: &[String],
    timeout: Option<Duration>,
) -> Result<Vec<Option<ResourceRef>>, TransferError> {
    let lookups = names.iter().map(|name| async move {
        bounded(timeout, storage.find_item(scope, name))
            .await
            .map_err(|after| TransferError::TimedOut {
                resource: scope.lookup_query(name),
                after,
            })?
    });

    let found = try_join_all(lookups).await?;

    for (name, slot) in names.iter().zip(&found) {
        if slot.is_none() {
            log::warn!("{name} not found in {scope}; continuing without it");
        }
    }

    Ok(found)
}

/// Resolve names and drop the ones that were not found
pub async fn locate_present(
    storage: &dyn StorageClient,
    scope: &ResourceScope,
    names: &[String],
    timeout: Option<Duration>,
) -> Result<Vec<ResourceRef>, TransferError> {
    Ok(locate(storage, scope, names, timeout)
        .await?
        .into_iter()
        .flatten()
        .collect())
}
