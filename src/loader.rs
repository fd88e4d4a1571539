//! Drives drawer items through fetch, extraction and composition.
//!
//! Fetches run without holding the context; results are applied afterwards,
//! which is where completions for removed items get dropped.

use std::collections::HashSet;
use std::sync::Arc;

use bytes::Bytes;
use tokio::task::JoinSet;

use crate::client::MediaSource;
use crate::context::{DrawerContext, ItemId};
use crate::error::{DrawerError, Result};
use crate::gate::LoadPhase;

/// Apply the outcome of a media fetch to the context.
///
/// A failed fetch still settles the item (without metadata) before the
/// error is handed back. Returns `Ok(false)` if the item was removed while
/// the fetch was in flight.
pub fn apply_fetch(ctx: &mut DrawerContext, id: ItemId, fetched: Result<Bytes>) -> Result<bool> {
    match fetched {
        Ok(blob) => ctx.on_media_loaded(id, &blob),
        Err(e) => match ctx.on_fetch_failed(id) {
            Ok(true) => {
                tracing::warn!(item = %id, error = %e, "Failed to fetch media");
                Err(e)
            }
            Ok(false) => {
                tracing::debug!(item = %id, error = %e, "Dropping fetch error for removed item");
                Ok(false)
            }
            Err(settle) => {
                tracing::warn!(
                    item = %id,
                    error = %e,
                    settle_error = %settle,
                    "Failed to fetch media for item that could not be settled"
                );
                Err(settle)
            }
        },
    }
}

/// Fetch one item that is in the loading phase and attach its metadata.
pub async fn load_item<S>(ctx: &mut DrawerContext, source: &S, id: ItemId) -> Result<bool>
where
    S: MediaSource + ?Sized,
{
    let descriptor = ctx
        .item(id)
        .ok_or(DrawerError::UnknownItem(id))?
        .descriptor()
        .clone();
    let fetched = source.fetch_media(&descriptor).await;
    apply_fetch(ctx, id, fetched)
}

/// Fetch every item currently in the loading phase concurrently.
///
/// Returns the items whose fetch failed together with the error. Items whose
/// fetch task panicked or was cancelled are settled without metadata and
/// reported as [`DrawerError::FetchAborted`].
pub async fn load_pending(
    ctx: &mut DrawerContext,
    source: Arc<dyn MediaSource>,
) -> Vec<(ItemId, DrawerError)> {
    let pending: Vec<_> = ctx
        .items()
        .filter(|(_, item)| item.load_state().phase() == LoadPhase::Loading)
        .map(|(id, item)| (id, item.descriptor().clone()))
        .collect();

    let mut outstanding: HashSet<ItemId> = pending.iter().map(|(id, _)| *id).collect();
    let mut tasks = JoinSet::new();
    for (id, descriptor) in pending {
        let source = Arc::clone(&source);
        tasks.spawn(async move { (id, source.fetch_media(&descriptor).await) });
    }

    let mut failures = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((id, fetched)) => {
                outstanding.remove(&id);
                if let Err(e) = apply_fetch(ctx, id, fetched) {
                    failures.push((id, e));
                }
            }
            Err(e) => tracing::error!("Media fetch task failed: {}", e),
        }
    }

    let mut aborted: Vec<_> = outstanding.into_iter().collect();
    aborted.sort();
    for id in aborted {
        match apply_fetch(ctx, id, Err(DrawerError::FetchAborted(id))) {
            Ok(_) => {}
            Err(e) => failures.push((id, e)),
        }
    }
    failures
}
