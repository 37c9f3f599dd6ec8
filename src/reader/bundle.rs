//! Archive topology: the whole model is one zipped item

use crate::archive::unpack;
use crate::async_loading::{LoadHandle, LoadState};
use crate::error::Result;
use crate::fetch::{ContentMode, Fetcher, ResourceRef};
use crate::store::AssetStore;

pub(crate) async fn assemble_bundle(
    bundle: &ResourceRef,
    fetcher: &Fetcher<'_>,
    handle: &LoadHandle,
) -> Result<AssetStore> {
    handle.set_state(LoadState::FetchingModel);
    let bytes = fetcher.fetch(bundle, ContentMode::Binary).await?.into_bytes();

    handle.set_state(LoadState::Unpacking);
    let entries = unpack(&bytes)?;
    let store = AssetStore::from_unpacked(entries);

    log::debug!("Assembled {} from {} bundle entries", bundle.name, store.total_len());
    Ok(store)
}
