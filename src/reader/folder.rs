//! Folder topology: the OBJ file and everything it references are sibling
//! items of one scope.
//!
//! Each tier (OBJ, then MTL, then images) is fetched as one concurrent
//! batch, and a tier only starts once the previous one has fully arrived.

use crate::async_loading::{LoadHandle, LoadState};
use crate::error::TransferError;
use crate::fetch::{ContentMode, Fetcher, ResourceRef};
use crate::locator::locate_present;
use crate::references::{material_libraries, texture_images};
use crate::store::AssetStore;

pub(crate) async fn assemble_folder(
    model: &ResourceRef,
    fetcher: &Fetcher<'_>,
    handle: &LoadHandle,
) -> Result<AssetStore, TransferError> {
    let scope = &model.scope;
    let mut store = AssetStore::new();

    handle.set_state(LoadState::FetchingModel);
    let obj_text = fetcher.fetch(model, ContentMode::Text).await?.into_text();
    let libraries = material_libraries(&obj_text);
    store.add_obj_content(model.name.clone(), obj_text);

    handle.set_state(LoadState::FetchingMaterials);
    let mtl_refs = locate_present(fetcher.storage(), scope, &libraries, fetcher.timeout()).await?;
    let mtl_texts: Vec<String> = fetcher
        .fetch_all(&mtl_refs, ContentMode::Text)
        .await?
        .into_iter()
        .map(|content| content.into_text())
        .collect();
    let images = texture_images(mtl_texts.iter().map(String::as_str));
    for (resource, text) in mtl_refs.iter().zip(mtl_texts) {
        store.add_mtl_content(resource.name.clone(), text);
    }

    handle.set_state(LoadState::FetchingTextures);
    let image_refs = locate_present(fetcher.storage(), scope, &images, fetcher.timeout()).await?;
    let image_data = fetcher.fetch_all(&image_refs, ContentMode::Binary).await?;
    for (resource, content) in image_refs.iter().zip(image_data) {
        store.add_image_content(resource.name.clone(), content.into_bytes());
    }

    log::debug!(
        "Assembled {}: {} material libraries, {} images",
        model.name,
        mtl_refs.len(),
        image_refs.len()
    );
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{MemoryStorage, ProgressTracker, ResourceScope};
    use crate::store::AssetKind;
    use futures::executor::block_on;

    #[test]
    fn test_tiers_land_in_store() {
        let storage = MemoryStorage::new();
        let scope = ResourceScope::new("f");
        let obj = storage.insert(&scope, "m.obj", b"mtllib m.mtl\nmtllib gone.mtl\n".to_vec());
        storage.insert(&scope, "m.mtl", b"newmtl a\nmap_Kd a.png\nmap_Ks gone.png\n".to_vec());
        storage.insert(&scope, "a.png", vec![1, 2, 3]);
        storage.insert(&scope, "unrelated.png", vec![4]);

        let tracker = ProgressTracker::default();
        let fetcher = Fetcher::new(&storage, &tracker);
        let handle = LoadHandle::new();
        let store = block_on(assemble_folder(&obj, &fetcher, &handle)).unwrap();

        assert_eq!(store.len(AssetKind::Obj), 1);
        assert_eq!(store.len(AssetKind::Mtl), 1);
        assert_eq!(store.len(AssetKind::Image), 1);
        assert_eq!(store.get(AssetKind::Image, "a.png").unwrap().raw.as_bytes(), &[1, 2, 3]);
        assert_eq!(handle.state(), LoadState::FetchingTextures);
        assert_eq!(storage.download_count(), 3);
    }
}
