//! Integration tests for loading a model spread across a folder

use obj_preview::{
    LoadState, MemoryStorage, PreviewError, ReaderRegistry, ResourceRef, ResourceScope,
    ResourceTopology, StorageRequest, TransferError,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

const BOX_OBJ: &str = "# unit cube
mtllib box.mtl
o box
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
v 0 0 1
v 1 0 1
v 1 1 1
v 0 1 1
vt 0 0
vt 1 0
vt 1 1
vt 0 1
usemtl crate
f 1/1 2/2 3/3 4/4
f 5/1 6/2 7/3 8/4
f 1/1 2/2 6/3 5/4
f 4/1 3/2 7/3 8/4
f 1/1 4/2 8/3 5/4
f 2/1 3/2 7/3 6/4
";

const BOX_MTL: &str = "newmtl crate
Ka 0.1 0.1 0.1
Kd 0.8 0.6 0.4
Ns 10
map_Kd box_diffuse.png
";

fn png(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([200, 150, 100, 255]));
    let mut data = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut data), image::ImageFormat::Png)
        .expect("Failed to encode test image");
    data
}

struct Folder {
    storage: Arc<MemoryStorage>,
    obj: ResourceRef,
    image: Option<ResourceRef>,
}

fn box_folder(mtl: Option<&str>, image: Option<Vec<u8>>) -> Folder {
    let storage = Arc::new(MemoryStorage::new().with_chunk_size(64));
    let scope = ResourceScope::new("models");
    let obj = storage.insert(&scope, "box.obj", BOX_OBJ.as_bytes().to_vec());
    if let Some(mtl) = mtl {
        storage.insert(&scope, "box.mtl", mtl.as_bytes().to_vec());
    }
    let image = image.map(|data| storage.insert(&scope, "box_diffuse.png", data));
    // Same names in another folder must never be picked up
    let elsewhere = ResourceScope::new("elsewhere");
    storage.insert(&elsewhere, "box.mtl", b"newmtl crate\nKd 1 0 0\n".to_vec());

    Folder { storage, obj, image }
}

#[tokio::test]
async fn test_textured_box_loads() {
    let folder = box_folder(Some(BOX_MTL), Some(png(4, 4)));
    let registry = ReaderRegistry::with_defaults(folder.storage.clone());

    let mut reader = registry.reader("obj", ResourceTopology::Folder).unwrap();
    reader.set_target(folder.obj.clone());
    let units = reader.run().await.unwrap();

    assert_eq!(units.len(), 1);
    let unit = &units[0];
    assert_eq!(unit.source, "box.obj");
    assert_eq!(unit.mesh.triangle_count(), 12);
    assert!(unit.is_textured());

    let material = unit.material.as_ref().unwrap();
    assert_eq!(material.name, "crate");
    assert_eq!(material.diffuse, [0.8, 0.6, 0.4]);
    let binding = &material.textures[0];
    assert_eq!(binding.image_name, "box_diffuse.png");
    assert!(binding.inline_uri.as_deref().unwrap().starts_with("data:image/png;base64,"));
    assert_eq!(binding.texture.as_ref().unwrap().width, 4);

    assert_eq!(folder.storage.download_count(), 3);
    assert_eq!(folder.storage.lookup_count(), 2);
    assert_eq!(reader.handle().state(), LoadState::Completed(1));
}

#[tokio::test]
async fn test_lookups_stay_in_scope() {
    let folder = box_folder(Some(BOX_MTL), Some(png(1, 1)));
    let registry = ReaderRegistry::with_defaults(folder.storage.clone());

    let mut reader = registry.reader("obj", ResourceTopology::Folder).unwrap();
    reader.set_target(folder.obj.clone());
    reader.run().await.unwrap();

    let lookups: Vec<(String, String)> = folder
        .storage
        .requests()
        .into_iter()
        .filter_map(|request| match request {
            StorageRequest::Lookup { scope, name } => Some((scope, name)),
            StorageRequest::Download(_) => None,
        })
        .collect();
    assert_eq!(
        lookups,
        vec![
            ("models".to_string(), "box.mtl".to_string()),
            ("models".to_string(), "box_diffuse.png".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_progress_reported_per_resource() {
    let image = png(16, 16);
    let folder = box_folder(Some(BOX_MTL), Some(image.clone()));
    let registry = ReaderRegistry::with_defaults(folder.storage.clone());

    let seen: Arc<Mutex<Vec<(String, u64)>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);

    let mut reader = registry.reader("obj", ResourceTopology::Folder).unwrap();
    reader.set_target(folder.obj.clone());
    reader.set_progress_callback(move |resource, bytes| {
        sink.lock().push((resource.name.clone(), bytes));
    });
    reader.run().await.unwrap();

    let seen = seen.lock();
    let mut last: HashMap<&str, u64> = HashMap::new();
    for (name, bytes) in seen.iter() {
        let previous = last.insert(name.as_str(), *bytes).unwrap_or(0);
        assert!(*bytes > previous, "progress for {name} went backwards");
    }

    assert_eq!(last["box.obj"], BOX_OBJ.len() as u64);
    assert_eq!(last["box.mtl"], BOX_MTL.len() as u64);
    assert_eq!(last["box_diffuse.png"], image.len() as u64);
    assert_eq!(
        reader.handle().bytes_loaded(),
        (BOX_OBJ.len() + BOX_MTL.len() + image.len()) as u64
    );
}

#[tokio::test]
async fn test_progress_without_known_length() {
    let storage = Arc::new(MemoryStorage::new().with_chunk_size(8).without_total());
    let scope = ResourceScope::new("models");
    let obj = storage.insert(&scope, "plain.obj", b"v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n".to_vec());

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);

    let registry = ReaderRegistry::with_defaults(storage.clone());
    let mut reader = registry.reader("obj", ResourceTopology::Folder).unwrap();
    reader.set_target(obj);
    reader.set_progress_callback(move |_, bytes| sink.lock().push(bytes));
    let units = reader.run().await.unwrap();

    assert_eq!(units.len(), 1);
    assert!(units[0].material.is_none());
    assert_eq!(*seen.lock(), vec![8, 16, 24, 32]);
}

#[tokio::test]
async fn test_missing_material_library_is_soft_miss() {
    let folder = box_folder(None, Some(png(1, 1)));
    let registry = ReaderRegistry::with_defaults(folder.storage.clone());

    let mut reader = registry.reader("obj", ResourceTopology::Folder).unwrap();
    reader.set_target(folder.obj.clone());
    let units = reader.run().await.unwrap();

    assert_eq!(units.len(), 1);
    assert!(units[0].material.is_none());
    // Only the OBJ itself was downloaded
    assert_eq!(folder.storage.download_count(), 1);
}

#[tokio::test]
async fn test_missing_texture_still_builds() {
    let folder = box_folder(Some(BOX_MTL), None);
    let registry = ReaderRegistry::with_defaults(folder.storage.clone());

    let mut reader = registry.reader("obj", ResourceTopology::Folder).unwrap();
    reader.set_target(folder.obj.clone());
    let units = reader.run().await.unwrap();

    assert_eq!(units.len(), 1);
    let material = units[0].material.as_ref().unwrap();
    assert_eq!(material.name, "crate");
    assert!(material.textures[0].texture.is_none());
    assert!(!units[0].is_textured());
}

#[tokio::test]
async fn test_corrupt_texture_does_not_hang() {
    let folder = box_folder(Some(BOX_MTL), Some(b"not really a png".to_vec()));
    let registry = ReaderRegistry::with_defaults(folder.storage.clone());

    let mut reader = registry.reader("obj", ResourceTopology::Folder).unwrap();
    reader.set_target(folder.obj.clone());
    let units = reader.run().await.unwrap();

    assert_eq!(units.len(), 1);
    assert!(!units[0].is_textured());
}

#[tokio::test]
async fn test_failed_transfer_aborts_load() {
    let folder = box_folder(Some(BOX_MTL), Some(png(1, 1)));
    let texture = folder.image.as_ref().unwrap();
    folder.storage.fail_downloads_of(&texture.id);
    let registry = ReaderRegistry::with_defaults(folder.storage.clone());

    let mut reader = registry.reader("obj", ResourceTopology::Folder).unwrap();
    reader.set_target(folder.obj.clone());
    let result = reader.run().await;

    assert!(matches!(
        result,
        Err(PreviewError::Transfer(TransferError::Status { status: 500, .. }))
    ));
    assert!(reader.handle().is_failed());
}

#[tokio::test]
async fn test_malformed_obj_fails_load() {
    let storage = Arc::new(MemoryStorage::new());
    let scope = ResourceScope::new("models");
    let obj = storage.insert(&scope, "broken.obj", b"v 0 0 zero\n".to_vec());

    let registry = ReaderRegistry::with_defaults(storage.clone());
    let mut reader = registry.reader("obj", ResourceTopology::Folder).unwrap();
    reader.set_target(obj);

    assert!(matches!(reader.run().await, Err(PreviewError::Decode(_))));
    assert!(reader.handle().is_failed());
}

#[tokio::test]
async fn test_run_without_target() {
    let storage = Arc::new(MemoryStorage::new());
    let registry = ReaderRegistry::with_defaults(storage.clone());

    let reader = registry.reader("obj", ResourceTopology::Folder).unwrap();
    assert!(matches!(reader.run().await, Err(PreviewError::MissingSource)));
    assert!(storage.requests().is_empty());
}
