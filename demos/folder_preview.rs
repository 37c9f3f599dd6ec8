//! Folder preview example for obj_preview
//!
//! Loads a textured quad whose OBJ, MTL and PNG files are sibling items
//! of one folder in an in-memory storage service.

use obj_preview::{
    commit_units, MemoryStorage, ReaderRegistry, RecordingScene, ResourceScope, ResourceTopology,
};
use std::io::Cursor;
use std::sync::Arc;

const QUAD_OBJ: &str = "mtllib quad.mtl
o quad
v -1 -1 0
v 1 -1 0
v 1 1 0
v -1 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
usemtl checker
f 1/1 2/2 3/3 4/4
";

const QUAD_MTL: &str = "newmtl checker
Kd 1 1 1
map_Kd checker.png
";

fn checker_png() -> anyhow::Result<Vec<u8>> {
    let img = image::RgbaImage::from_fn(8, 8, |x, y| {
        if (x + y) % 2 == 0 {
            image::Rgba([255, 255, 255, 255])
        } else {
            image::Rgba([0, 0, 0, 255])
        }
    });
    let mut data = Vec::new();
    img.write_to(&mut Cursor::new(&mut data), image::ImageFormat::Png)?;
    Ok(data)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let storage = Arc::new(MemoryStorage::new().with_chunk_size(128));
    let folder = ResourceScope::new("demo-folder");
    let obj = storage.insert(&folder, "quad.obj", QUAD_OBJ.as_bytes().to_vec());
    storage.insert(&folder, "quad.mtl", QUAD_MTL.as_bytes().to_vec());
    storage.insert(&folder, "checker.png", checker_png()?);

    println!("obj_preview v{}", obj_preview::VERSION);

    let registry = ReaderRegistry::with_defaults(storage.clone());
    let mut reader = registry.reader("obj", ResourceTopology::Folder)?;
    reader.set_target(obj);
    reader.set_progress_callback(|resource, bytes| {
        println!("Loading {}... {} bytes", resource.name, bytes);
    });

    let units = reader.run().await?;
    for unit in &units {
        println!(
            "{}: {} triangles, textured: {}",
            unit.name,
            unit.mesh.triangle_count(),
            unit.is_textured()
        );
    }

    let mut scene = RecordingScene::new();
    commit_units(&mut scene, units);
    if let Some(view) = scene.last_view() {
        println!("View centered on {:?}, size {:?}", view.center(), view.size());
    }

    println!("Folder preview example complete!");
    Ok(())
}
