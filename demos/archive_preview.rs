//! Archive preview example for obj_preview
//!
//! Loads a model zipped into a single item. Pass a path to a ZIP file to
//! preview it, or run without arguments to use a generated bundle.

use obj_preview::{
    model_kind, LoadState, MemoryStorage, ReaderRegistry, ResourceScope, ResourceTopology,
};
use std::io::{Cursor, Write};
use std::sync::Arc;
use zip::write::FileOptions;
use zip::ZipWriter;

fn generated_bundle() -> anyhow::Result<Vec<u8>> {
    let files = [
        (
            "pyramid/pyramid.obj",
            "mtllib pyramid.mtl\nv 0 0 0\nv 1 0 0\nv 1 0 1\nv 0 0 1\nv 0.5 1 0.5\nusemtl stone\nf 1 2 5\nf 2 3 5\nf 3 4 5\nf 4 1 5\n",
        ),
        ("pyramid/pyramid.mtl", "newmtl stone\nKd 0.6 0.6 0.55\n"),
        ("pyramid/notes.txt", "not part of the model\n"),
    ];

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (path, content) in files {
        writer.start_file(path, FileOptions::default())?;
        writer.write_all(content.as_bytes())?;
    }
    Ok(writer.finish()?.into_inner())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (name, bundle) = match std::env::args().nth(1) {
        Some(path) => {
            let name = std::path::Path::new(&path)
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("model.zip")
                .to_string();
            (name, std::fs::read(&path)?)
        }
        None => ("pyramid.zip".to_string(), generated_bundle()?),
    };

    let storage = Arc::new(MemoryStorage::new());
    let item = storage.insert(&ResourceScope::new("demo-folder"), &name, bundle);

    // A multi-file item is served as one bundle
    let topology = ResourceTopology::for_file_count(3);
    let registry = ReaderRegistry::with_defaults(storage.clone());
    let kind = model_kind("pyramid.obj").unwrap_or_default();

    let mut reader = registry.reader(&kind, topology)?;
    reader.set_target(item);
    let handle = reader.handle().clone();

    let units = reader.run().await?;
    if let LoadState::Completed(count) = handle.state() {
        println!("Loaded {count} units, {} bytes transferred", handle.bytes_loaded());
    }
    for unit in &units {
        let material = unit
            .material
            .as_ref()
            .map(|m| m.name.as_str())
            .unwrap_or("<default>");
        println!("{}: {} triangles, material {}", unit.name, unit.mesh.triangle_count(), material);
    }

    println!("Archive preview example complete!");
    Ok(())
}
