//! Build stage: turns a populated [`AssetStore`] into renderable units
//!
//! Materials are indexed by name across every MTL file, texture images are
//! inlined and decoded, and each OBJ geometry group picks up the material
//! its `usemtl` directive named. Texture decodes are always awaited before
//! any unit is returned, so a renderer never sees a texture slot without
//! pixel data. A broken or missing image only costs that texture.

use crate::config::ReaderConfig;
use crate::error::DecodeError;
use crate::model::{RenderableUnit, SurfaceMaterial};
use crate::runtime::bounded;
use crate::store::{AssetKind, AssetStore};
use crate::texture::{ImageDecoder, Texture, TextureError};
use futures::future::join_all;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Materials of every MTL file, keyed by material name
///
/// Names are expected to be unique across a model; on a collision the
/// material from the MTL file that sorts last wins.
fn index_materials(store: &AssetStore) -> HashMap<String, SurfaceMaterial> {
    let mut by_name = HashMap::new();
    for entry in store.entries(AssetKind::Mtl) {
        for material in entry.materials() {
            if by_name
                .insert(material.name.clone(), material.clone())
                .is_some()
            {
                log::warn!(
                    "Material {} redefined in {}; using this definition",
                    material.name,
                    entry.name
                );
            }
        }
    }
    by_name
}

/// Decode every texture image referenced by `materials` that the store holds.
///
/// Each image is decoded once, however many materials use it. Every wait
/// settles: failures and expired deadlines come back as `None`.
async fn load_textures(
    store: &AssetStore,
    materials: &HashMap<String, SurfaceMaterial>,
    decoder: &dyn ImageDecoder,
    config: &ReaderConfig,
) -> HashMap<String, Option<Arc<Texture>>> {
    let mut requested = HashSet::new();
    let mut waits = Vec::new();

    for material in materials.values() {
        for image_name in material.image_names() {
            if !requested.insert(image_name.to_string()) {
                continue;
            }
            let Some(image) = store.get(AssetKind::Image, image_name) else {
                log::warn!(
                    "Texture {image_name} of material {} is not available",
                    material.name
                );
                continue;
            };

            let name = image_name.to_string();
            let timeout = config.image_timeout();
            waits.push(async move {
                let result = bounded(timeout, decoder.decode(&name, image.raw.as_bytes()))
                    .await
                    .unwrap_or_else(|_| Err(TextureError::TimedOut(name.clone())));
                let texture = match result {
                    Ok(texture) => Some(Arc::new(texture)),
                    Err(err) => {
                        log::warn!("Texture {name} could not be loaded: {err}");
                        None
                    }
                };
                (name, texture)
            });
        }
    }

    join_all(waits).await.into_iter().collect()
}

/// Build renderable units from a populated store.
///
/// Decodes whatever has not been decoded yet; a malformed OBJ or MTL file
/// fails the whole build.
pub async fn build_pipeline(
    mut store: AssetStore,
    decoder: &dyn ImageDecoder,
    config: &ReaderConfig,
) -> Result<Vec<RenderableUnit>, DecodeError> {
    store.decode_everything(config)?;

    let mut materials = index_materials(&store);
    let textures = load_textures(&store, &materials, decoder, config).await;

    for material in materials.values_mut() {
        for binding in &mut material.textures {
            if let Some(image) = store.get(AssetKind::Image, &binding.image_name) {
                binding.inline_uri = image.inline_uri.clone();
            }
            binding.texture = textures.get(&binding.image_name).cloned().flatten();
        }
    }

    let mut units = Vec::new();
    for entry in store.entries(AssetKind::Obj) {
        for group in entry.geometry() {
            let material = group
                .material_name
                .as_ref()
                .and_then(|name| materials.get(name))
                .cloned();
            if material.is_none() {
                log::debug!("{}: group {} has no material", entry.name, group.name);
            }

            let mut unit = RenderableUnit::new(entry.name.clone(), group.clone());
            unit.material = material;
            units.push(unit);
        }
    }

    log::info!(
        "Built {} renderable units ({} textured)",
        units.len(),
        units.iter().filter(|u| u.is_textured()).count()
    );
    Ok(units)
}
