//! In-memory store of model files keyed by file name
//!
//! Both load topologies fill an [`AssetStore`]; the build stage consumes
//! it. Each kind has its own namespace, and putting a name twice replaces
//! the earlier entry.

use crate::config::ReaderConfig;
use crate::error::DecodeError;
use crate::model::{GeometryGroup, Mesh, SurfaceMaterial};
use crate::references::{is_library_line, material_uses};
use crate::texture::{extension, inline_data_uri};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::io::BufReader;
use std::path::Path;

/// Kind of model file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AssetKind {
    Obj,
    Mtl,
    Image,
}

impl AssetKind {
    /// Classify a file by its extension (case-insensitive)
    pub fn from_file_name(name: &str) -> Option<Self> {
        match extension(name)?.as_str() {
            "obj" => Some(Self::Obj),
            "mtl" => Some(Self::Mtl),
            "jpg" | "jpeg" | "png" => Some(Self::Image),
            _ => None,
        }
    }

    /// Whether content of this kind is handled as text
    pub fn is_text(&self) -> bool {
        !matches!(self, Self::Image)
    }
}

/// Undecoded file content
#[derive(Debug, Clone, PartialEq)]
pub enum RawContent {
    Text(String),
    Binary(Vec<u8>),
}

impl RawContent {
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            Self::Text(text) => Cow::Borrowed(text),
            Self::Binary(bytes) => String::from_utf8_lossy(bytes),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(text) => text.as_bytes(),
            Self::Binary(bytes) => bytes,
        }
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<String> for RawContent {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for RawContent {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<Vec<u8>> for RawContent {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Binary(bytes)
    }
}

impl From<crate::fetch::FetchedContent> for RawContent {
    fn from(content: crate::fetch::FetchedContent) -> Self {
        match content {
            crate::fetch::FetchedContent::Text(text) => Self::Text(text),
            crate::fetch::FetchedContent::Binary(bytes) => Self::Binary(bytes),
        }
    }
}

/// Parsed form of an OBJ or MTL file
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedAsset {
    Geometry(Vec<GeometryGroup>),
    Materials(Vec<SurfaceMaterial>),
}

/// One model file and what later stages derived from it
#[derive(Debug, Clone, PartialEq)]
pub struct AssetEntry {
    pub name: String,
    pub kind: AssetKind,
    pub raw: RawContent,
    pub decoded: Option<DecodedAsset>,
    /// `data:` URI, images only
    pub inline_uri: Option<String>,
}

impl AssetEntry {
    pub fn new(kind: AssetKind, name: impl Into<String>, raw: RawContent) -> Self {
        Self {
            name: name.into(),
            kind,
            raw,
            decoded: None,
            inline_uri: None,
        }
    }

    pub fn is_decoded(&self) -> bool {
        match self.kind {
            AssetKind::Image => self.inline_uri.is_some(),
            _ => self.decoded.is_some(),
        }
    }

    pub fn geometry(&self) -> &[GeometryGroup] {
        match &self.decoded {
            Some(DecodedAsset::Geometry(groups)) => groups,
            _ => &[],
        }
    }

    pub fn materials(&self) -> &[SurfaceMaterial] {
        match &self.decoded {
            Some(DecodedAsset::Materials(materials)) => materials,
            _ => &[],
        }
    }
}

/// OBJ, MTL and image files of one model, keyed by file name per kind
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssetStore {
    obj: BTreeMap<String, AssetEntry>,
    mtl: BTreeMap<String, AssetEntry>,
    image: BTreeMap<String, AssetEntry>,
}

impl AssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self, kind: AssetKind) -> &BTreeMap<String, AssetEntry> {
        match kind {
            AssetKind::Obj => &self.obj,
            AssetKind::Mtl => &self.mtl,
            AssetKind::Image => &self.image,
        }
    }

    fn table_mut(&mut self, kind: AssetKind) -> &mut BTreeMap<String, AssetEntry> {
        match kind {
            AssetKind::Obj => &mut self.obj,
            AssetKind::Mtl => &mut self.mtl,
            AssetKind::Image => &mut self.image,
        }
    }

    /// Insert or replace the entry `name` of `kind`
    pub fn put(&mut self, kind: AssetKind, name: impl Into<String>, content: impl Into<RawContent>) {
        let name = name.into();
        if self
            .table_mut(kind)
            .insert(name.clone(), AssetEntry::new(kind, name.clone(), content.into()))
            .is_some()
        {
            log::debug!("Replaced {kind:?} entry {name}");
        }
    }

    pub fn add_obj_content(&mut self, name: impl Into<String>, content: impl Into<RawContent>) {
        self.put(AssetKind::Obj, name, content);
    }

    pub fn add_mtl_content(&mut self, name: impl Into<String>, content: impl Into<RawContent>) {
        self.put(AssetKind::Mtl, name, content);
    }

    pub fn add_image_content(&mut self, name: impl Into<String>, content: impl Into<RawContent>) {
        self.put(AssetKind::Image, name, content);
    }

    pub fn get(&self, kind: AssetKind, name: &str) -> Option<&AssetEntry> {
        self.table(kind).get(name)
    }

    /// Entries of one kind, ordered by name
    pub fn entries(&self, kind: AssetKind) -> impl Iterator<Item = &AssetEntry> {
        self.table(kind).values()
    }

    pub fn len(&self, kind: AssetKind) -> usize {
        self.table(kind).len()
    }

    pub fn total_len(&self) -> usize {
        self.obj.len() + self.mtl.len() + self.image.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total_len() == 0
    }

    /// Decode every entry of `kind` that has not been decoded yet.
    ///
    /// OBJ geometry is split on every `usemtl` switch and keeps the selected
    /// material name, independent of which MTL entries are present.
    pub fn decode_all(&mut self, kind: AssetKind, config: &ReaderConfig) -> Result<(), DecodeError> {
        match kind {
            AssetKind::Obj => {
                let options = config.obj_load_options();
                for entry in self.obj.values_mut().filter(|e| e.decoded.is_none()) {
                    let groups = decode_obj(&entry.name, &entry.raw.as_text(), &options)?;
                    log::debug!("Decoded {} into {} geometry groups", entry.name, groups.len());
                    entry.decoded = Some(DecodedAsset::Geometry(groups));
                }
            }
            AssetKind::Mtl => {
                for entry in self.mtl.values_mut().filter(|e| e.decoded.is_none()) {
                    let materials = decode_mtl(&entry.name, &entry.raw.as_text())?;
                    log::debug!("Decoded {} into {} materials", entry.name, materials.len());
                    entry.decoded = Some(DecodedAsset::Materials(materials));
                }
            }
            AssetKind::Image => {
                for entry in self.image.values_mut().filter(|e| e.inline_uri.is_none()) {
                    entry.inline_uri = Some(inline_data_uri(&entry.name, entry.raw.as_bytes()));
                }
            }
        }
        Ok(())
    }

    /// Decode every kind, materials first
    pub fn decode_everything(&mut self, config: &ReaderConfig) -> Result<(), DecodeError> {
        for kind in [AssetKind::Mtl, AssetKind::Obj, AssetKind::Image] {
            self.decode_all(kind, config)?;
        }
        Ok(())
    }
}

fn decode_mtl(name: &str, text: &str) -> Result<Vec<SurfaceMaterial>, DecodeError> {
    let (materials, _) =
        tobj::load_mtl_buf(&mut BufReader::new(text.as_bytes())).map_err(|source| {
            DecodeError::Mtl {
                name: name.to_string(),
                source,
            }
        })?;
    Ok(materials.iter().map(SurfaceMaterial::from_mtl).collect())
}

/// Library name handed to the parser in place of the OBJ's own `mtllib` lines
const MATERIAL_USES_LIBRARY: &str = "material-uses.mtl";

/// Parse OBJ text into geometry groups, one per `usemtl` switch.
///
/// Material libraries are not resolved here: the parser is given a library
/// declaring every material the OBJ selects, so it splits on each switch and
/// records the selected name whether or not a matching MTL file exists.
/// Names are bound to real materials when the pipeline is built.
fn decode_obj(
    name: &str,
    text: &str,
    options: &tobj::LoadOptions,
) -> Result<Vec<GeometryGroup>, DecodeError> {
    let uses = material_uses(text);
    let declared: String = uses.iter().map(|m| format!("newmtl {m}\n")).collect();

    let mut source = String::with_capacity(text.len() + 32);
    if !uses.is_empty() {
        source.push_str(&format!("mtllib {MATERIAL_USES_LIBRARY}\n"));
    }
    for line in text.lines().filter(|line| !is_library_line(line)) {
        source.push_str(line);
        source.push('\n');
    }

    let material_loader =
        |_: &Path| tobj::load_mtl_buf(&mut BufReader::new(declared.as_bytes()));

    let (models, materials) =
        tobj::load_obj_buf(&mut BufReader::new(source.as_bytes()), options, material_loader)
            .map_err(|source| DecodeError::Obj {
                name: name.to_string(),
                source,
            })?;

    let materials = materials.unwrap_or_else(|err| {
        log::warn!("{name}: material names unusable: {err}");
        Vec::new()
    });

    Ok(models
        .iter()
        .map(|model| GeometryGroup {
            name: model.name.clone(),
            material_name: model
                .mesh
                .material_id
                .and_then(|id| materials.get(id))
                .map(|m| m.name.clone()),
            mesh: Mesh::from_obj(&model.mesh),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CUBE_FACE_OBJ: &str = "mtllib box.mtl
o box
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
usemtl red
f 1/1 2/2 3/3
usemtl blue
f 1/1 3/3 4/4
";

    const BOX_MTL: &str = "newmtl red\nKd 1 0 0\nnewmtl blue\nKd 0 0 1\nmap_Kd blue.png\n";

    #[test]
    fn test_classify_extensions() {
        assert_eq!(AssetKind::from_file_name("a.OBJ"), Some(AssetKind::Obj));
        assert_eq!(AssetKind::from_file_name("a.mtl"), Some(AssetKind::Mtl));
        assert_eq!(AssetKind::from_file_name("a.Jpeg"), Some(AssetKind::Image));
        assert_eq!(AssetKind::from_file_name("a.png"), Some(AssetKind::Image));
        assert_eq!(AssetKind::from_file_name("readme.txt"), None);
        assert_eq!(AssetKind::from_file_name("png"), None);
    }

    #[test]
    fn test_put_overwrites() {
        let mut store = AssetStore::new();
        store.add_obj_content("box.obj", "v 0 0 0");
        store.add_obj_content("box.obj", "v 1 1 1");
        store.add_mtl_content("box.mtl", "newmtl a");
        store.add_mtl_content("box.mtl", "newmtl b");
        store.add_image_content("t.png", vec![1u8]);
        store.add_image_content("t.png", vec![2u8]);

        assert_eq!(store.len(AssetKind::Obj), 1);
        assert_eq!(store.len(AssetKind::Mtl), 1);
        assert_eq!(store.len(AssetKind::Image), 1);
        assert_eq!(
            store.get(AssetKind::Obj, "box.obj").unwrap().raw.as_text(),
            "v 1 1 1"
        );
        assert_eq!(store.get(AssetKind::Image, "t.png").unwrap().raw.as_bytes(), &[2]);
    }

    #[test]
    fn test_same_name_different_kinds() {
        let mut store = AssetStore::new();
        store.put(AssetKind::Obj, "model", "v 0 0 0");
        store.put(AssetKind::Mtl, "model", "newmtl a");
        assert_eq!(store.total_len(), 2);
    }

    #[test]
    fn test_decode_splits_groups_by_material() {
        let mut store = AssetStore::new();
        store.add_obj_content("box.obj", CUBE_FACE_OBJ);
        store.add_mtl_content("box.mtl", BOX_MTL);
        store.decode_everything(&ReaderConfig::default()).unwrap();

        let obj = store.get(AssetKind::Obj, "box.obj").unwrap();
        let materials: Vec<Option<&str>> = obj
            .geometry()
            .iter()
            .map(|g| g.material_name.as_deref())
            .collect();
        assert_eq!(materials, vec![Some("red"), Some("blue")]);
        assert!(obj.geometry().iter().all(|g| g.mesh.triangle_count() == 1));

        let mtl = store.get(AssetKind::Mtl, "box.mtl").unwrap();
        assert_eq!(mtl.materials().len(), 2);
    }

    #[test]
    fn test_decode_without_library() {
        let mut store = AssetStore::new();
        store.add_obj_content("box.obj", CUBE_FACE_OBJ);
        store.decode_all(AssetKind::Obj, &ReaderConfig::default()).unwrap();

        let groups = store.get(AssetKind::Obj, "box.obj").unwrap().geometry();
        let materials: Vec<Option<&str>> =
            groups.iter().map(|g| g.material_name.as_deref()).collect();
        assert_eq!(materials, vec![Some("red"), Some("blue")]);
    }

    #[test]
    fn test_decode_ignores_library_names() {
        let obj = CUBE_FACE_OBJ.replace("mtllib box.mtl", "mtllib exported_by_tool.mtl");
        let mut store = AssetStore::new();
        store.add_obj_content("box.obj", obj.as_str());
        store.add_obj_content("bare.obj", CUBE_FACE_OBJ.trim_start_matches("mtllib box.mtl\n"));
        store.add_mtl_content("other.mtl", BOX_MTL);
        store.decode_everything(&ReaderConfig::default()).unwrap();

        for name in ["box.obj", "bare.obj"] {
            let groups = store.get(AssetKind::Obj, name).unwrap().geometry();
            let materials: Vec<Option<&str>> =
                groups.iter().map(|g| g.material_name.as_deref()).collect();
            assert_eq!(materials, vec![Some("red"), Some("blue")], "{name}");
        }
    }

    #[test]
    fn test_decode_without_usemtl() {
        let mut store = AssetStore::new();
        store.add_obj_content("tri.obj", "mtllib tri.mtl\nv 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n");
        store.decode_all(AssetKind::Obj, &ReaderConfig::default()).unwrap();

        let groups = store.get(AssetKind::Obj, "tri.obj").unwrap().geometry();
        assert_eq!(groups.len(), 1);
        assert!(groups[0].material_name.is_none());
    }

    #[test]
    fn test_decode_malformed_obj() {
        let mut store = AssetStore::new();
        store.add_obj_content("bad.obj", "v 0 0 0\nf 1 2 x\n");
        let result = store.decode_all(AssetKind::Obj, &ReaderConfig::default());
        assert!(matches!(result, Err(DecodeError::Obj { .. })));
    }

    #[test]
    fn test_images_inlined() {
        let mut store = AssetStore::new();
        store.add_image_content("Tex.PNG", vec![1u8, 2, 3]);
        store.decode_all(AssetKind::Image, &ReaderConfig::default()).unwrap();

        let entry = store.get(AssetKind::Image, "Tex.PNG").unwrap();
        assert!(entry.is_decoded());
        assert_eq!(entry.inline_uri.as_deref(), Some("data:image/png;base64,AQID"));
    }
}
