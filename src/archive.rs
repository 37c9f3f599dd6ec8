//! Extraction of model files from a zipped item
//!
//! A storage service that serves a multi-file item as one ZIP bundle puts
//! the files in a directory named after the item. Directory structure is
//! discarded: entries are keyed by their final path segment, and a later
//! entry replaces an earlier one with the same name and kind.

use crate::error::DecodeError;
use crate::fetch::decode_text;
use crate::store::{AssetKind, AssetStore, RawContent};
use std::io::{Cursor, Read};
use zip::ZipArchive;

/// A model file pulled out of a bundle
#[derive(Debug, Clone, PartialEq)]
pub struct UnpackedEntry {
    /// Final path segment of the archive path
    pub name: String,
    pub kind: AssetKind,
    pub content: RawContent,
}

/// Final segment of an archive path
pub fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Extract every OBJ, MTL and image entry of a ZIP bundle.
///
/// Entries with other extensions are skipped.
pub fn unpack(bundle: &[u8]) -> Result<Vec<UnpackedEntry>, DecodeError> {
    let mut archive = ZipArchive::new(Cursor::new(bundle))?;
    let mut entries = Vec::new();

    for index in 0..archive.len() {
        let mut file = archive.by_index(index)?;
        if file.is_dir() {
            continue;
        }

        let path = file.name().to_string();
        let name = basename(&path).to_string();
        let Some(kind) = AssetKind::from_file_name(&name) else {
            log::debug!("Skipping archive entry {path}");
            continue;
        };

        // Header sizes are unchecked until the entry is read
        let reserve = file.size().min(bundle.len() as u64) as usize;
        let mut bytes = Vec::with_capacity(reserve);
        file.read_to_end(&mut bytes)?;

        let content = if kind.is_text() {
            RawContent::Text(decode_text(&name, bytes))
        } else {
            RawContent::Binary(bytes)
        };
        entries.push(UnpackedEntry { name, kind, content });
    }

    log::debug!("Unpacked {} model files from bundle", entries.len());
    Ok(entries)
}

impl AssetStore {
    /// Build a store from unpacked entries
    pub fn from_unpacked(entries: Vec<UnpackedEntry>) -> Self {
        let mut store = Self::new();
        for entry in entries {
            if store.get(entry.kind, &entry.name).is_some() {
                log::warn!("Archive holds more than one {}; keeping the last", entry.name);
            }
            store.put(entry.kind, entry.name, entry.content);
        }
        store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::FileOptions;
    use zip::ZipWriter;

    fn bundle(files: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (path, content) in files {
            writer.start_file(*path, FileOptions::default()).unwrap();
            writer.write_all(content).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_basename() {
        assert_eq!(basename("item/mesh/box.obj"), "box.obj");
        assert_eq!(basename("box.obj"), "box.obj");
    }

    #[test]
    fn test_unpack_classifies_and_skips() {
        let data = bundle(&[
            ("model/model.obj", &b"v 0 0 0\n"[..]),
            ("model/model.mtl", &b"newmtl a\n"[..]),
            ("model/tex.png", &[0x89, 0x50, 0x4e, 0x47][..]),
            ("model/readme.txt", &b"hello"[..]),
        ]);

        let mut entries = unpack(&data).unwrap();
        entries.sort_by(|a, b| a.name.cmp(&b.name));

        let kinds: Vec<(&str, AssetKind)> =
            entries.iter().map(|e| (e.name.as_str(), e.kind)).collect();
        assert_eq!(
            kinds,
            vec![
                ("model.mtl", AssetKind::Mtl),
                ("model.obj", AssetKind::Obj),
                ("tex.png", AssetKind::Image),
            ]
        );
        assert_eq!(entries[1].content, RawContent::Text("v 0 0 0\n".to_string()));
        assert_eq!(
            entries[2].content,
            RawContent::Binary(vec![0x89, 0x50, 0x4e, 0x47])
        );
    }

    #[test]
    fn test_basename_collision_last_wins() {
        let data = bundle(&[("a/box.obj", &b"v 0 0 0\n"[..]), ("b/box.obj", &b"v 1 1 1\n"[..])]);
        let store = AssetStore::from_unpacked(unpack(&data).unwrap());
        assert_eq!(store.len(AssetKind::Obj), 1);
        assert_eq!(
            store.get(AssetKind::Obj, "box.obj").unwrap().raw.as_text(),
            "v 1 1 1\n"
        );
    }

    #[test]
    fn test_inflated_header_size() {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let stored = FileOptions::default().compression_method(zip::CompressionMethod::Stored);
        writer.start_file("model/box.obj", stored).unwrap();
        writer.write_all(b"v 0 0 0\n").unwrap();
        let mut data = writer.finish().unwrap().into_inner();

        // Claim ~2 GiB uncompressed in the central directory record
        let central = data
            .windows(4)
            .position(|w| w == [0x50, 0x4b, 0x01, 0x02])
            .unwrap();
        data[central + 24..central + 28].copy_from_slice(&0x7fff_fff0u32.to_le_bytes());

        let mut archive = ZipArchive::new(Cursor::new(&data[..])).unwrap();
        assert_eq!(archive.by_index(0).unwrap().size(), 0x7fff_fff0);

        let entries = unpack(&data).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].content, RawContent::Text("v 0 0 0\n".to_string()));
    }

    #[test]
    fn test_corrupt_bundle() {
        let result = unpack(b"definitely not a zip file");
        assert!(matches!(result, Err(DecodeError::Archive(_))));
    }
}
