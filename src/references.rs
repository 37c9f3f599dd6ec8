//! Cross-reference scanning for OBJ and MTL text
//!
//! OBJ files name their material libraries with `mtllib <file>` lines and
//! select materials with `usemtl <name>`; MTL files name texture images with
//! `map_<word> <file>` lines. The scanners work line by line on trimmed text; the referenced name is the
//! remainder of the line, so names containing spaces survive. Lines that
//! carry the token without a name are skipped.

use std::collections::HashSet;

/// Split a trimmed line into its leading token and the whitespace-separated rest
fn split_directive(line: &str) -> Option<(&str, &str)> {
    let line = line.trim();
    let split = line.find(char::is_whitespace)?;
    let (token, rest) = line.split_at(split);
    let rest = rest.trim();
    if rest.is_empty() {
        return None;
    }
    Some((token, rest))
}

/// `map_<word>` token of an MTL texture map
pub(crate) fn is_texture_token(token: &str) -> bool {
    match token.strip_prefix("map_") {
        Some(suffix) => {
            !suffix.is_empty() && suffix.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    }
}

/// Keep the first occurrence of every name
fn unique<'a>(names: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    names
        .filter(|name| seen.insert(*name))
        .map(str::to_string)
        .collect()
}

/// Material library names referenced by OBJ text, without duplicates
pub fn material_libraries(obj_text: &str) -> Vec<String> {
    unique(
        obj_text
            .lines()
            .filter_map(split_directive)
            .filter(|(token, _)| *token == "mtllib")
            .map(|(_, name)| name),
    )
}

/// Material names selected by `usemtl` lines of OBJ text, without duplicates
pub fn material_uses(obj_text: &str) -> Vec<String> {
    unique(
        obj_text
            .lines()
            .filter_map(split_directive)
            .filter(|(token, _)| *token == "usemtl")
            .map(|(_, name)| name),
    )
}

/// Whether an OBJ line is a `mtllib` directive
pub(crate) fn is_library_line(line: &str) -> bool {
    line.split_whitespace().next() == Some("mtllib")
}

/// Texture image names referenced by any of the MTL texts, without duplicates
pub fn texture_images<'a>(mtl_texts: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    unique(
        mtl_texts
            .into_iter()
            .flat_map(|text| text.lines())
            .filter_map(split_directive)
            .filter(|(token, _)| is_texture_token(token))
            .map(|(_, name)| name),
    )
}
