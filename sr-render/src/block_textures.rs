use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use sr_utils::RasterImage;

/// Loaded textures keyed by `#slot` (and memoised indirection references).
pub type TextureCache = HashMap<String, Arc<RasterImage>>;

/// Cuboid faces in vertex-buffer order.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum Face {
    PosX,
    NegX,
    PosY,
    NegY,
    PosZ,
    NegZ,
}

impl Face {
    pub const ALL: [Face; 6] = [
        Face::PosX,
        Face::NegX,
        Face::PosY,
        Face::NegY,
        Face::PosZ,
        Face::NegZ,
    ];

    pub const fn index(self) -> usize {
        match self {
            Self::PosX => 0,
            Self::NegX => 1,
            Self::PosY => 2,
            Self::NegY => 3,
            Self::PosZ => 4,
            Self::NegZ => 5,
        }
    }

    /// Model-file direction name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::PosX => "east",
            Self::NegX => "west",
            Self::PosY => "up",
            Self::NegY => "down",
            Self::PosZ => "south",
            Self::NegZ => "north",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|face| face.name() == name)
    }
}

/// Resolves a `#slot` face reference to an already loaded texture.
///
/// Only consults `cache`; every concrete slot must have been loaded under
/// `#slot` beforehand. A successful chain walk is memoised under `reference`.
pub fn resolve_texture(
    reference: &str,
    textures: &HashMap<String, String>,
    cache: &mut TextureCache,
) -> Option<Arc<RasterImage>> {
    let slot = reference.strip_prefix('#')?;
    if let Some(hit) = cache.get(reference) {
        return Some(hit.clone());
    }

    let mut visited = HashSet::new();
    let mut key = slot;
    while visited.insert(key) {
        let Some(value) = textures.get(key).filter(|v| !v.is_empty()) else {
            break;
        };
        if let Some(next) = value.strip_prefix('#') {
            key = next;
            continue;
        }
        if let Some(hit) = cache.get(&format!("#{key}")).cloned() {
            cache.insert(reference.to_string(), hit.clone());
            return Some(hit);
        }
        break;
    }

    cache.get(reference).cloned()
}

/// Follows `#` indirections from `slot` to the concrete texture path it names.
pub fn concrete_texture_path<'a>(
    textures: &'a HashMap<String, String>,
    slot: &str,
) -> Option<&'a str> {
    let mut visited = HashSet::new();
    let mut key = slot.strip_prefix('#').unwrap_or(slot).to_string();
    loop {
        if !visited.insert(key.clone()) {
            return None;
        }
        let value = textures.get(&key).filter(|v| !v.is_empty())?;
        match value.strip_prefix('#') {
            Some(next) => key = next.to_string(),
            None => return Some(value.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn textures(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn image() -> Arc<RasterImage> {
        Arc::new(RasterImage::filled(1, 1, [255, 0, 0, 255]))
    }

    #[test]
    fn follows_indirection_to_loaded_slot() {
        let map = textures(&[("a", "#b"), ("b", "block/stone")]);
        let img = image();
        let mut cache = TextureCache::new();
        cache.insert("#b".into(), img.clone());

        let hit = resolve_texture("#a", &map, &mut cache).unwrap();
        assert!(Arc::ptr_eq(&hit, &img));
        assert!(cache.contains_key("#a"));
    }

    #[test]
    fn long_indirection_matches_direct_lookup() {
        let map = textures(&[("a", "#b"), ("b", "#c"), ("c", "#d"), ("d", "block/stone")]);
        let img = image();
        let mut cache = TextureCache::new();
        cache.insert("#d".into(), img.clone());

        let direct = resolve_texture("#d", &map, &mut cache).unwrap();
        let chained = resolve_texture("#a", &map, &mut cache).unwrap();
        assert!(Arc::ptr_eq(&direct, &chained));
        assert_eq!(concrete_texture_path(&map, "a"), Some("block/stone"));
    }

    #[test]
    fn self_reference_terminates() {
        let map = textures(&[("a", "#a")]);
        let mut cache = TextureCache::new();
        assert!(resolve_texture("#a", &map, &mut cache).is_none());

        let map = textures(&[("a", "#b"), ("b", "#a")]);
        assert!(resolve_texture("#a", &map, &mut cache).is_none());
    }

    #[test]
    fn plain_paths_and_dead_ends_resolve_to_nothing() {
        let map = textures(&[("a", ""), ("c", "block/dirt")]);
        let mut cache = TextureCache::new();
        assert!(resolve_texture("block/stone", &map, &mut cache).is_none());
        assert!(resolve_texture("#a", &map, &mut cache).is_none());
        assert!(resolve_texture("#missing", &map, &mut cache).is_none());
        // Concrete but never loaded.
        assert!(resolve_texture("#c", &map, &mut cache).is_none());
    }

    #[test]
    fn concrete_paths() {
        let map = textures(&[("all", "#side"), ("side", "block/oak_log"), ("loop", "#loop")]);
        assert_eq!(concrete_texture_path(&map, "all"), Some("block/oak_log"));
        assert_eq!(concrete_texture_path(&map, "#side"), Some("block/oak_log"));
        assert_eq!(concrete_texture_path(&map, "loop"), None);
        assert_eq!(concrete_texture_path(&map, "end"), None);
    }

    #[test]
    fn face_names() {
        for face in Face::ALL {
            assert_eq!(Face::from_name(face.name()), Some(face));
        }
        assert_eq!(Face::PosZ.name(), "south");
        assert_eq!(Face::from_name("bottom"), None);
    }
}
