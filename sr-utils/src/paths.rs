//! Identifier normalisation for `namespace:relative/path` asset references.
//!
//! The core only ever strips namespaces; which namespace folder a relative path
//! is finally read from is decided by the [`AssetProvider`](crate::AssetProvider).

pub fn strip_namespace(id: &str) -> &str {
    match id.split_once(':') {
        Some((namespace, path)) if !namespace.is_empty() => path,
        _ => id,
    }
}

fn strip_common(id: &str) -> &str {
    strip_namespace(id.trim()).trim_start_matches('/')
}

/// `minecraft:block/stone` and `block/stone.json` both become `block/stone`.
pub fn normalize_model_path(id: &str) -> String {
    let path = strip_common(id);
    path.strip_suffix(".json").unwrap_or(path).to_string()
}

pub fn normalize_texture_path(id: &str) -> String {
    let path = strip_common(id);
    path.strip_suffix(".png").unwrap_or(path).to_string()
}

/// Parents that mark a flat, layer-based item icon instead of real geometry.
pub fn is_generated_parent(parent: &str) -> bool {
    let path = normalize_model_path(parent);
    path == "builtin/generated" || path == "item/generated" || path.contains("/generated")
}

/// Short template name of a parent reference: `minecraft:block/cube_all` -> `cube_all`.
pub fn simplified_parent_name(parent: &str) -> String {
    let path = normalize_model_path(parent);
    match path.strip_prefix("block/") {
        Some(short) => short.to_string(),
        None => path,
    }
}
