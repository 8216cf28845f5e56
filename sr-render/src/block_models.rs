//! Parent-chain resolution for block and item model descriptors.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use sr_utils::{
    AssetProvider, ModelDescriptor, ModelElement, is_generated_parent, normalize_model_path,
    simplified_parent_name,
};
use tracing::debug;

use crate::error::{MeshError, Result};

/// A descriptor with its parent chain merged in.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResolvedModel {
    /// Normalised path of the leaf descriptor.
    pub path: String,
    /// The leaf's declared parent, verbatim.
    pub parent: Option<String>,
    pub textures: HashMap<String, String>,
    pub elements: Vec<ModelElement>,
    /// The walk stopped at a flat-icon parent.
    pub is_generated: bool,
}

/// Cube templates rendered as one unit cuboid without element data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SimplifiedCube {
    CubeAll,
    CubeColumn,
    CubeBottomTop,
    CubeTop,
    Orientable,
}

impl SimplifiedCube {
    pub fn from_parent(parent: &str) -> Option<Self> {
        match simplified_parent_name(parent).as_str() {
            "cube_all" => Some(Self::CubeAll),
            "cube_column" => Some(Self::CubeColumn),
            "cube_bottom_top" => Some(Self::CubeBottomTop),
            "cube_top" => Some(Self::CubeTop),
            "orientable" => Some(Self::Orientable),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::CubeAll => "cube_all",
            Self::CubeColumn => "cube_column",
            Self::CubeBottomTop => "cube_bottom_top",
            Self::CubeTop => "cube_top",
            Self::Orientable => "orientable",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "template", rename_all = "snake_case")]
pub enum ModelShape {
    Generated,
    Elements,
    Simplified(SimplifiedCube),
    Unsupported,
}

impl ResolvedModel {
    pub fn shape(&self) -> ModelShape {
        if self.is_generated {
            return ModelShape::Generated;
        }
        if !self.elements.is_empty() {
            return ModelShape::Elements;
        }
        if let Some(cube) = self.parent.as_deref().and_then(SimplifiedCube::from_parent) {
            return ModelShape::Simplified(cube);
        }
        if self.textures.contains_key("layer0") {
            return ModelShape::Generated;
        }
        ModelShape::Unsupported
    }

    /// Folds a leaf-first chain into one model.
    fn merge(path: String, chain: Vec<ModelDescriptor>, is_generated: bool) -> Self {
        let parent = chain.first().and_then(|leaf| leaf.parent.clone());
        let elements = chain
            .iter()
            .find_map(|desc| desc.elements.as_ref().filter(|els| !els.is_empty()))
            .cloned()
            .unwrap_or_default();
        let mut textures = HashMap::new();
        for desc in chain.into_iter().rev() {
            if let Some(layer) = desc.textures {
                textures.extend(layer);
            }
        }
        Self {
            path,
            parent,
            textures,
            elements,
            is_generated,
        }
    }
}

/// Walks the parent chain of `path` and merges it.
///
/// Only a missing root is an error; an ancestor that cannot be loaded ends the
/// chain at the last descriptor found.
pub async fn resolve_model<P: AssetProvider>(provider: &P, path: &str) -> Result<ResolvedModel> {
    let root = normalize_model_path(path);
    let mut visited = HashSet::new();
    let mut chain: Vec<ModelDescriptor> = Vec::new();
    let mut is_generated = false;
    let mut current = root.clone();

    loop {
        if !visited.insert(current.clone()) {
            return Err(MeshError::CircularReference(current));
        }
        let descriptor = match provider.load_model_descriptor(&current).await {
            Ok(descriptor) => descriptor,
            Err(err) if chain.is_empty() => return Err(err.into()),
            Err(err) => {
                debug!("model {root}: parent {current} unavailable, chain ends here ({err})");
                break;
            }
        };
        let parent = descriptor.parent.clone();
        chain.push(descriptor);

        let Some(parent) = parent else {
            break;
        };
        if is_generated_parent(&parent) {
            is_generated = true;
            break;
        }
        current = normalize_model_path(&parent);
    }

    debug!(
        "model {root}: {} descriptor(s) merged, generated={is_generated}",
        chain.len()
    );
    Ok(ResolvedModel::merge(root, chain, is_generated))
}

#[cfg(test)]
mod tests {
    use sr_utils::MemoryAssetProvider;

    use super::*;

    #[tokio::test]
    async fn child_textures_override_parent() {
        let mut provider = MemoryAssetProvider::new();
        provider
            .insert_model_json(
                "block/parent_model",
                r#"{"textures": {"side": "block/dirt", "top": "block/grass_top"},
                    "elements": [{"from": [0,0,0], "to": [16,16,16]}]}"#,
            )
            .insert_model_json(
                "block/child",
                r#"{"parent": "minecraft:block/parent_model",
                    "textures": {"side": "block/stone"}}"#,
            );

        let model = resolve_model(&provider, "minecraft:block/child").await.unwrap();
        assert_eq!(model.path, "block/child");
        assert_eq!(model.textures["side"], "block/stone");
        assert_eq!(model.textures["top"], "block/grass_top");
        assert_eq!(model.elements.len(), 1);
        assert_eq!(model.parent.as_deref(), Some("minecraft:block/parent_model"));
        assert_eq!(model.shape(), ModelShape::Elements);
    }

    #[tokio::test]
    async fn textures_merge_across_the_whole_chain() {
        let mut provider = MemoryAssetProvider::new();
        provider
            .insert_model_json(
                "block/grandparent",
                r##"{"textures": {"particle": "#side", "side": "block/dirt", "bottom": "block/dirt"},
                    "elements": [{"from": [0,0,0], "to": [16,16,16]}]}"##,
            )
            .insert_model_json(
                "block/parent_model",
                r#"{"parent": "block/grandparent",
                    "textures": {"side": "block/podzol_side", "top": "block/podzol_top"}}"#,
            )
            .insert_model_json(
                "block/leaf",
                r#"{"parent": "block/parent_model", "textures": {"top": "block/snow"}}"#,
            );

        let model = resolve_model(&provider, "block/leaf").await.unwrap();
        assert_eq!(model.textures.len(), 4);
        assert_eq!(model.textures["top"], "block/snow");
        assert_eq!(model.textures["side"], "block/podzol_side");
        assert_eq!(model.textures["bottom"], "block/dirt");
        assert_eq!(model.textures["particle"], "#side");
        assert_eq!(model.elements.len(), 1);
    }

    #[tokio::test]
    async fn nearest_non_empty_elements_win() {
        let mut provider = MemoryAssetProvider::new();
        provider
            .insert_model_json(
                "block/base",
                r#"{"elements": [{"from": [0,0,0], "to": [16,16,16]}]}"#,
            )
            .insert_model_json(
                "block/slab",
                r#"{"parent": "block/base", "elements": [
                    {"from": [0,0,0], "to": [16,8,16]},
                    {"from": [0,8,0], "to": [8,16,8]}]}"#,
            )
            .insert_model_json("block/empty_override", r#"{"parent": "block/slab", "elements": []}"#);

        let model = resolve_model(&provider, "block/empty_override").await.unwrap();
        assert_eq!(model.elements.len(), 2);
        assert_eq!(model.elements[0].to, [16.0, 8.0, 16.0]);
    }

    #[tokio::test]
    async fn cycles_are_detected() {
        let mut provider = MemoryAssetProvider::new();
        provider
            .insert_model_json("block/a", r#"{"parent": "block/b"}"#)
            .insert_model_json("block/b", r#"{"parent": "minecraft:block/a"}"#);

        let err = resolve_model(&provider, "block/a").await.unwrap_err();
        assert!(matches!(err, MeshError::CircularReference(path) if path == "block/a"));
    }

    #[tokio::test]
    async fn missing_root_is_not_found_but_missing_ancestor_is_tolerated() {
        let mut provider = MemoryAssetProvider::new();
        provider.insert_model_json(
            "block/orphan",
            r#"{"parent": "block/gone", "textures": {"all": "block/stone"}}"#,
        );

        let err = resolve_model(&provider, "block/nope").await.unwrap_err();
        assert!(matches!(err, MeshError::NotFound(_)));

        let model = resolve_model(&provider, "block/orphan").await.unwrap();
        assert_eq!(model.textures["all"], "block/stone");
        assert_eq!(model.shape(), ModelShape::Unsupported);
    }

    #[tokio::test]
    async fn generated_parent_stops_the_walk() {
        let mut provider = MemoryAssetProvider::new();
        provider
            .insert_model_json(
                "item/handheld",
                r#"{"parent": "item/generated", "textures": {"layer0": "item/stick"}}"#,
            )
            .insert_model_json(
                "item/iron_sword",
                r#"{"parent": "minecraft:item/handheld", "textures": {"layer0": "item/iron_sword"}}"#,
            );

        let model = resolve_model(&provider, "item/iron_sword").await.unwrap();
        assert!(model.is_generated);
        assert_eq!(model.textures["layer0"], "item/iron_sword");
        assert_eq!(model.shape(), ModelShape::Generated);
    }

    #[tokio::test]
    async fn simplified_parents_are_classified() {
        let mut provider = MemoryAssetProvider::new();
        provider
            .insert_model_json("block/cube_all", r#"{"parent": "block/cube"}"#)
            .insert_model_json(
                "block/stone",
                r#"{"parent": "minecraft:block/cube_all", "textures": {"all": "block/stone"}}"#,
            )
            .insert_model_json(
                "block/furnace",
                r#"{"parent": "block/orientable", "textures": {"front": "block/furnace_front"}}"#,
            );

        let stone = resolve_model(&provider, "block/stone").await.unwrap();
        assert_eq!(stone.shape(), ModelShape::Simplified(SimplifiedCube::CubeAll));

        // Parent file absent, the declared template still classifies it.
        let furnace = resolve_model(&provider, "block/furnace").await.unwrap();
        assert_eq!(
            furnace.shape(),
            ModelShape::Simplified(SimplifiedCube::Orientable)
        );
    }

    #[test]
    fn layer0_without_generated_parent_is_still_an_icon() {
        let model = ResolvedModel {
            textures: HashMap::from([("layer0".to_string(), "item/apple".to_string())]),
            ..ResolvedModel::default()
        };
        assert_eq!(model.shape(), ModelShape::Generated);

        let unknown = ResolvedModel {
            parent: Some("block/thin_block".into()),
            ..ResolvedModel::default()
        };
        assert_eq!(unknown.shape(), ModelShape::Unsupported);
    }
}
