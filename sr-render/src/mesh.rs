//! Renderer-agnostic mesh trees produced by synthesis.
//!
//! A tree is plain data: transforms, cuboids and quads with per-face surface
//! descriptions. [`crate::spawn`] turns one into Bevy entities; the CLI only
//! summarises it.

use std::fmt::{self, Write as _};
use std::sync::Arc;

use bevy::math::{Vec2, Vec3};
use bevy::render::mesh::{Indices, Mesh, PrimitiveTopology};
use bevy::render::render_asset::RenderAssetUsages;
use bevy::transform::components::Transform;
use sr_scene::{LightSettings, SceneObjectId};
use sr_utils::RasterImage;

use crate::block_textures::Face;
use crate::face_uv::{FULL_FACE_UVS, FaceUvs, write_face_uvs};

/// Alpha-test threshold for item textures, flat icons and voxels.
pub const ITEM_ALPHA_CUTOFF: f32 = 0.1;

#[derive(Debug, Clone)]
pub struct TexturedSurface {
    pub texture: Arc<RasterImage>,
    pub opacity: f32,
    pub alpha_cutoff: Option<f32>,
    pub double_sided: bool,
    pub depth_write: bool,
    pub unlit: bool,
    /// Drawn over everything else (light icons).
    pub always_on_top: bool,
}

impl TexturedSurface {
    /// Transparent, front-sided, no depth write.
    pub fn element(texture: Arc<RasterImage>, opacity: f32) -> Self {
        Self {
            texture,
            opacity,
            alpha_cutoff: None,
            double_sided: false,
            depth_write: false,
            unlit: false,
            always_on_top: false,
        }
    }
}

impl PartialEq for TexturedSurface {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.texture, &other.texture)
            && self.opacity == other.opacity
            && self.alpha_cutoff == other.alpha_cutoff
            && self.double_sided == other.double_sided
            && self.depth_write == other.depth_write
            && self.unlit == other.unlit
            && self.always_on_top == other.always_on_top
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SolidSurface {
    pub color: [f32; 3],
    pub opacity: f32,
    pub blend: bool,
    pub alpha_cutoff: Option<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceMaterial {
    Textured(TexturedSurface),
    Solid(SolidSurface),
    /// Placeholder for a face that exists but is never drawn.
    Hidden,
}

impl SurfaceMaterial {
    pub fn is_hidden(&self) -> bool {
        matches!(self, Self::Hidden)
    }
}

/// Axis-aligned box with one material and UV set per face.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelCuboid {
    pub size: Vec3,
    /// Geometry centre relative to the owning node.
    pub offset: Vec3,
    pub uvs: [FaceUvs; 6],
    pub materials: [SurfaceMaterial; 6],
}

impl ModelCuboid {
    pub fn uniform(size: Vec3, material: SurfaceMaterial) -> Self {
        Self {
            size,
            offset: Vec3::ZERO,
            uvs: [FULL_FACE_UVS; 6],
            materials: std::array::from_fn(|_| material.clone()),
        }
    }

    pub fn material(&self, face: Face) -> &SurfaceMaterial {
        &self.materials[face.index()]
    }

    /// All six faces can share one draw.
    pub fn is_uniform(&self) -> bool {
        self.materials[1..].iter().all(|m| *m == self.materials[0])
    }

    /// Corner positions of `face`, same vertex order as the UV corners.
    pub fn face_positions(&self, face: Face) -> [[f32; 3]; 4] {
        let h = self.size * 0.5;
        let o = self.offset;
        let corners = match face {
            Face::PosX => [[h.x, h.y, h.z], [h.x, h.y, -h.z], [h.x, -h.y, h.z], [h.x, -h.y, -h.z]],
            Face::NegX => [[-h.x, h.y, -h.z], [-h.x, h.y, h.z], [-h.x, -h.y, -h.z], [-h.x, -h.y, h.z]],
            Face::PosY => [[-h.x, h.y, -h.z], [h.x, h.y, -h.z], [-h.x, h.y, h.z], [h.x, h.y, h.z]],
            Face::NegY => [[-h.x, -h.y, h.z], [h.x, -h.y, h.z], [-h.x, -h.y, -h.z], [h.x, -h.y, -h.z]],
            Face::PosZ => [[-h.x, h.y, h.z], [h.x, h.y, h.z], [-h.x, -h.y, h.z], [h.x, -h.y, h.z]],
            Face::NegZ => [[h.x, h.y, -h.z], [-h.x, h.y, -h.z], [h.x, -h.y, -h.z], [-h.x, -h.y, -h.z]],
        };
        corners.map(|[x, y, z]| [x + o.x, y + o.y, z + o.z])
    }

    /// 24-vertex box, four vertices per face in face order.
    pub fn mesh(&self) -> Mesh {
        let mut data = MeshData::default();
        for face in Face::ALL {
            data.push_face(self.face_positions(face), face_normal(face), None);
        }
        let mut uvs = vec![[0.0, 0.0]; 24];
        for face in Face::ALL {
            write_face_uvs(&mut uvs, face, &self.uvs[face.index()]);
        }
        data.uvs = uvs;
        data.into_mesh()
    }

    /// A single face as its own 4-vertex mesh.
    pub fn face_mesh(&self, face: Face) -> Mesh {
        let mut data = MeshData::default();
        data.push_face(
            self.face_positions(face),
            face_normal(face),
            Some(&self.uvs[face.index()]),
        );
        data.into_mesh()
    }
}

fn face_normal(face: Face) -> [f32; 3] {
    match face {
        Face::PosX => [1.0, 0.0, 0.0],
        Face::NegX => [-1.0, 0.0, 0.0],
        Face::PosY => [0.0, 1.0, 0.0],
        Face::NegY => [0.0, -1.0, 0.0],
        Face::PosZ => [0.0, 0.0, 1.0],
        Face::NegZ => [0.0, 0.0, -1.0],
    }
}

/// Unit-style quad in the XY plane facing +Z.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelPlane {
    pub size: Vec2,
    pub material: SurfaceMaterial,
    /// Kept facing the active camera.
    pub billboard: bool,
}

impl ModelPlane {
    pub fn mesh(&self) -> Mesh {
        let h = self.size * 0.5;
        let mut data = MeshData::default();
        data.push_face(
            [[-h.x, h.y, 0.0], [h.x, h.y, 0.0], [-h.x, -h.y, 0.0], [h.x, -h.y, 0.0]],
            [0.0, 0.0, 1.0],
            Some(&FULL_FACE_UVS),
        );
        data.into_mesh()
    }
}

#[derive(Default)]
struct MeshData {
    positions: Vec<[f32; 3]>,
    normals: Vec<[f32; 3]>,
    uvs: Vec<[f32; 2]>,
    indices: Vec<u32>,
}

impl MeshData {
    fn push_face(&mut self, corners: [[f32; 3]; 4], normal: [f32; 3], uvs: Option<&FaceUvs>) {
        let base = self.positions.len() as u32;
        self.positions.extend(corners);
        self.normals.extend([normal; 4]);
        if let Some(uvs) = uvs {
            self.uvs.extend(uvs.iter().map(|[u, v]| [*u, 1.0 - *v]));
        }
        self.indices
            .extend([0, 2, 1, 2, 3, 1].into_iter().map(|i| base + i));
    }

    fn into_mesh(self) -> Mesh {
        let mut mesh = Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::default());
        mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, self.positions);
        mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, self.normals);
        mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, self.uvs);
        mesh.insert_indices(Indices::U32(self.indices));
        mesh
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeContent {
    Group,
    Cuboid(ModelCuboid),
    Plane(ModelPlane),
    PointLight(LightSettings),
    CameraMarker,
    /// Raw character file for an external glTF loader.
    CharacterAsset { path: String, bytes: Arc<[u8]> },
}

impl NodeContent {
    fn label(&self) -> &'static str {
        match self {
            Self::Group => "group",
            Self::Cuboid(_) => "cuboid",
            Self::Plane(_) => "plane",
            Self::PointLight(_) => "point-light",
            Self::CameraMarker => "camera",
            Self::CharacterAsset { .. } => "character",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub name: String,
    pub transform: Transform,
    pub object_id: Option<SceneObjectId>,
    /// Set on container nodes: the pivot offset the tree was built with.
    pub pivot_offset: Option<Vec3>,
    pub content: NodeContent,
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    pub fn new(name: impl Into<String>, content: NodeContent) -> Self {
        Self {
            name: name.into(),
            transform: Transform::IDENTITY,
            object_id: None,
            pivot_offset: None,
            content,
            children: Vec::new(),
        }
    }

    pub fn group(name: impl Into<String>) -> Self {
        Self::new(name, NodeContent::Group)
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_object(mut self, id: SceneObjectId) -> Self {
        self.object_id = Some(id);
        self
    }

    pub fn with_child(mut self, child: SceneNode) -> Self {
        self.children.push(child);
        self
    }

    /// Depth-first, self first.
    pub fn walk(&self) -> Vec<&SceneNode> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(node.children.iter().rev());
        }
        out
    }
}

/// Synthesis output for one scene object.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshTree {
    pub object_id: SceneObjectId,
    pub root: SceneNode,
}

impl MeshTree {
    /// The group holding orientation and pivot compensation.
    pub fn visual_group(&self) -> Option<&SceneNode> {
        self.root.children.first()
    }

    pub fn geometry_nodes(&self) -> impl Iterator<Item = &SceneNode> + '_ {
        self.visual_group()
            .into_iter()
            .flat_map(|group| group.children.iter())
    }

    pub fn node_count(&self) -> usize {
        self.root.walk().len()
    }
}

impl fmt::Display for MeshTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        write_node(&mut out, &self.root, 0)?;
        f.write_str(out.trim_end())
    }
}

fn write_node(out: &mut String, node: &SceneNode, depth: usize) -> fmt::Result {
    let t = node.transform.translation;
    write!(
        out,
        "{:indent$}{} [{}] at ({:.3}, {:.3}, {:.3})",
        "",
        node.name,
        node.content.label(),
        t.x,
        t.y,
        t.z,
        indent = depth * 2
    )?;
    if let NodeContent::Cuboid(cuboid) = &node.content {
        let hidden = cuboid.materials.iter().filter(|m| m.is_hidden()).count();
        write!(
            out,
            " size ({:.3}, {:.3}, {:.3})",
            cuboid.size.x, cuboid.size.y, cuboid.size.z
        )?;
        if hidden > 0 {
            write!(out, " hidden faces {hidden}")?;
        }
    }
    writeln!(out)?;
    for child in &node.children {
        write_node(out, child, depth + 1)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use bevy::render::mesh::VertexAttributeValues;

    use super::*;

    fn solid() -> SurfaceMaterial {
        SurfaceMaterial::Solid(SolidSurface {
            color: [1.0, 0.0, 0.0],
            opacity: 1.0,
            blend: false,
            alpha_cutoff: None,
        })
    }

    #[test]
    fn cuboid_mesh_has_24_vertices_and_36_indices() {
        let cuboid = ModelCuboid::uniform(Vec3::ONE, solid());
        let mesh = cuboid.mesh();
        assert_eq!(mesh.count_vertices(), 24);
        assert_eq!(mesh.indices().map(|i| i.len()), Some(36));
        let Some(VertexAttributeValues::Float32x2(uvs)) = mesh.attribute(Mesh::ATTRIBUTE_UV_0)
        else {
            panic!("missing uvs");
        };
        assert_eq!(uvs[0], [0.0, 0.0]);
        assert_eq!(uvs[3], [1.0, 1.0]);
    }

    #[test]
    fn faces_wind_counter_clockwise_outward() {
        let cuboid = ModelCuboid::uniform(Vec3::new(1.0, 2.0, 3.0), solid());
        for face in Face::ALL {
            let [a, b, c, _] = cuboid.face_positions(face).map(Vec3::from);
            // First triangle is (0, 2, 1).
            let normal = (c - a).cross(b - a).normalize();
            assert!(normal.dot(Vec3::from(face_normal(face))) > 0.999, "{face:?}");
        }
    }

    #[test]
    fn offset_moves_geometry() {
        let mut cuboid = ModelCuboid::uniform(Vec3::splat(0.5), solid());
        cuboid.offset = Vec3::new(0.25, 0.0, 0.0);
        let positions = cuboid.face_positions(Face::PosX);
        assert!(positions.iter().all(|p| p[0] == 0.5));
        assert_eq!(cuboid.face_mesh(Face::PosX).count_vertices(), 4);
    }

    #[test]
    fn one_hidden_face_breaks_uniformity() {
        let mut cuboid = ModelCuboid::uniform(Vec3::ONE, solid());
        assert!(cuboid.is_uniform());
        cuboid.materials[Face::NegY.index()] = SurfaceMaterial::Hidden;
        assert!(!cuboid.is_uniform());
    }

    #[test]
    fn tree_summary_lists_nodes() {
        let tree = MeshTree {
            object_id: SceneObjectId(7),
            root: SceneNode::group("stone").with_child(
                SceneNode::group("visual").with_child(SceneNode::new(
                    "cube",
                    NodeContent::Cuboid(ModelCuboid::uniform(Vec3::ONE, SurfaceMaterial::Hidden)),
                )),
            ),
        };
        assert_eq!(tree.node_count(), 3);
        assert_eq!(tree.geometry_nodes().count(), 1);
        let summary = tree.to_string();
        assert!(summary.starts_with("stone [group]"));
        assert!(summary.contains("    cube [cuboid]"));
        assert!(summary.contains("hidden faces 6"));
    }
}
