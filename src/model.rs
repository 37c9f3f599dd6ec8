//! Geometry, materials and the renderable units a load produces

use crate::references::is_texture_token;
use crate::renderer::Vertex;
use crate::texture::Texture;
use glam::{Mat4, Quat, Vec3};
use std::sync::Arc;
use uuid::Uuid;

/// Triangle mesh with indexed vertices
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Convert a mesh produced by the OBJ parser.
    ///
    /// Expects single-index output; missing normals and texture
    /// coordinates fall back to vertex defaults.
    pub fn from_obj(mesh: &tobj::Mesh) -> Self {
        let vertex_count = mesh.positions.len() / 3;
        let has_normals = mesh.normals.len() >= vertex_count * 3;
        let has_uvs = mesh.texcoords.len() >= vertex_count * 2;

        let vertices = (0..vertex_count)
            .map(|i| {
                let mut vertex = Vertex {
                    position: [
                        mesh.positions[i * 3],
                        mesh.positions[i * 3 + 1],
                        mesh.positions[i * 3 + 2],
                    ],
                    ..Default::default()
                };
                if has_normals {
                    vertex.normal = [
                        mesh.normals[i * 3],
                        mesh.normals[i * 3 + 1],
                        mesh.normals[i * 3 + 2],
                    ];
                }
                if has_uvs {
                    vertex.uv = [mesh.texcoords[i * 2], mesh.texcoords[i * 2 + 1]];
                }
                vertex
            })
            .collect();

        Self {
            vertices,
            indices: mesh.indices.clone(),
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Get the vertex buffer as bytes
    pub fn vertex_buffer(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Get the index buffer as bytes
    pub fn index_buffer(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    pub fn bounds(&self) -> Option<Aabb> {
        Aabb::from_points(self.vertices.iter().map(|v| Vec3::from(v.position)))
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        points.into_iter().fold(None, |acc, p| match acc {
            None => Some(Self { min: p, max: p }),
            Some(b) => Some(Self {
                min: b.min.min(p),
                max: b.max.max(p),
            }),
        })
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Box enclosing this one after `matrix` is applied
    pub fn transformed(&self, matrix: &Mat4) -> Aabb {
        let corners = (0..8).map(|i| {
            let corner = Vec3::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            );
            matrix.transform_point3(corner)
        });
        // Eight corners are always present
        Aabb::from_points(corners).unwrap_or(*self)
    }
}

/// Spatial transform (translation, rotation, scale)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: [f32; 3],
    pub rotation: [f32; 4], // quaternion (x, y, z, w)
    pub scale: [f32; 3],
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: [0.0; 3],
            rotation: [0.0, 0.0, 0.0, 1.0], // identity quaternion
            scale: [1.0; 3],
        }
    }
}

impl Transform {
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            Vec3::from(self.scale),
            Quat::from_array(self.rotation),
            Vec3::from(self.translation),
        )
    }
}

/// Which MTL texture map an image is bound to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TextureSlot {
    /// `map_Ka`
    Ambient,
    /// `map_Kd`
    Diffuse,
    /// `map_Ks`
    Specular,
    /// `map_Bump` / `bump`
    Normal,
    /// `map_Ns`
    Shininess,
    /// `map_d`
    Dissolve,
    /// Any other `map_<word>` key, such as `map_Ke`, kept verbatim
    Other(String),
}

/// An image referenced from a material texture map
#[derive(Debug, Clone, PartialEq)]
pub struct TextureBinding {
    pub slot: TextureSlot,
    /// File name as written in the MTL file
    pub image_name: String,
    /// `data:` URI of the image, once the image file is known
    pub inline_uri: Option<String>,
    /// Decoded pixels, once the image finished loading
    pub texture: Option<Arc<Texture>>,
}

impl TextureBinding {
    pub fn new(slot: TextureSlot, image_name: impl Into<String>) -> Self {
        Self {
            slot,
            image_name: image_name.into(),
            inline_uri: None,
            texture: None,
        }
    }

    pub fn is_bound(&self) -> bool {
        self.texture.is_some()
    }
}

/// Phong material as described by an MTL file
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceMaterial {
    pub name: String,
    pub ambient: [f32; 3],
    pub diffuse: [f32; 3],
    pub specular: [f32; 3],
    pub shininess: f32,
    /// Opacity, 1.0 is fully opaque
    pub dissolve: f32,
    pub illumination_model: Option<u8>,
    pub textures: Vec<TextureBinding>,
}

impl Default for SurfaceMaterial {
    fn default() -> Self {
        Self {
            name: String::new(),
            ambient: [0.0, 0.0, 0.0],
            diffuse: [1.0, 1.0, 1.0],
            specular: [0.0, 0.0, 0.0],
            shininess: 0.0,
            dissolve: 1.0,
            illumination_model: None,
            textures: Vec::new(),
        }
    }
}

impl SurfaceMaterial {
    /// Convert a material produced by the MTL parser
    pub fn from_mtl(material: &tobj::Material) -> Self {
        let defaults = Self::default();
        let mut textures: Vec<TextureBinding> = [
            (TextureSlot::Ambient, &material.ambient_texture),
            (TextureSlot::Diffuse, &material.diffuse_texture),
            (TextureSlot::Specular, &material.specular_texture),
            (TextureSlot::Normal, &material.normal_texture),
            (TextureSlot::Shininess, &material.shininess_texture),
            (TextureSlot::Dissolve, &material.dissolve_texture),
        ]
        .into_iter()
        .filter_map(|(slot, name)| name.as_ref().map(|name| TextureBinding::new(slot, name.as_str())))
        .collect();

        // The parser keeps maps it has no field for among the unknown keys
        let mut extra: Vec<(&String, &String)> = material
            .unknown_param
            .iter()
            .filter(|(key, value)| is_texture_token(key) && !value.is_empty())
            .collect();
        extra.sort();
        textures.extend(
            extra
                .into_iter()
                .map(|(key, value)| TextureBinding::new(TextureSlot::Other(key.clone()), value.as_str())),
        );

        Self {
            name: material.name.clone(),
            ambient: material.ambient.unwrap_or(defaults.ambient),
            diffuse: material.diffuse.unwrap_or(defaults.diffuse),
            specular: material.specular.unwrap_or(defaults.specular),
            shininess: material.shininess.unwrap_or(defaults.shininess),
            dissolve: material.dissolve.unwrap_or(defaults.dissolve),
            illumination_model: material.illumination_model,
            textures,
        }
    }

    /// Image names referenced by this material's texture maps
    pub fn image_names(&self) -> impl Iterator<Item = &str> {
        self.textures.iter().map(|t| t.image_name.as_str())
    }

    /// Whether any texture map has pixels bound
    pub fn is_textured(&self) -> bool {
        self.textures.iter().any(TextureBinding::is_bound)
    }
}

/// One output group of a parsed OBJ file
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryGroup {
    /// Object or group name from the OBJ file
    pub name: String,
    /// Material selected by the `usemtl` directive that started this group
    pub material_name: Option<String>,
    pub mesh: Mesh,
}

/// Geometry plus optional material, ready for a renderer
#[derive(Debug, Clone)]
pub struct RenderableUnit {
    pub id: Uuid,
    pub name: String,
    /// OBJ file this unit came from
    pub source: String,
    pub mesh: Mesh,
    pub material: Option<SurfaceMaterial>,
    pub transform: Transform,
}

impl RenderableUnit {
    pub fn new(source: impl Into<String>, group: GeometryGroup) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: group.name,
            source: source.into(),
            mesh: group.mesh,
            material: None,
            transform: Transform::default(),
        }
    }

    /// World-space bounds of the unit
    pub fn bounds(&self) -> Option<Aabb> {
        self.mesh
            .bounds()
            .map(|b| b.transformed(&self.transform.matrix()))
    }

    pub fn is_textured(&self) -> bool {
        self.material
            .as_ref()
            .is_some_and(SurfaceMaterial::is_textured)
    }
}

/// Bounds enclosing every unit, used to frame the view after a load
pub fn scene_bounds(units: &[RenderableUnit]) -> Option<Aabb> {
    units
        .iter()
        .filter_map(RenderableUnit::bounds)
        .reduce(|a, b| a.union(&b))
}
