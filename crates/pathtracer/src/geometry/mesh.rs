use anyhow::{bail, Result};

use crate::materials::Material;

use super::{Vec2, Vec3, Vec3u};

/// Immutable flat arrays describing every triangle in the scene, the unit
/// all other components index into. Normals and UVs are per face-vertex
/// (three entries per triangle, not shared across faces); materials are per
/// triangle. Populated once by the loader, read-only while rendering.
#[derive(Debug, Default)]
pub struct GeometryStore {
    pub vertices: Vec<Vec3>,
    pub tris: Vec<Vec3u>,
    pub normals: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    pub material_ids: Vec<u32>,
    pub materials: Vec<Material>,
}

impl GeometryStore {
    pub fn new(
        vertices: Vec<Vec3>,
        tris: Vec<Vec3u>,
        normals: Vec<Vec3>,
        uvs: Vec<Vec2>,
        material_ids: Vec<u32>,
        materials: Vec<Material>,
    ) -> Result<GeometryStore> {
        if normals.len() != tris.len() * 3 {
            bail!(
                "expected {} face-vertex normals, got {}",
                tris.len() * 3,
                normals.len()
            );
        }
        if uvs.len() != tris.len() * 3 {
            bail!("expected {} face-vertex uvs, got {}", tris.len() * 3, uvs.len());
        }
        if material_ids.len() != tris.len() {
            bail!(
                "expected {} material ids, got {}",
                tris.len(),
                material_ids.len()
            );
        }
        for tri in &tris {
            let max_index = u32::max(tri.0, u32::max(tri.1, tri.2));
            if max_index as usize >= vertices.len() {
                bail!("vertex index {} out of range", max_index);
            }
        }
        if let Some(&id) = material_ids.iter().max() {
            if id as usize >= materials.len() {
                bail!("material id {} out of range", id);
            }
        }

        Ok(GeometryStore {
            vertices,
            tris,
            normals,
            uvs,
            material_ids,
            materials,
        })
    }

    pub fn triangle_count(&self) -> usize {
        self.tris.len()
    }

    pub fn triangle_vertices(&self, tri: u32) -> (Vec3, Vec3, Vec3) {
        let indices = self.tris[tri as usize];
        (
            self.vertices[indices.0 as usize],
            self.vertices[indices.1 as usize],
            self.vertices[indices.2 as usize],
        )
    }

    pub fn triangle_normals(&self, tri: u32) -> (Vec3, Vec3, Vec3) {
        let base = tri as usize * 3;
        (self.normals[base], self.normals[base + 1], self.normals[base + 2])
    }

    pub fn triangle_uvs(&self, tri: u32) -> (Vec2, Vec2, Vec2) {
        let base = tri as usize * 3;
        (self.uvs[base], self.uvs[base + 1], self.uvs[base + 2])
    }

    pub fn material_of(&self, tri: u32) -> &Material {
        &self.materials[self.material_ids[tri as usize] as usize]
    }

    pub fn triangle_area(&self, tri: u32) -> f32 {
        let (a, b, c) = self.triangle_vertices(tri);
        Vec3::cross(b - a, c - a).length() * 0.5
    }
}
