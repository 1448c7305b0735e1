//! Particle sources.
//!
//! A [`ParticleSource`] describes where the initial particle positions come
//! from. Loading it produces a [`ParticleSet`], which is immutable for the
//! rest of the run; only the encoded state texture changes afterwards.
//!
//! ```ignore
//! use gpgpu_flow::ParticleSource;
//!
//! let set = ParticleSource::sphere().load()?;
//! assert_eq!(set.count(), 2562);
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use glam::Vec3;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::error::SourceError;

/// Model path the binary looks for before falling back to the sphere.
pub const DEFAULT_MODEL_PATH: &str = "static/model.glb";

/// Radius of the default procedural sphere.
pub const DEFAULT_SPHERE_RADIUS: f32 = 3.0;

/// Subdivision level of the default procedural sphere (2562 vertices).
pub const DEFAULT_SPHERE_SUBDIVISIONS: u32 = 4;

/// Where the initial particle positions come from.
#[derive(Debug, Clone, PartialEq)]
pub enum ParticleSource {
    /// Vertices of a subdivided icosahedron projected onto a sphere.
    Sphere {
        /// Sphere radius in world units.
        radius: f32,
        /// Number of 4-way triangle subdivisions applied to the icosahedron.
        subdivisions: u32,
    },
    /// Vertices of the first mesh of a glTF/GLB file.
    Model(PathBuf),
}

impl ParticleSource {
    /// The default sphere: radius 3, four subdivisions.
    pub fn sphere() -> Self {
        ParticleSource::Sphere {
            radius: DEFAULT_SPHERE_RADIUS,
            subdivisions: DEFAULT_SPHERE_SUBDIVISIONS,
        }
    }

    /// A glTF/GLB model source.
    pub fn model(path: impl Into<PathBuf>) -> Self {
        ParticleSource::Model(path.into())
    }

    /// Build the particle set.
    ///
    /// Model sources fail if the file is missing, undecodable, or has no
    /// mesh with positions. There is no fallback: the caller is expected to
    /// treat the error as fatal.
    pub fn load(&self) -> Result<ParticleSet, SourceError> {
        let set = match self {
            ParticleSource::Sphere {
                radius,
                subdivisions,
            } => ParticleSet::from_positions(icosphere(*radius, *subdivisions)),
            ParticleSource::Model(path) => load_model(path)?,
        };

        if set.count() == 0 {
            return Err(SourceError::Empty);
        }
        log::info!("particle source {:?} produced {} particles", self, set.count());
        Ok(set)
    }
}

impl Default for ParticleSource {
    fn default() -> Self {
        Self::sphere()
    }
}

/// Initial particle data: positions plus optional colours and phase.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleSet {
    positions: Vec<Vec3>,
    colors: Option<Vec<Vec3>>,
    phase: Option<Vec<f32>>,
}

impl ParticleSet {
    /// A set with positions only.
    pub fn from_positions(positions: Vec<Vec3>) -> Self {
        Self {
            positions,
            colors: None,
            phase: None,
        }
    }

    /// Attach per-particle colours (linear RGB).
    ///
    /// # Panics
    ///
    /// Panics if `colors.len()` differs from the particle count.
    pub fn with_colors(mut self, colors: Vec<Vec3>) -> Self {
        assert_eq!(colors.len(), self.positions.len(), "colour count mismatch");
        self.colors = Some(colors);
        self
    }

    /// Fill the life-cycle phase with values in `[0, 1)` from a seeded RNG.
    pub fn with_random_phase(mut self, seed: u64) -> Self {
        let mut rng = SmallRng::seed_from_u64(seed);
        self.phase = Some((0..self.positions.len()).map(|_| rng.gen::<f32>()).collect());
        self
    }

    /// Number of particles.
    #[inline]
    pub fn count(&self) -> usize {
        self.positions.len()
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn colors(&self) -> Option<&[Vec3]> {
        self.colors.as_deref()
    }

    pub fn phase(&self) -> Option<&[f32]> {
        self.phase.as_deref()
    }

    /// Static per-particle sprite size factors in `[0, 1)`.
    ///
    /// Seeded separately from the phase so that toggling one does not shift
    /// the other.
    pub fn sprite_sizes(&self, seed: u64) -> Vec<f32> {
        let mut rng = SmallRng::seed_from_u64(seed ^ 0x5bd1_e995);
        (0..self.positions.len()).map(|_| rng.gen::<f32>()).collect()
    }

    /// Colour for particle `i`: the source colour, or a direction-based tint
    /// when the source has none.
    pub fn color_or_tint(&self, i: usize) -> Vec3 {
        match &self.colors {
            Some(colors) => colors[i],
            None => self.positions[i].normalize_or_zero() * 0.5 + Vec3::splat(0.5),
        }
    }
}

/// Vertices of an icosphere with `10 * 4^subdivisions + 2` unique vertices.
pub fn icosphere(radius: f32, subdivisions: u32) -> Vec<Vec3> {
    let t = (1.0 + 5.0_f32.sqrt()) / 2.0;
    let mut vertices = vec![
        Vec3::new(-1.0, t, 0.0),
        Vec3::new(1.0, t, 0.0),
        Vec3::new(-1.0, -t, 0.0),
        Vec3::new(1.0, -t, 0.0),
        Vec3::new(0.0, -1.0, t),
        Vec3::new(0.0, 1.0, t),
        Vec3::new(0.0, -1.0, -t),
        Vec3::new(0.0, 1.0, -t),
        Vec3::new(t, 0.0, -1.0),
        Vec3::new(t, 0.0, 1.0),
        Vec3::new(-t, 0.0, -1.0),
        Vec3::new(-t, 0.0, 1.0),
    ];
    let mut faces: Vec<[u32; 3]> = vec![
        [0, 11, 5],
        [0, 5, 1],
        [0, 1, 7],
        [0, 7, 10],
        [0, 10, 11],
        [1, 5, 9],
        [5, 11, 4],
        [11, 10, 2],
        [10, 7, 6],
        [7, 1, 8],
        [3, 9, 4],
        [3, 4, 2],
        [3, 2, 6],
        [3, 6, 8],
        [3, 8, 9],
        [4, 9, 5],
        [2, 4, 11],
        [6, 2, 10],
        [8, 6, 7],
        [9, 8, 1],
    ];

    for _ in 0..subdivisions {
        let mut midpoints: HashMap<(u32, u32), u32> = HashMap::new();
        let mut midpoint = |a: u32, b: u32, vertices: &mut Vec<Vec3>| -> u32 {
            let key = (a.min(b), a.max(b));
            *midpoints.entry(key).or_insert_with(|| {
                vertices.push((vertices[a as usize] + vertices[b as usize]) * 0.5);
                (vertices.len() - 1) as u32
            })
        };

        let mut next = Vec::with_capacity(faces.len() * 4);
        for [a, b, c] in faces {
            let ab = midpoint(a, b, &mut vertices);
            let bc = midpoint(b, c, &mut vertices);
            let ca = midpoint(c, a, &mut vertices);
            next.push([a, ab, ca]);
            next.push([b, bc, ab]);
            next.push([c, ca, bc]);
            next.push([ab, bc, ca]);
        }
        faces = next;
    }

    vertices
        .into_iter()
        .map(|v| v.normalize() * radius)
        .collect()
}

fn load_model(path: &Path) -> Result<ParticleSet, SourceError> {
    let (document, buffers, _images) = gltf::import(path).map_err(|source| SourceError::Gltf {
        path: path.to_path_buf(),
        source,
    })?;

    let mesh = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .and_then(|scene| scene.nodes().find_map(first_mesh))
        .or_else(|| document.meshes().next())
        .ok_or_else(|| SourceError::NoMesh(path.to_path_buf()))?;

    let primitive = mesh
        .primitives()
        .find(|primitive| primitive.get(&gltf::Semantic::Positions).is_some())
        .ok_or_else(|| SourceError::NoPositions(path.to_path_buf()))?;
    let reader = primitive.reader(|buffer| Some(buffers[buffer.index()].0.as_slice()));

    let positions: Vec<Vec3> = reader
        .read_positions()
        .ok_or_else(|| SourceError::NoPositions(path.to_path_buf()))?
        .map(Vec3::from)
        .collect();
    if positions.is_empty() {
        return Err(SourceError::NoPositions(path.to_path_buf()));
    }
    log::debug!(
        "mesh '{}' primitive {} of {}: {} vertices",
        mesh.name().unwrap_or("<unnamed>"),
        primitive.index(),
        mesh.primitives().len(),
        positions.len()
    );

    let colors: Option<Vec<Vec3>> = reader
        .read_colors(0)
        .map(|colors| colors.into_rgb_f32().map(Vec3::from).collect());

    let set = ParticleSet::from_positions(positions);
    match colors {
        Some(colors) if colors.len() == set.count() => Ok(set.with_colors(colors)),
        Some(colors) => {
            log::warn!(
                "model '{}' has {} colours for {} vertices, using position tint",
                path.display(),
                colors.len(),
                set.count()
            );
            Ok(set)
        }
        None => {
            log::info!("model '{}' has no vertex colours, using position tint", path.display());
            Ok(set)
        }
    }
}

fn first_mesh<'a>(node: gltf::Node<'a>) -> Option<gltf::Mesh<'a>> {
    node.mesh().or_else(|| node.children().find_map(first_mesh))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_icosphere_vertex_counts() {
        for n in 0..5 {
            let expected = 10 * 4usize.pow(n) + 2;
            assert_eq!(icosphere(1.0, n).len(), expected, "subdivision {}", n);
        }
    }

    #[test]
    fn test_default_sphere_has_2562_particles() {
        let set = ParticleSource::sphere().load().unwrap();
        assert_eq!(set.count(), 2562);
        assert!(set.colors().is_none());
        assert!(set.phase().is_none());
    }

    #[test]
    fn test_sphere_vertices_lie_on_radius() {
        for v in icosphere(3.0, 3) {
            assert!((v.length() - 3.0).abs() < 1e-4, "vertex {:?} off the sphere", v);
        }
    }

    #[test]
    fn test_random_phase_in_unit_range() {
        let set = ParticleSource::sphere().load().unwrap().with_random_phase(7);
        let phase = set.phase().unwrap();
        assert_eq!(phase.len(), set.count());
        assert!(phase.iter().all(|w| (0.0..1.0).contains(w)));
    }

    #[test]
    fn test_random_phase_is_seeded() {
        let a = ParticleSet::from_positions(icosphere(1.0, 1)).with_random_phase(11);
        let b = ParticleSet::from_positions(icosphere(1.0, 1)).with_random_phase(11);
        let c = ParticleSet::from_positions(icosphere(1.0, 1)).with_random_phase(12);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_sprite_sizes_differ_from_phase() {
        let set = ParticleSet::from_positions(icosphere(1.0, 1)).with_random_phase(3);
        let sizes = set.sprite_sizes(3);
        assert_eq!(sizes.len(), set.count());
        assert_ne!(sizes.as_slice(), set.phase().unwrap());
    }

    #[test]
    fn test_tint_without_colors() {
        let set = ParticleSet::from_positions(vec![Vec3::X * 2.0]);
        assert_eq!(set.color_or_tint(0), Vec3::new(1.0, 0.5, 0.5));

        let colored = set.with_colors(vec![Vec3::new(0.1, 0.2, 0.3)]);
        assert_eq!(colored.color_or_tint(0), Vec3::new(0.1, 0.2, 0.3));
    }

    #[test]
    fn test_model_uses_first_primitive_only() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/two_primitives.gltf");
        let set = ParticleSource::model(path).load().unwrap();

        assert_eq!(set.count(), 3);
        assert_eq!(set.positions(), &[Vec3::ZERO, Vec3::X, Vec3::Y]);
        assert!(set.colors().is_none());
    }

    #[test]
    fn test_missing_model_is_an_error() {
        let err = ParticleSource::model("does/not/exist.glb").load().unwrap_err();
        assert!(matches!(err, SourceError::Gltf { .. }));
    }
}
