//! Wavefront OBJ reader.
//!
//! Streaming parser for the common OBJ constructs (v, vt, vn, f, l, p, o,
//! g, usemtl, mtllib). Polygons are kept as N-index faces; triangulation is
//! left to post-processing.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use meshpack_core::{Color, Vec3};
use tracing::{debug, warn};

use crate::error::AssetError;
use crate::scene::{Face, Material, Scene, SceneMesh};

/// Resolved (0-based) attribute indices of one face corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct VertexKey {
    position: usize,
    tex_coord: Option<usize>,
    normal: Option<usize>,
}

/// Mesh under construction. Corners are deduplicated per mesh so each
/// mesh owns a compact vertex list.
struct MeshBuilder {
    mesh: SceneMesh,
    material: Option<usize>,
    corners: HashMap<VertexKey, u32>,
}

impl MeshBuilder {
    fn new(name: String, material: Option<usize>) -> Self {
        Self {
            mesh: SceneMesh::new(name, 0),
            material,
            corners: HashMap::new(),
        }
    }

    fn has_faces(&self) -> bool {
        !self.mesh.faces.is_empty()
    }

    fn corner(&mut self, key: VertexKey, pools: &Pools) -> u32 {
        if let Some(&index) = self.corners.get(&key) {
            return index;
        }

        let index = self.mesh.positions.len() as u32;
        self.mesh.positions.push(pools.positions[key.position]);

        // Attribute arrays exist once any corner carries the attribute;
        // corners without it are padded with zeros.
        if let Some(vt) = key.tex_coord {
            let tex_coords = self.mesh.tex_coords.get_or_insert_with(Vec::new);
            tex_coords.resize(index as usize, [0.0, 0.0]);
            tex_coords.push(pools.tex_coords[vt]);
        } else if let Some(tex_coords) = self.mesh.tex_coords.as_mut() {
            tex_coords.push([0.0, 0.0]);
        }

        if let Some(vn) = key.normal {
            let normals = self.mesh.normals.get_or_insert_with(Vec::new);
            normals.resize(index as usize, Vec3::ZERO);
            normals.push(pools.normals[vn]);
        } else if let Some(normals) = self.mesh.normals.as_mut() {
            normals.push(Vec3::ZERO);
        }

        self.corners.insert(key, index);
        index
    }
}

/// File-wide attribute pools referenced by face corners.
#[derive(Default)]
struct Pools {
    positions: Vec<Vec3>,
    tex_coords: Vec<[f32; 2]>,
    normals: Vec<Vec3>,
}

/// Collects materials from MTL libraries and hands out the fallback slot.
#[derive(Default)]
struct MaterialTable {
    materials: Vec<Material>,
    by_name: HashMap<String, usize>,
    fallback: Option<usize>,
}

impl MaterialTable {
    fn add(&mut self, material: Material) {
        let index = self.materials.len();
        self.by_name.insert(material.name.clone(), index);
        self.materials.push(material);
    }

    fn lookup(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    fn fallback(&mut self) -> usize {
        if let Some(index) = self.fallback {
            return index;
        }
        let index = self.materials.len();
        self.materials.push(Material::fallback());
        self.fallback = Some(index);
        index
    }
}

/// Parsing state shared across lines.
struct ObjParser<'a> {
    path: &'a Path,
    line: usize,
    pools: Pools,
    materials: MaterialTable,
    meshes: Vec<SceneMesh>,
    current: MeshBuilder,
    group: String,
}

impl<'a> ObjParser<'a> {
    fn new(path: &'a Path) -> Self {
        Self {
            path,
            line: 0,
            pools: Pools::default(),
            materials: MaterialTable::default(),
            meshes: Vec::new(),
            current: MeshBuilder::new("unnamed".to_string(), None),
            group: "unnamed".to_string(),
        }
    }

    fn error(&self, message: impl Into<String>) -> AssetError {
        AssetError::Parse {
            path: self.path.to_path_buf(),
            line: self.line,
            message: message.into(),
        }
    }

    /// Move the current builder into the mesh list and start a new one.
    fn finish_mesh(&mut self) {
        let material = self.current.material;
        let next = MeshBuilder::new(self.group.clone(), material);
        let builder = std::mem::replace(&mut self.current, next);

        if builder.has_faces() {
            let mut mesh = builder.mesh;
            mesh.material_index = match builder.material {
                Some(index) => index,
                None => self.materials.fallback(),
            };
            self.meshes.push(mesh);
        }
    }

    /// Start a new mesh if the current one already has faces, otherwise
    /// just rename it.
    fn set_group(&mut self, name: &str) {
        self.group = name.to_string();
        if self.current.has_faces() {
            self.finish_mesh();
        } else {
            self.current.mesh.name = self.group.clone();
        }
    }

    fn set_material(&mut self, name: &str) {
        let material = self.materials.lookup(name);
        if material.is_none() {
            warn!(
                "{}:{}: unknown material '{}', using default",
                self.path.display(),
                self.line,
                name
            );
        }
        if self.current.has_faces() {
            self.finish_mesh();
        }
        self.current.material = material;
    }

    fn parse_floats<const N: usize>(&self, tag: &str, tokens: &[&str]) -> Result<[f32; N], AssetError> {
        if tokens.len() < N {
            return Err(self.error(format!(
                "'{}' expects {} values, found {}",
                tag,
                N,
                tokens.len()
            )));
        }
        let mut out = [0.0f32; N];
        for (slot, token) in out.iter_mut().zip(tokens) {
            *slot = token
                .parse()
                .map_err(|_| self.error(format!("invalid number '{}' in '{}'", token, tag)))?;
        }
        Ok(out)
    }

    fn resolve_index(&self, raw: &str, len: usize, what: &str) -> Result<usize, AssetError> {
        let idx: i64 = raw
            .parse()
            .map_err(|_| self.error(format!("invalid {} index '{}'", what, raw)))?;
        let resolved = if idx > 0 {
            idx - 1
        } else {
            len as i64 + idx
        };
        if idx == 0 || resolved < 0 || resolved as usize >= len {
            return Err(self.error(format!(
                "{} index {} out of bounds (1..={})",
                what, idx, len
            )));
        }
        Ok(resolved as usize)
    }

    fn parse_corner(&self, token: &str) -> Result<VertexKey, AssetError> {
        let mut parts = token.split('/');
        let position = match parts.next() {
            Some(p) if !p.is_empty() => self.resolve_index(p, self.pools.positions.len(), "position")?,
            _ => return Err(self.error("face vertex missing position index")),
        };
        let tex_coord = match parts.next() {
            Some(t) if !t.is_empty() => {
                Some(self.resolve_index(t, self.pools.tex_coords.len(), "texcoord")?)
            }
            _ => None,
        };
        let normal = match parts.next() {
            Some(n) if !n.is_empty() => {
                Some(self.resolve_index(n, self.pools.normals.len(), "normal")?)
            }
            _ => None,
        };
        Ok(VertexKey {
            position,
            tex_coord,
            normal,
        })
    }

    /// Resolve every token of an element line into mesh-local indices.
    fn parse_element(&mut self, tag: &str, tokens: &[&str]) -> Result<Vec<u32>, AssetError> {
        if tokens.is_empty() {
            return Err(self.error(format!("'{}' has no vertices", tag)));
        }
        let keys = tokens
            .iter()
            .map(|t| self.parse_corner(t))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(keys
            .into_iter()
            .map(|key| self.current.corner(key, &self.pools))
            .collect())
    }

    fn parse_face(&mut self, tokens: &[&str]) -> Result<(), AssetError> {
        let indices = self.parse_element("f", tokens)?;
        self.current.mesh.faces.push(Face::new(indices));
        Ok(())
    }

    /// `l` lines become one 2-index face per segment.
    fn parse_polyline(&mut self, tokens: &[&str]) -> Result<(), AssetError> {
        if tokens.len() < 2 {
            return Err(self.error("'l' needs at least two vertices"));
        }
        let indices = self.parse_element("l", tokens)?;
        self.current
            .mesh
            .faces
            .extend(indices.windows(2).map(|pair| Face::new(pair.to_vec())));
        Ok(())
    }

    fn parse_points(&mut self, tokens: &[&str]) -> Result<(), AssetError> {
        let indices = self.parse_element("p", tokens)?;
        self.current
            .mesh
            .faces
            .extend(indices.into_iter().map(|i| Face::new(vec![i])));
        Ok(())
    }

    fn parse_line(&mut self, line: &str) -> Result<(), AssetError> {
        let s = line.trim();
        if s.is_empty() || s.starts_with('#') {
            return Ok(());
        }
        let mut it = s.split_whitespace();
        let tag = it.next().unwrap_or("");
        let tokens: Vec<&str> = it.collect();

        match tag {
            "v" => {
                let [x, y, z] = self.parse_floats::<3>(tag, &tokens)?;
                self.pools.positions.push(Vec3::new(x, y, z));
            }
            "vt" => {
                // The optional third (w) component is ignored.
                let uv = self.parse_floats::<1>(tag, &tokens)?;
                let v = match tokens.get(1) {
                    Some(t) => t
                        .parse()
                        .map_err(|_| self.error(format!("invalid number '{}' in 'vt'", t)))?,
                    None => 0.0,
                };
                self.pools.tex_coords.push([uv[0], v]);
            }
            "vn" => {
                let [x, y, z] = self.parse_floats::<3>(tag, &tokens)?;
                self.pools.normals.push(Vec3::new(x, y, z));
            }
            "f" => self.parse_face(&tokens)?,
            "l" => self.parse_polyline(&tokens)?,
            "p" => self.parse_points(&tokens)?,
            "o" | "g" => {
                let name = if tokens.is_empty() {
                    "unnamed".to_string()
                } else {
                    tokens.join(" ")
                };
                self.set_group(&name);
            }
            "usemtl" => {
                let name = tokens.join(" ");
                self.set_material(&name);
            }
            "mtllib" => {
                let base_dir = self.path.parent().map(Path::to_path_buf).unwrap_or_default();
                for file in &tokens {
                    let mtl_path = base_dir.join(file);
                    for material in parse_mtl_file(&mtl_path)? {
                        self.materials.add(material);
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn finish(mut self) -> Scene {
        self.finish_mesh();
        Scene {
            meshes: self.meshes,
            materials: self.materials.materials,
        }
    }
}

/// Parse an MTL library, keeping materials in file order. A missing
/// library is not fatal.
fn parse_mtl_file(path: &Path) -> Result<Vec<Material>, AssetError> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            warn!("Could not open material library '{}': {}", path.display(), e);
            return Ok(Vec::new());
        }
    };
    let reader = BufReader::new(file);

    let mut materials = Vec::new();
    let mut current: Option<Material> = None;

    for line in reader.lines() {
        let line = line.map_err(|e| AssetError::Io(path.to_path_buf(), e))?;
        let s = line.trim();
        if s.is_empty() || s.starts_with('#') {
            continue;
        }
        let mut it = s.split_whitespace();
        let tag = it.next().unwrap_or("");
        match tag {
            "newmtl" => {
                if let Some(prev) = current.take() {
                    materials.push(prev);
                }
                let name = it.collect::<Vec<_>>().join(" ");
                current = Some(Material::new(name, None));
            }
            "Kd" => {
                if let Some(m) = current.as_mut() {
                    let values: Vec<f32> = it.filter_map(|t| t.parse().ok()).collect();
                    m.diffuse = match values.as_slice() {
                        [r, g, b, ..] => Some(Color::rgb(*r, *g, *b)),
                        [v] => Some(Color::rgb(*v, *v, *v)),
                        _ => m.diffuse,
                    };
                }
            }
            _ => {}
        }
    }

    if let Some(prev) = current.take() {
        materials.push(prev);
    }

    debug!("MTL '{}': {} materials", path.display(), materials.len());
    Ok(materials)
}

/// Load a Wavefront OBJ file (and any referenced MTL libraries) into a scene.
pub fn load_obj(path: &Path) -> Result<Scene, AssetError> {
    let file = File::open(path).map_err(|e| AssetError::Io(path.to_path_buf(), e))?;
    let reader = BufReader::new(file);

    let mut parser = ObjParser::new(path);
    for line in reader.lines() {
        parser.line += 1;
        let line = line.map_err(|e| AssetError::Io(path.to_path_buf(), e))?;
        parser.parse_line(&line)?;
    }

    let scene = parser.finish();
    debug!(
        "OBJ '{}': {} meshes, {} materials",
        path.display(),
        scene.meshes.len(),
        scene.materials.len()
    );
    Ok(scene)
}
