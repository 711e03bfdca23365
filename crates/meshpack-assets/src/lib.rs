//! Meshpack Assets - Scene import and post-processing
//!
//! Reads glTF 2.0 and Wavefront OBJ models into a format-agnostic scene
//! graph (meshes plus a material table) and normalizes it for flattening.

mod error;
mod gltf_loader;
mod importer;
mod obj_loader;
mod postprocess;
mod scene;

pub use error::AssetError;
pub use gltf_loader::load_gltf;
pub use importer::{SceneImporter, SourceFormat};
pub use obj_loader::load_obj;
pub use postprocess::{join_identical_vertices, sort_by_primitive_type, triangulate, PostProcess};
pub use scene::{Face, Material, PrimitiveKind, Scene, SceneMesh};
