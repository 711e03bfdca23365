use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::AssetError;
use crate::gltf_loader;
use crate::obj_loader;
use crate::postprocess::PostProcess;
use crate::scene::Scene;

/// Model formats the importer can read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Gltf,
    Obj,
}

impl SourceFormat {
    /// Detect the format from the file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "gltf" | "glb" => Some(Self::Gltf),
            "obj" => Some(Self::Obj),
            _ => None,
        }
    }
}

/// Entry point for turning a model file into a post-processed scene.
pub struct SceneImporter {
    base_path: PathBuf,
    post_process: PostProcess,
}

impl SceneImporter {
    /// Create an importer rooted at the given base path, with every
    /// post-processing pass enabled.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            post_process: PostProcess::default(),
        }
    }

    /// Replace the post-processing passes run after loading.
    pub fn with_post_process(mut self, post_process: PostProcess) -> Self {
        self.post_process = post_process;
        self
    }

    /// Resolve a relative model path against the base path.
    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_path.join(path)
        }
    }

    /// Load, validate and post-process the model at `path`.
    pub fn import(&self, path: &Path) -> Result<Scene, AssetError> {
        let full_path = self.resolve(path);

        if !full_path.exists() {
            return Err(AssetError::NotFound(full_path));
        }

        let format = SourceFormat::from_path(&full_path)
            .ok_or_else(|| AssetError::UnsupportedFormat(full_path.clone()))?;

        let mut scene = match format {
            SourceFormat::Gltf => gltf_loader::load_gltf(&full_path)?,
            SourceFormat::Obj => obj_loader::load_obj(&full_path)?,
        };

        scene
            .validate()
            .map_err(|msg| AssetError::InvalidScene(full_path.clone(), msg))?;

        self.post_process.apply(&mut scene);

        info!(
            "Imported '{}': {} meshes, {} materials, {} faces ({} triangles)",
            full_path.display(),
            scene.meshes.len(),
            scene.materials.len(),
            scene.face_count(),
            scene.triangle_count()
        );

        Ok(scene)
    }

    /// The base path this importer resolves relative paths against.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn post_process(&self) -> PostProcess {
        self.post_process
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn fixture_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join("meshpack-importer-tests").join(name);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn missing_file_returns_error() {
        let importer = SceneImporter::new("/nonexistent");
        match importer.import(Path::new("does_not_exist.glb")) {
            Err(AssetError::NotFound(_)) => {}
            other => panic!("expected NotFound, got: {:?}", other),
        }
    }

    #[test]
    fn unknown_extension_is_unsupported() {
        let dir = fixture_dir("unsupported");
        let path = dir.join("model.fbx");
        fs::write(&path, b"not really fbx").unwrap();

        let importer = SceneImporter::new(&dir);
        match importer.import(Path::new("model.fbx")) {
            Err(AssetError::UnsupportedFormat(p)) => assert_eq!(p, path),
            other => panic!("expected UnsupportedFormat, got: {:?}", other),
        }
    }

    #[test]
    fn detects_formats() {
        assert_eq!(SourceFormat::from_path(Path::new("a.GLB")), Some(SourceFormat::Gltf));
        assert_eq!(SourceFormat::from_path(Path::new("a.gltf")), Some(SourceFormat::Gltf));
        assert_eq!(SourceFormat::from_path(Path::new("a.Obj")), Some(SourceFormat::Obj));
        assert_eq!(SourceFormat::from_path(Path::new("a.stl")), None);
        assert_eq!(SourceFormat::from_path(Path::new("noext")), None);
    }

    #[test]
    fn resolve_absolute_path() {
        let importer = SceneImporter::new("/home/user/models");
        assert_eq!(
            importer.resolve(Path::new("/absolute/path.glb")),
            PathBuf::from("/absolute/path.glb")
        );
    }

    #[test]
    fn resolve_relative_path() {
        let importer = SceneImporter::new("/home/user/models");
        assert_eq!(
            importer.resolve(Path::new("props/box.obj")),
            PathBuf::from("/home/user/models/props/box.obj")
        );
    }

    #[test]
    fn obj_syntax_error_keeps_line_number() {
        let dir = fixture_dir("obj_syntax");
        let path = dir.join("broken.obj");
        fs::write(&path, "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 9\n").unwrap();

        match SceneImporter::new(&dir).import(Path::new("broken.obj")) {
            Err(AssetError::Parse { path: p, line, message }) => {
                assert_eq!(p, path);
                assert_eq!(line, 4);
                assert!(message.contains("position index 9"));
            }
            other => panic!("expected Parse, got: {:?}", other),
        }
    }

    #[test]
    fn broken_gltf_is_import_failure() {
        let dir = fixture_dir("gltf_syntax");
        let path = dir.join("broken.gltf");
        fs::write(&path, "{ \"asset\": ").unwrap();

        match SceneImporter::new(&dir).import(Path::new("broken.gltf")) {
            Err(AssetError::ImportFailed(p, diagnostic)) => {
                assert_eq!(p, path);
                assert!(!diagnostic.is_empty());
            }
            other => panic!("expected ImportFailed, got: {:?}", other),
        }
    }

    #[test]
    fn import_runs_post_processing() {
        let dir = fixture_dir("post_process");
        fs::write(
            dir.join("quad.obj"),
            "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\nl 1 3\n",
        )
        .unwrap();

        let scene = SceneImporter::new(&dir)
            .import(Path::new("quad.obj"))
            .unwrap();
        // Triangulated quad plus the line split off into its own mesh.
        assert_eq!(scene.meshes.len(), 2);
        assert_eq!(scene.triangle_count(), 2);
        assert_eq!(scene.meshes[0].faces.len(), 1);
        assert_eq!(scene.meshes[0].positions.len(), 2);

        let raw = SceneImporter::new(&dir)
            .with_post_process(PostProcess::none())
            .import(Path::new("quad.obj"))
            .unwrap();
        assert_eq!(raw.triangle_count(), 0);
        assert_eq!(raw.meshes.len(), 1);
        assert_eq!(raw.face_count(), 2);
    }
}
