//! Human-readable summary of a flattened scene

use std::fmt::Write as _;

use meshpack_core::MeshRecord;
use meshpack_format::FlatScene;
use serde::Serialize;

use crate::settings::ReportFormat;

/// Counts and per-mesh records of a flattened scene
#[derive(Debug, Clone, Serialize)]
pub struct ConversionReport {
    pub vertex_count: usize,
    pub index_count: usize,
    pub meshes: Vec<MeshRecord>,
}

impl ConversionReport {
    pub fn from_scene(scene: &FlatScene) -> Self {
        Self {
            vertex_count: scene.vertices.len(),
            index_count: scene.indices.len(),
            meshes: scene.meshes.clone(),
        }
    }

    /// Plain text, one field per line, one block per mesh
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        // Writing to a String cannot fail.
        let _ = writeln!(out, "Vertex count: {}", self.vertex_count);
        let _ = writeln!(out, "Index count: {}", self.index_count);
        let _ = writeln!(out, "Meshes: {}", self.meshes.len());

        for mesh in &self.meshes {
            let _ = writeln!(
                out,
                "Color: r: {}, g: {}, b:{}",
                mesh.color.r, mesh.color.g, mesh.color.b
            );
            let _ = writeln!(out, "Vertex base: {}", mesh.vertex_base);
            let _ = writeln!(out, "Vertex count: {}", mesh.vertex_count);
            let _ = writeln!(out, "Index base: {}", mesh.index_base);
            let _ = writeln!(out, "Index count: {}", mesh.index_count);
            let _ = writeln!(out);
        }
        out
    }

    pub fn render(&self, format: ReportFormat) -> serde_json::Result<String> {
        match format {
            ReportFormat::Text => Ok(self.to_text()),
            ReportFormat::Json => serde_json::to_string_pretty(self).map(|mut s| {
                s.push('\n');
                s
            }),
        }
    }
}
