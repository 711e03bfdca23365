//! Conversion pipeline: import, flatten, report, write

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use meshpack_assets::SceneImporter;
use meshpack_format::{flatten, read_file, write_file};
use tracing::debug;

use crate::report::ConversionReport;
use crate::settings::{ConvertSettings, ReportFormat};

/// What a successful conversion produced
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionSummary {
    pub mesh_count: usize,
    pub vertex_count: usize,
    pub index_count: usize,
    pub bytes_written: u64,
}

/// Convert `source` into the packed format at `out`.
///
/// The report (when enabled) goes to `report_sink`. Nothing is written to
/// `out` unless import and flattening both succeed.
pub fn convert(
    source: &Path,
    out: &Path,
    settings: &ConvertSettings,
    report_sink: &mut dyn Write,
) -> Result<ConversionSummary> {
    let base = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let importer =
        SceneImporter::new(base).with_post_process(settings.import.post_process());

    debug!(
        "Resolving models against {}, post-processing: {:?}",
        importer.base_path().display(),
        importer.post_process()
    );

    let scene = importer.import(source).context("Failed to load model")?;

    let flat = flatten(&scene, settings.export.index_rebase)
        .context("Failed to flatten scene")?;
    flat.check_partition()
        .context("Flattened scene is inconsistent")?;

    debug!(
        "Flattened {} meshes ({} rebase): {} vertices, {} triangles",
        flat.meshes.len(),
        settings.export.index_rebase,
        flat.vertices.len(),
        flat.triangle_count()
    );

    if settings.report.enabled {
        let report = ConversionReport::from_scene(&flat)
            .render(settings.report.format)
            .context("Failed to render report")?;
        report_sink
            .write_all(report.as_bytes())
            .context("Failed to print report")?;
    }

    let bytes_written = write_file(out, &flat, settings.export.atomic_write)
        .with_context(|| format!("Failed to write {}", out.display()))?;

    Ok(ConversionSummary {
        mesh_count: flat.meshes.len(),
        vertex_count: flat.vertices.len(),
        index_count: flat.indices.len(),
        bytes_written,
    })
}

/// Read back a packed file and print its report
pub fn inspect(path: &Path, format: ReportFormat, sink: &mut dyn Write) -> Result<()> {
    let scene = read_file(path).with_context(|| format!("Failed to read {}", path.display()))?;
    scene
        .check_partition()
        .with_context(|| format!("{} is inconsistent", path.display()))?;

    let report = ConversionReport::from_scene(&scene)
        .render(format)
        .context("Failed to render report")?;
    sink.write_all(report.as_bytes())
        .context("Failed to print report")?;
    Ok(())
}
