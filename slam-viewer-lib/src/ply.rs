//! ASCII PLY output.

use crate::error::ViewerError;
use crate::structures::Mesh;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

pub const PLY_EXTENSION: &str = ".ply";

/// Appends `.ply` unless `path` already ends with it.
pub fn with_ply_extension(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    if path.as_os_str().to_string_lossy().ends_with(PLY_EXTENSION) {
        return path.to_path_buf();
    }
    let mut s = path.as_os_str().to_os_string();
    s.push(PLY_EXTENSION);
    PathBuf::from(s)
}

/// Serializes `mesh` into `output`, replacing its previous contents.
pub fn write_ply(output: &mut Vec<u8>, mesh: &Mesh) -> Result<(), ViewerError> {
    output.clear();
    output.extend_from_slice(b"ply\nformat ascii 1.0\ncomment Slam Viewer generated\n");
    writeln!(output, "element vertex {}", mesh.vertex_count()).map_err(ViewerError::IoError)?;
    output.extend_from_slice(
        b"property float x\nproperty float y\nproperty float z\n\
          property uchar red\nproperty uchar green\nproperty uchar blue\n",
    );
    writeln!(output, "element face {}", mesh.face_count()).map_err(ViewerError::IoError)?;
    output.extend_from_slice(b"property list uchar int vertex_indices\nend_header\n");

    // Rough per-line estimate, enough to avoid most reallocations
    output.reserve(mesh.vertex_count() * 40 + mesh.face_count() * 20);

    for p in &mesh.points {
        writeln!(
            output,
            "{} {} {} {} {} {}",
            p.x, p.y, p.z, p.color.r, p.color.g, p.color.b
        )
        .map_err(ViewerError::IoError)?;
    }
    for t in &mesh.triangles {
        writeln!(output, "3 {} {} {}", t.a, t.b, t.c).map_err(ViewerError::IoError)?;
    }
    Ok(())
}

/// Writes `mesh` to `path` (with `.ply` appended if needed) and returns the
/// path actually written.
#[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn save_ply(mesh: &Mesh, path: impl AsRef<Path>) -> Result<PathBuf, ViewerError> {
    let path = with_ply_extension(path);
    let mut buf = Vec::new();
    write_ply(&mut buf, mesh)?;
    fs::write(&path, &buf)?;
    info!("Wrote {} bytes to {}", buf.len(), path.display());
    Ok(path)
}
