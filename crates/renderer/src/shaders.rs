//! Default WGSL programs and their fixed interface constants.

use std::fs;
use std::io;
use std::path::Path;

/// Per-axis workgroup size baked into `compute.wgsl` (`@workgroup_size(8, 8)`).
pub const COMPUTE_WORKGROUP_EXTENT: u32 = 8;

/// Two triangles covering the viewport, `float32x2` per vertex.
pub const QUAD_VERTICES: [f32; 12] = [
    -1.0, -1.0, 1.0, -1.0, 1.0, 1.0, //
    -1.0, -1.0, 1.0, 1.0, -1.0, 1.0,
];

pub const QUAD_VERTEX_COUNT: u32 = (QUAD_VERTICES.len() / 2) as u32;

const PATH_TRACER_WGSL: &str = include_str!("shaders/compute.wgsl");
const DISPLAY_WGSL: &str = include_str!("shaders/display.wgsl");

/// Compute program that adds samples into the accumulation buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComputeProgram {
    label: String,
    source: String,
    entry_point: String,
}

impl ComputeProgram {
    /// Bundled sphere path tracer.
    pub fn path_tracer() -> Self {
        Self::from_wgsl("path tracer", PATH_TRACER_WGSL, "main")
    }

    pub fn from_wgsl(
        label: impl Into<String>,
        source: impl Into<String>,
        entry_point: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            source: source.into(),
            entry_point: entry_point.into(),
        }
    }

    /// Reads a replacement program from disk. The entry point must be `main`.
    pub fn load(path: &Path) -> io::Result<Self> {
        let source = fs::read_to_string(path)?;
        Ok(Self::from_wgsl(path.display().to_string(), source, "main"))
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }
}

impl Default for ComputeProgram {
    fn default() -> Self {
        Self::path_tracer()
    }
}

/// Vertex + fragment program that resolves the accumulation buffer to pixels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayProgram {
    label: String,
    source: String,
    vertex_entry: String,
    fragment_entry: String,
}

impl DisplayProgram {
    pub fn resolve() -> Self {
        Self::from_wgsl("display", DISPLAY_WGSL, "vs_main", "fs_main")
    }

    pub fn from_wgsl(
        label: impl Into<String>,
        source: impl Into<String>,
        vertex_entry: impl Into<String>,
        fragment_entry: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            source: source.into(),
            vertex_entry: vertex_entry.into(),
            fragment_entry: fragment_entry.into(),
        }
    }

    /// Reads a replacement program from disk with `vs_main` / `fs_main` entry points.
    pub fn load(path: &Path) -> io::Result<Self> {
        let source = fs::read_to_string(path)?;
        Ok(Self::from_wgsl(
            path.display().to_string(),
            source,
            "vs_main",
            "fs_main",
        ))
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn vertex_entry(&self) -> &str {
        &self.vertex_entry
    }

    pub fn fragment_entry(&self) -> &str {
        &self.fragment_entry
    }
}

impl Default for DisplayProgram {
    fn default() -> Self {
        Self::resolve()
    }
}
