use strum::{Display, EnumCount, EnumIter};

/// Identifies a programmable stage of the graphics or compute pipeline.
///
/// Each [`crate::ir::Module`] implements exactly one stage, and per-stage state such
/// as [`crate::metadata::ResourceUsage`] is keyed by it.
///
/// ## Stages
///
/// - **`Vertex`**: per-vertex processing
/// - **`TessControl`**: tessellation control (hull)
/// - **`TessEval`**: tessellation evaluation (domain)
/// - **`Geometry`**: per-primitive processing
/// - **`Fragment`**: per-fragment (pixel) processing
/// - **`Compute`**: compute dispatch
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter, EnumCount, Display,
)]
#[strum(serialize_all = "kebab-case")]
pub enum ShaderStage {
    /// Vertex shader
    Vertex,
    /// Tessellation control shader
    TessControl,
    /// Tessellation evaluation shader
    TessEval,
    /// Geometry shader
    Geometry,
    /// Fragment shader
    Fragment,
    /// Compute shader
    Compute,
}

impl ShaderStage {
    /// Returns `true` for the stages of the graphics pipeline.
    #[must_use]
    pub const fn is_graphics(self) -> bool {
        !matches!(self, Self::Compute)
    }
}
