use thiserror::Error;
use crate::parameters::PrimitiveLayout;
use crate::change_detector::TransformId;

#[derive(Debug, Error)]
pub enum RenderError {
    // configuration errors: fatal, raised at setup or first use, never retried
    #[error("sphere {sphere_idx} references material {material_idx} but the scene only has {material_count} materials")]
    UnresolvedMaterial {
        sphere_idx: usize,
        material_idx: u32,
        material_count: usize,
    },

    #[error("{buffer} records for {layout:?} pack to {packed} bytes but the kernel expects {expected}")]
    StrideMismatch {
        layout: PrimitiveLayout,
        buffer: &'static str,
        packed: usize,
        expected: usize,
    },

    #[error("compute kernel entry point `{0}` is missing or failed validation")]
    MissingEntryPoint(String),

    #[error("watched transform {0:?} is not connected to the pose source")]
    MissingWatchedTransform(TransformId),

    #[error("unsupported device: {0}")]
    UnsupportedDevice(String),

    // resource failures: fatal for the current frame only
    #[error("failed to allocate {resource}: {reason}")]
    ResourceAllocation {
        resource: String,
        reason: String,
    },

    #[error("could not present frame: {0}")]
    Presentation(String),
}

impl RenderError {
    pub fn allocation(resource: impl Into<String>, reason: impl Into<String>) -> Self {
        RenderError::ResourceAllocation {
            resource: resource.into(),
            reason: reason.into(),
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self,
            RenderError::UnresolvedMaterial { .. }
            | RenderError::StrideMismatch { .. }
            | RenderError::MissingEntryPoint(_)
            | RenderError::MissingWatchedTransform(_)
            | RenderError::UnsupportedDevice(_))
    }

    pub fn is_resource_failure(&self) -> bool {
        matches!(self, RenderError::ResourceAllocation { .. } | RenderError::Presentation(_))
    }
}

pub type Result<T> = std::result::Result<T, RenderError>;
