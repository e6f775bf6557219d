use std::{fmt, io};

#[derive(Debug)]
pub enum ViewerError {
    EmptyPoses,
    InvalidQuaternion { index: usize },
    NonFiniteVector { what: &'static str, index: usize },
    InvalidPoseMatrix { camera: usize },
    InvalidRotationMatrix { link: usize },
    DegenerateLink { link: usize },
    MeshTooLarge { vertices: usize },
    ParsePose { line: usize, reason: String },
    IoError(io::Error),
}

impl ViewerError {
    /// True for errors caused by malformed trajectory data, false for I/O,
    /// parsing failures at the boundary and index overflow.
    pub fn is_invariant_violation(&self) -> bool {
        !matches!(
            self,
            ViewerError::ParsePose { .. }
                | ViewerError::IoError(_)
                | ViewerError::MeshTooLarge { .. }
        )
    }
}

impl fmt::Display for ViewerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewerError::EmptyPoses => {
                write!(f, "The camera poses array is empty.")
            }
            ViewerError::InvalidQuaternion { index } => {
                write!(
                    f,
                    "Quaternion of camera {} has a zero or non-finite norm.",
                    index
                )
            }
            ViewerError::NonFiniteVector { what, index } => {
                write!(f, "Non-finite {} at index {}.", what, index)
            }
            ViewerError::InvalidPoseMatrix { camera } => {
                write!(f, "Camera {} does not have a valid pose matrix.", camera)
            }
            ViewerError::InvalidRotationMatrix { link } => {
                write!(
                    f,
                    "Link {} does not have a valid rotation matrix.",
                    link
                )
            }
            ViewerError::DegenerateLink { link } => {
                write!(
                    f,
                    "Link {} connects two cameras with (nearly) identical centers.",
                    link
                )
            }
            ViewerError::MeshTooLarge { vertices } => {
                write!(
                    f,
                    "Mesh needs {} vertices, more than 32-bit face indices can address.",
                    vertices
                )
            }
            ViewerError::ParsePose { line, reason } => {
                write!(f, "Failed to parse pose at line {}: {}", line, reason)
            }
            ViewerError::IoError(e) => {
                write!(f, "An I/O error occurred: {}", e)
            }
        }
    }
}

impl std::error::Error for ViewerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ViewerError::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for ViewerError {
    fn from(e: io::Error) -> Self {
        ViewerError::IoError(e)
    }
}
