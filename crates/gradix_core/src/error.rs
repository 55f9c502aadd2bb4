use std::fmt;

#[derive(Debug)]
pub enum Error {
    InvalidArgument(String),
    IncompatibleShape(String),
    //
    BufferShared,
    GradLocked,
    InvalidShape {
        message: String,
    },
    ShapeMismatch {
        expected: usize,
        got: usize,
        msg: String,
    },
    DimensionOutOfBounds {
        dim: i32,
        ndim: usize,
    },
    IndexOutOfBounds {
        index: usize,
        size: usize,
    },
    // autograd
    RequiresGradNotSet,
    GraphConsumed,
    // serde
    #[cfg(feature = "serde")]
    SerializationError(String),
    #[cfg(feature = "serde")]
    DeserializationError(String),
    //
    External {
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            Self::IncompatibleShape(msg) => write!(f, "Incompatible shape: {}", msg),

            Self::BufferShared => write!(f, "Buffer is shared"),
            Self::GradLocked => write!(f, "Grad is locked"),
            Self::InvalidShape { message } => {
                write!(f, "Invalid shape: {}", message)
            }
            Self::ShapeMismatch { expected, got, msg } => {
                write!(f, "Shape mismatch ({}): expected {}, got {}", msg, expected, got)
            }
            Self::DimensionOutOfBounds { dim, ndim } => {
                write!(
                    f,
                    "Dimension out of bounds: dimension {} is not valid for tensor with {} dimensions",
                    dim, ndim
                )
            }
            Self::IndexOutOfBounds { index, size } => {
                write!(f, "Index out of bounds: index {} is out of bounds for tensor with size {}", index, size)
            }
            Self::RequiresGradNotSet => {
                write!(f, "Tensor does not require grad")
            }
            Self::GraphConsumed => {
                write!(f, "Backward graph has already been consumed; retain it to run backward again")
            }
            #[cfg(feature = "serde")]
            Self::SerializationError(msg) => {
                write!(f, "Serialization error: {}", msg)
            }
            #[cfg(feature = "serde")]
            Self::DeserializationError(msg) => {
                write!(f, "Deserialization error: {}", msg)
            }
            Self::External { message } => {
                write!(f, "External error: {}", message)
            }
        }
    }
}

impl std::error::Error for Error {}
