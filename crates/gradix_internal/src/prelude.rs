pub use crate::core::{
    device::{get_default_device, set_default_device, Device},
    dtype::*,
    error::{Error, Result},
    scalar::Scalar,
};
pub use crate::tensor::{BackwardConfig, Op, Tensor, TensorNode, ValueRegistry};
