use gradix_core::{dtype::DType, error::Result};
use half::{bf16, f16};

/// Conversion from host containers into flat tensor storage.
pub trait TensorAdapter: Sized {
    type Elem: Clone;

    fn to_flat_vec(self) -> Result<Vec<Self::Elem>>;
    fn to_shape(&self) -> Vec<usize>;
    fn dtype(&self) -> DType;
}

macro_rules! impl_tensor_adapter {
    ($t:ty, $dtype:expr) => {
        // Scalar (item tensor)
        impl TensorAdapter for $t {
            type Elem = $t;

            fn to_flat_vec(self) -> Result<Vec<$t>> {
                Ok(vec![self])
            }
            fn to_shape(&self) -> Vec<usize> {
                vec![]
            }
            fn dtype(&self) -> DType {
                $dtype
            }
        }

        // 1D vector
        impl TensorAdapter for Vec<$t> {
            type Elem = $t;

            fn to_flat_vec(self) -> Result<Vec<$t>> {
                Ok(self)
            }
            fn to_shape(&self) -> Vec<usize> {
                vec![self.len()]
            }
            fn dtype(&self) -> DType {
                $dtype
            }
        }

        // 2D vector
        impl TensorAdapter for Vec<Vec<$t>> {
            type Elem = $t;

            fn to_flat_vec(self) -> Result<Vec<$t>> {
                let mut flat = Vec::new();
                for row in self {
                    flat.extend(row);
                }
                Ok(flat)
            }
            fn to_shape(&self) -> Vec<usize> {
                if self.is_empty() {
                    vec![0, 0]
                } else {
                    vec![self.len(), self[0].len()]
                }
            }
            fn dtype(&self) -> DType {
                $dtype
            }
        }

        // 3D vector
        impl TensorAdapter for Vec<Vec<Vec<$t>>> {
            type Elem = $t;

            fn to_flat_vec(self) -> Result<Vec<$t>> {
                let mut flat = Vec::new();
                for matrix in self {
                    for row in matrix {
                        flat.extend(row);
                    }
                }
                Ok(flat)
            }
            fn to_shape(&self) -> Vec<usize> {
                if self.is_empty() {
                    vec![0, 0, 0]
                } else {
                    vec![self.len(), self[0].len(), self[0][0].len()]
                }
            }
            fn dtype(&self) -> DType {
                $dtype
            }
        }

        // 4D vector
        impl TensorAdapter for Vec<Vec<Vec<Vec<$t>>>> {
            type Elem = $t;

            fn to_flat_vec(self) -> Result<Vec<$t>> {
                let mut flat = Vec::new();
                for block in self {
                    for matrix in block {
                        for row in matrix {
                            flat.extend(row);
                        }
                    }
                }
                Ok(flat)
            }
            fn to_shape(&self) -> Vec<usize> {
                if self.is_empty() {
                    vec![0, 0, 0, 0]
                } else {
                    vec![self.len(), self[0].len(), self[0][0].len(), self[0][0][0].len()]
                }
            }
            fn dtype(&self) -> DType {
                $dtype
            }
        }

        // Borrowed slice
        impl TensorAdapter for &[$t] {
            type Elem = $t;

            fn to_flat_vec(self) -> Result<Vec<$t>> {
                Ok(self.to_vec())
            }
            fn to_shape(&self) -> Vec<usize> {
                vec![self.len()]
            }
            fn dtype(&self) -> DType {
                $dtype
            }
        }
    };
}

impl_tensor_adapter!(bf16, DType::BF16);
impl_tensor_adapter!(f16, DType::F16);
impl_tensor_adapter!(f32, DType::F32);
impl_tensor_adapter!(f64, DType::F64);
