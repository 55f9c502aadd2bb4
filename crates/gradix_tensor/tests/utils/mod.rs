#![allow(dead_code)]

use gradix_core::{
    device::{set_default_device, Device},
    dtype::DType,
    error::Result,
};
use gradix_tensor::Tensor;

pub fn setup_device() {
    set_default_device(Device::CPU);
}

pub fn setup_tensor(data: Vec<f32>, dtype: DType) -> Result<Tensor> {
    setup_device();
    Tensor::new_with_spec(data, Device::CPU, dtype)
}

pub fn setup_tensor_with_shape(data: Vec<f32>, dtype: DType, shape: &[usize]) -> Result<Tensor> {
    let mut tensor = setup_tensor(data, dtype)?;
    tensor.with_shape(shape)?;
    Ok(tensor)
}

pub fn setup_grad_tensor(data: Vec<f32>, dtype: DType) -> Result<Tensor> {
    let mut tensor = setup_tensor(data, dtype)?;
    tensor.with_grad()?;
    Ok(tensor)
}

pub fn setup_grad_tensor_with_shape(data: Vec<f32>, dtype: DType, shape: &[usize]) -> Result<Tensor> {
    let mut tensor = setup_tensor_with_shape(data, dtype, shape)?;
    tensor.with_grad()?;
    Ok(tensor)
}

pub fn assert_close(actual: &[f32], expected: &[f32], tolerance: f32) {
    assert_eq!(actual.len(), expected.len(), "length mismatch: {:?} vs {:?}", actual, expected);
    for (i, (a, e)) in actual.iter().zip(expected.iter()).enumerate() {
        assert!((a - e).abs() < tolerance, "index {}: expected {}, got {}", i, e, a);
    }
}

/// Half formats lose precision, so comparisons widen their tolerance.
pub fn tolerance_for(dtype: DType) -> f32 {
    match dtype {
        DType::BF16 => 0.1,
        DType::F16 => 0.05,
        DType::F32 | DType::F64 => 1e-4,
    }
}

#[macro_export]
macro_rules! test_ops {
    ([$($op:ident),* $(,)?]) => {
        $(
            mod $op {
                use super::*;
                use paste::paste;

                paste! {
                    #[test]
                    fn bf16() -> Result<()> {
                        test_functions::[<$op _test>](DType::BF16)
                    }

                    #[test]
                    fn f16() -> Result<()> {
                        test_functions::[<$op _test>](DType::F16)
                    }

                    #[test]
                    fn f32() -> Result<()> {
                        test_functions::[<$op _test>](DType::F32)
                    }

                    #[test]
                    fn f64() -> Result<()> {
                        test_functions::[<$op _test>](DType::F64)
                    }
                }
            }
        )*
    };
}
