#![cfg(feature = "serde")]

mod utils;

use gradix_core::{dtype::DType, error::Result};
use gradix_tensor::Tensor;
use utils::{assert_close, setup_grad_tensor_with_shape, setup_tensor_with_shape};

#[test]
fn binary_round_trip_preserves_values() -> Result<()> {
    let x = setup_tensor_with_shape(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], DType::F32, &[2, 3])?;

    let bytes = x.to_bytes()?;
    let restored = Tensor::from_bytes(&bytes)?;

    assert_eq!(restored.shape(), &[2, 3]);
    assert_eq!(restored.dtype(), DType::F32);
    assert_close(&restored.to_flatten_vec::<f32>()?, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 1e-6);

    Ok(())
}

#[test]
fn json_round_trip_preserves_values() -> Result<()> {
    let x = setup_tensor_with_shape(vec![0.5, -1.5, 2.25], DType::F64, &[3])?;

    let json = x.to_json()?;
    let restored = Tensor::from_json(&json)?;

    assert_eq!(restored.shape(), &[3]);
    assert_eq!(restored.dtype(), DType::F64);
    assert_close(&restored.to_flatten_vec::<f32>()?, &[0.5, -1.5, 2.25], 1e-6);

    Ok(())
}

#[test]
fn round_trip_preserves_requires_grad_and_label() -> Result<()> {
    let mut x = setup_grad_tensor_with_shape(vec![1.0, 2.0], DType::F32, &[2])?;
    x.with_label("weight");

    let restored = Tensor::from_bytes(&x.to_bytes()?)?;

    assert!(restored.requires_grad());
    assert_eq!(restored.label(), Some("weight"));

    Ok(())
}

#[test]
fn round_trip_drops_runtime_state() -> Result<()> {
    let x = setup_grad_tensor_with_shape(vec![2.0], DType::F32, &[])?;
    let y = x.mul(&x)?;
    y.backward()?;

    let restored = Tensor::from_bytes(&x.to_bytes()?)?;

    assert_ne!(restored.id(), x.id());
    assert!(restored.node().is_none());
    assert!(restored.grad()?.is_none());
    assert!(!restored.is_native_gradient());

    Ok(())
}

#[test]
fn round_trip_of_transposed_view_keeps_element_order() -> Result<()> {
    let x = setup_tensor_with_shape(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], DType::F32, &[2, 3])?;
    let t = x.transpose(0, 1)?;

    let restored = Tensor::from_bytes(&t.to_bytes()?)?;

    assert_eq!(restored.shape(), &[3, 2]);
    assert_close(&restored.to_flatten_vec::<f32>()?, &t.to_flatten_vec::<f32>()?, 1e-6);

    Ok(())
}

#[test]
fn half_precision_round_trip() -> Result<()> {
    let x = setup_tensor_with_shape(vec![0.5, 1.5, -2.0], DType::BF16, &[3])?;

    let restored = Tensor::from_bytes(&x.to_bytes()?)?;

    assert_eq!(restored.dtype(), DType::BF16);
    assert_close(&restored.to_flatten_vec::<f32>()?, &[0.5, 1.5, -2.0], 0.01);

    Ok(())
}
