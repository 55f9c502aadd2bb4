mod utils;

use gradix_core::{dtype::DType, error::Error, error::Result};
use gradix_tensor::Tensor;
use utils::{assert_close, setup_grad_tensor_with_shape, setup_tensor_with_shape};

#[test]
fn sum_along_first_dim() -> Result<()> {
    let x = setup_tensor_with_shape(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], DType::F32, &[2, 3])?;
    let y = x.sum(0)?;

    assert_eq!(y.shape(), &[3]);
    assert_close(&y.to_flatten_vec::<f32>()?, &[5.0, 7.0, 9.0], 1e-5);

    Ok(())
}

#[test]
fn sum_along_last_dim() -> Result<()> {
    let x = setup_tensor_with_shape(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], DType::F32, &[2, 3])?;
    let y = x.sum(1)?;

    assert_eq!(y.shape(), &[2]);
    assert_close(&y.to_flatten_vec::<f32>()?, &[6.0, 15.0], 1e-5);

    Ok(())
}

#[test]
fn sum_accepts_negative_dim() -> Result<()> {
    let x = setup_tensor_with_shape(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], DType::F32, &[2, 3])?;
    let y = x.sum(-1)?;

    assert_eq!(y.shape(), &[2]);
    assert_close(&y.to_flatten_vec::<f32>()?, &[6.0, 15.0], 1e-5);

    Ok(())
}

#[test]
fn sum_rejects_out_of_bounds_dim() -> Result<()> {
    let x = Tensor::ones(&[2, 3])?;

    assert!(matches!(x.sum(2), Err(Error::DimensionOutOfBounds { .. })));
    assert!(matches!(x.sum(-3), Err(Error::DimensionOutOfBounds { .. })));

    Ok(())
}

#[test]
fn sum_all_collapses_to_scalar() -> Result<()> {
    let x = setup_tensor_with_shape(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], DType::F32, &[2, 3])?;
    let y = x.sum_all()?;

    assert_eq!(y.shape(), &[] as &[usize]);
    assert_close(&y.to_flatten_vec::<f32>()?, &[21.0], 1e-5);

    Ok(())
}

#[test]
fn sum_backward_spreads_gradient() -> Result<()> {
    let x = setup_grad_tensor_with_shape(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], DType::F32, &[2, 3])?;
    let y = x.sum(0)?;

    let seed = setup_tensor_with_shape(vec![1.0, 2.0, 3.0], DType::F32, &[3])?;
    y.backward_with_grad(&seed)?;

    let grad = x.grad()?.unwrap();
    assert_eq!(grad.shape(), &[2, 3]);
    assert_close(&grad.to_flatten_vec::<f32>()?, &[1.0, 2.0, 3.0, 1.0, 2.0, 3.0], 1e-6);

    Ok(())
}

#[test]
fn sum_all_backward_is_all_ones() -> Result<()> {
    let x = setup_grad_tensor_with_shape(vec![1.0, 2.0, 3.0, 4.0], DType::F32, &[2, 2])?;
    let y = x.sum_all()?;
    y.backward()?;

    assert_close(&x.grad()?.unwrap().to_flatten_vec::<f32>()?, &[1.0; 4], 1e-6);

    Ok(())
}

#[test]
fn sum_to_shape_reduces_rows() -> Result<()> {
    let x = setup_tensor_with_shape(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], DType::F32, &[2, 3])?;
    let y = x.sum_to_shape(&[1, 3])?;

    assert_eq!(y.shape(), &[1, 3]);
    assert_close(&y.to_flatten_vec::<f32>()?, &[5.0, 7.0, 9.0], 1e-5);

    Ok(())
}

#[test]
fn sum_to_shape_drops_leading_dims() -> Result<()> {
    let x = setup_tensor_with_shape(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], DType::F32, &[2, 3])?;
    let y = x.sum_to_shape(&[3])?;

    assert_eq!(y.shape(), &[3]);
    assert_close(&y.to_flatten_vec::<f32>()?, &[5.0, 7.0, 9.0], 1e-5);

    Ok(())
}

#[test]
fn sum_to_shape_identity_returns_same_values() -> Result<()> {
    let x = setup_tensor_with_shape(vec![1.0, 2.0, 3.0, 4.0], DType::F32, &[2, 2])?;
    let y = x.sum_to_shape(&[2, 2])?;

    assert_close(&y.to_flatten_vec::<f32>()?, &[1.0, 2.0, 3.0, 4.0], 1e-6);

    Ok(())
}

#[test]
fn sum_to_shape_rejects_incompatible_target() -> Result<()> {
    let x = Tensor::ones(&[2, 3])?;

    assert!(x.sum_to_shape(&[2, 2]).is_err());

    Ok(())
}

#[test]
fn sum_to_shape_backward_broadcasts_gradient() -> Result<()> {
    let x = setup_grad_tensor_with_shape(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], DType::F32, &[2, 3])?;
    let y = x.sum_to_shape(&[3])?;

    let seed = setup_tensor_with_shape(vec![1.0, 2.0, 3.0], DType::F32, &[3])?;
    y.backward_with_grad(&seed)?;

    let grad = x.grad()?.unwrap();
    assert_eq!(grad.shape(), &[2, 3]);
    assert_close(&grad.to_flatten_vec::<f32>()?, &[1.0, 2.0, 3.0, 1.0, 2.0, 3.0], 1e-6);

    Ok(())
}

#[test]
fn sum_over_transposed_view() -> Result<()> {
    let x = setup_tensor_with_shape(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], DType::F32, &[2, 3])?;
    let t = x.transpose(0, 1)?;

    assert_close(&t.sum(0)?.to_flatten_vec::<f32>()?, &[6.0, 15.0], 1e-5);
    assert_close(&t.sum(1)?.to_flatten_vec::<f32>()?, &[5.0, 7.0, 9.0], 1e-5);
    assert_close(&t.sum_all()?.to_flatten_vec::<f32>()?, &[21.0], 1e-5);

    Ok(())
}

#[test]
fn sum_of_3d_middle_dim() -> Result<()> {
    let data: Vec<f32> = (1..=12).map(|i| i as f32).collect();
    let x = setup_tensor_with_shape(data, DType::F32, &[2, 2, 3])?;
    let y = x.sum(1)?;

    assert_eq!(y.shape(), &[2, 3]);
    assert_close(&y.to_flatten_vec::<f32>()?, &[5.0, 7.0, 9.0, 17.0, 19.0, 21.0], 1e-5);

    Ok(())
}
