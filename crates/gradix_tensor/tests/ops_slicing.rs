mod utils;

use gradix_core::{dtype::DType, error::Error, error::Result};
use utils::{assert_close, setup_grad_tensor_with_shape, setup_tensor_with_shape};

#[test]
fn slice_takes_a_window() -> Result<()> {
    let x = setup_tensor_with_shape(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], DType::F32, &[2, 3])?;
    let y = x.slice(&[0, 1], &[1, 2])?;

    assert_eq!(y.shape(), &[1, 2]);
    assert_close(&y.to_flatten_vec::<f32>()?, &[2.0, 3.0], 1e-6);

    Ok(())
}

#[test]
fn slice_with_negative_length_drops_the_axis() -> Result<()> {
    let x = setup_tensor_with_shape(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], DType::F32, &[2, 3])?;
    let y = x.slice(&[1, 0], &[-1, 3])?;

    assert_eq!(y.shape(), &[3]);
    assert_close(&y.to_flatten_vec::<f32>()?, &[4.0, 5.0, 6.0], 1e-6);

    Ok(())
}

#[test]
fn slice_of_every_axis_dropped_yields_scalar() -> Result<()> {
    let x = setup_tensor_with_shape(vec![1.0, 2.0, 3.0, 4.0], DType::F32, &[2, 2])?;
    let y = x.slice(&[1, 0], &[-1, -1])?;

    assert_eq!(y.shape(), &[] as &[usize]);
    assert_close(&y.to_flatten_vec::<f32>()?, &[3.0], 1e-6);

    Ok(())
}

#[test]
fn slice_rejects_wrong_span_count() -> Result<()> {
    let x = setup_tensor_with_shape(vec![1.0, 2.0, 3.0, 4.0], DType::F32, &[2, 2])?;

    assert!(matches!(x.slice(&[0], &[1]), Err(Error::InvalidShape { .. })));

    Ok(())
}

#[test]
fn slice_rejects_out_of_bounds_window() -> Result<()> {
    let x = setup_tensor_with_shape(vec![1.0, 2.0, 3.0, 4.0], DType::F32, &[2, 2])?;

    assert!(x.slice(&[0, 1], &[1, 2]).is_err());
    assert!(x.slice(&[2, 0], &[-1, 2]).is_err());

    Ok(())
}

#[test]
fn slice_rejects_invalid_length() -> Result<()> {
    let x = setup_tensor_with_shape(vec![1.0, 2.0, 3.0, 4.0], DType::F32, &[2, 2])?;

    assert!(matches!(x.slice(&[0, 0], &[-2, 2]), Err(Error::InvalidArgument(_))));

    Ok(())
}

#[test]
fn slice_backward_scatters_into_the_window() -> Result<()> {
    let x = setup_grad_tensor_with_shape(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], DType::F32, &[2, 3])?;
    let y = x.slice(&[0, 1], &[1, 2])?.sum_all()?;
    y.backward()?;

    let grad = x.grad()?.unwrap();
    assert_eq!(grad.shape(), &[2, 3]);
    assert_close(&grad.to_flatten_vec::<f32>()?, &[0.0, 1.0, 1.0, 0.0, 0.0, 0.0], 1e-6);

    Ok(())
}

#[test]
fn slice_backward_through_dropped_axis() -> Result<()> {
    let x = setup_grad_tensor_with_shape(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], DType::F32, &[2, 3])?;
    let y = x.slice(&[1, 0], &[-1, 3])?.sum_all()?;
    y.backward()?;

    let grad = x.grad()?.unwrap();
    assert_eq!(grad.shape(), &[2, 3]);
    assert_close(&grad.to_flatten_vec::<f32>()?, &[0.0, 0.0, 0.0, 1.0, 1.0, 1.0], 1e-6);

    Ok(())
}

#[test]
fn slice_gradients_accumulate_over_overlapping_windows() -> Result<()> {
    let x = setup_grad_tensor_with_shape(vec![1.0, 2.0, 3.0, 4.0], DType::F32, &[4])?;
    let first = x.slice(&[0], &[3])?.sum_all()?;
    let second = x.slice(&[1], &[3])?.sum_all()?;
    let loss = first.add(&second)?;
    loss.backward()?;

    let grad = x.grad()?.unwrap();
    assert_close(&grad.to_flatten_vec::<f32>()?, &[1.0, 2.0, 2.0, 1.0], 1e-6);

    Ok(())
}
