#![allow(clippy::useless_vec)]

mod utils;

use gradix_core::{dtype::DType, error::Result};
use utils::{assert_close, setup_grad_tensor_with_shape, setup_tensor_with_shape, tolerance_for};

mod test_functions {
    use super::*;

    const LHS_2X3: [f32; 6] = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
    const RHS_2X3: [f32; 6] = [6.0, 5.0, 4.0, 3.0, 2.0, 1.0];

    pub fn add_test(dtype: DType) -> Result<()> {
        let a = setup_tensor_with_shape(LHS_2X3.to_vec(), dtype, &[2, 3])?;
        let b = setup_tensor_with_shape(RHS_2X3.to_vec(), dtype, &[2, 3])?;
        let c = a.add(&b)?;

        assert_eq!(c.shape(), &[2, 3]);
        assert_close(&c.to_flatten_vec::<f32>()?, &[7.0; 6], tolerance_for(dtype));

        Ok(())
    }

    pub fn sub_test(dtype: DType) -> Result<()> {
        let a = setup_tensor_with_shape(LHS_2X3.to_vec(), dtype, &[2, 3])?;
        let b = setup_tensor_with_shape(RHS_2X3.to_vec(), dtype, &[2, 3])?;
        let c = a.sub(&b)?;

        assert_close(&c.to_flatten_vec::<f32>()?, &[-5.0, -3.0, -1.0, 1.0, 3.0, 5.0], tolerance_for(dtype));

        Ok(())
    }

    pub fn mul_test(dtype: DType) -> Result<()> {
        let a = setup_tensor_with_shape(LHS_2X3.to_vec(), dtype, &[2, 3])?;
        let b = setup_tensor_with_shape(RHS_2X3.to_vec(), dtype, &[2, 3])?;
        let c = a.mul(&b)?;

        assert_close(&c.to_flatten_vec::<f32>()?, &[6.0, 10.0, 12.0, 12.0, 10.0, 6.0], tolerance_for(dtype));

        Ok(())
    }

    pub fn div_test(dtype: DType) -> Result<()> {
        let a = setup_tensor_with_shape(vec![2.0, 4.0, 6.0, 8.0], dtype, &[2, 2])?;
        let b = setup_tensor_with_shape(vec![2.0, 2.0, 2.0, 2.0], dtype, &[2, 2])?;
        let c = a.div(&b)?;

        assert_close(&c.to_flatten_vec::<f32>()?, &[1.0, 2.0, 3.0, 4.0], tolerance_for(dtype));

        Ok(())
    }

    pub fn add_broadcast_test(dtype: DType) -> Result<()> {
        let a = setup_tensor_with_shape(LHS_2X3.to_vec(), dtype, &[2, 3])?;
        let b = setup_tensor_with_shape(vec![10.0, 20.0, 30.0], dtype, &[3])?;
        let c = a.add(&b)?;

        assert_eq!(c.shape(), &[2, 3]);
        assert_close(
            &c.to_flatten_vec::<f32>()?,
            &[11.0, 22.0, 33.0, 14.0, 25.0, 36.0],
            tolerance_for(dtype),
        );

        Ok(())
    }

    pub fn mul_broadcast_scalar_test(dtype: DType) -> Result<()> {
        let a = setup_tensor_with_shape(LHS_2X3.to_vec(), dtype, &[2, 3])?;
        let s = setup_tensor_with_shape(vec![2.0], dtype, &[])?;
        let c = a.mul(&s)?;

        assert_eq!(c.shape(), &[2, 3]);
        assert_close(&c.to_flatten_vec::<f32>()?, &[2.0, 4.0, 6.0, 8.0, 10.0, 12.0], tolerance_for(dtype));

        Ok(())
    }
}

test_ops!([add, sub, mul, div, add_broadcast, mul_broadcast_scalar]);

#[test]
fn add_broadcast_backward_reduces_to_operand_shapes() -> Result<()> {
    let a = setup_grad_tensor_with_shape(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], DType::F32, &[2, 3])?;
    let b = setup_grad_tensor_with_shape(vec![10.0, 20.0, 30.0], DType::F32, &[3])?;
    let c = a.add(&b)?;

    let seed = gradix_tensor::Tensor::ones_like(&c)?;
    c.backward_with_grad(&seed)?;

    let a_grad = a.grad()?.unwrap();
    assert_eq!(a_grad.shape(), &[2, 3]);
    assert_close(&a_grad.to_flatten_vec::<f32>()?, &[1.0; 6], 1e-6);

    let b_grad = b.grad()?.unwrap();
    assert_eq!(b_grad.shape(), &[3]);
    assert_close(&b_grad.to_flatten_vec::<f32>()?, &[2.0, 2.0, 2.0], 1e-6);

    Ok(())
}

#[test]
fn mul_backward_uses_other_operand() -> Result<()> {
    let a = setup_grad_tensor_with_shape(vec![1.0, 2.0, 3.0], DType::F32, &[3])?;
    let b = setup_grad_tensor_with_shape(vec![4.0, 5.0, 6.0], DType::F32, &[3])?;
    let c = a.mul(&b)?.sum_all()?;
    c.backward()?;

    assert_close(&a.grad()?.unwrap().to_flatten_vec::<f32>()?, &[4.0, 5.0, 6.0], 1e-6);
    assert_close(&b.grad()?.unwrap().to_flatten_vec::<f32>()?, &[1.0, 2.0, 3.0], 1e-6);

    Ok(())
}

#[test]
fn div_backward_gradients() -> Result<()> {
    let a = setup_grad_tensor_with_shape(vec![2.0, 8.0], DType::F32, &[2])?;
    let b = setup_grad_tensor_with_shape(vec![2.0, 4.0], DType::F32, &[2])?;
    let c = a.div(&b)?.sum_all()?;
    c.backward()?;

    // d(a/b)/da = 1/b, d(a/b)/db = -a/b^2
    assert_close(&a.grad()?.unwrap().to_flatten_vec::<f32>()?, &[0.5, 0.25], 1e-6);
    assert_close(&b.grad()?.unwrap().to_flatten_vec::<f32>()?, &[-0.5, -0.5], 1e-6);

    Ok(())
}

#[test]
fn shared_operand_accumulates_both_paths() -> Result<()> {
    let a = setup_grad_tensor_with_shape(vec![3.0], DType::F32, &[])?;
    let c = a.mul(&a)?;
    c.backward()?;

    // d(a*a)/da = 2a
    assert_close(&a.grad()?.unwrap().to_flatten_vec::<f32>()?, &[6.0], 1e-6);

    Ok(())
}

#[test]
fn incompatible_shapes_fail() -> Result<()> {
    let a = setup_tensor_with_shape(vec![1.0, 2.0, 3.0], DType::F32, &[3])?;
    let b = setup_tensor_with_shape(vec![1.0, 2.0], DType::F32, &[2])?;

    assert!(a.add(&b).is_err());

    Ok(())
}

#[test]
fn operator_sugar_matches_methods() -> Result<()> {
    let a = setup_tensor_with_shape(vec![1.0, 2.0], DType::F32, &[2])?;
    let b = setup_tensor_with_shape(vec![3.0, 4.0], DType::F32, &[2])?;

    let sum = &a + &b;
    assert_close(&sum.to_flatten_vec::<f32>()?, &[4.0, 6.0], 1e-6);

    let diff = &a - &b;
    assert_close(&diff.to_flatten_vec::<f32>()?, &[-2.0, -2.0], 1e-6);

    let neg = -&a;
    assert_close(&neg.to_flatten_vec::<f32>()?, &[-1.0, -2.0], 1e-6);

    Ok(())
}

#[test]
fn mixed_dtype_promotes() -> Result<()> {
    let a = setup_tensor_with_shape(vec![1.0, 2.0], DType::F32, &[2])?;
    let b = setup_tensor_with_shape(vec![0.5, 0.5], DType::F64, &[2])?;
    let c = a.add(&b)?;

    assert_eq!(c.dtype(), DType::F64);
    assert_close(&c.to_flatten_vec::<f32>()?, &[1.5, 2.5], 1e-6);

    Ok(())
}
