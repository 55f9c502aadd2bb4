#![allow(clippy::useless_vec)]

mod utils;

use gradix_core::{dtype::DType, error::Result};
use utils::{assert_close, setup_grad_tensor_with_shape, setup_tensor_with_shape, tolerance_for};

mod test_functions {
    use super::*;

    const TEST_DATA: [f32; 4] = [-2.0, -0.5, 1.0, 3.0];

    pub fn neg_test(dtype: DType) -> Result<()> {
        let x = setup_tensor_with_shape(TEST_DATA.to_vec(), dtype, &[4])?;
        let y = x.neg()?;

        assert_close(&y.to_flatten_vec::<f32>()?, &[2.0, 0.5, -1.0, -3.0], tolerance_for(dtype));

        Ok(())
    }

    pub fn square_test(dtype: DType) -> Result<()> {
        let x = setup_tensor_with_shape(TEST_DATA.to_vec(), dtype, &[4])?;
        let y = x.square()?;

        assert_close(&y.to_flatten_vec::<f32>()?, &[4.0, 0.25, 1.0, 9.0], tolerance_for(dtype));

        Ok(())
    }

    pub fn relu_test(dtype: DType) -> Result<()> {
        let x = setup_tensor_with_shape(TEST_DATA.to_vec(), dtype, &[4])?;
        let y = x.relu()?;

        assert_close(&y.to_flatten_vec::<f32>()?, &[0.0, 0.0, 1.0, 3.0], tolerance_for(dtype));

        Ok(())
    }

    pub fn step_test(dtype: DType) -> Result<()> {
        let x = setup_tensor_with_shape(TEST_DATA.to_vec(), dtype, &[4])?;
        let y = x.step()?;

        assert_close(&y.to_flatten_vec::<f32>()?, &[0.0, 0.0, 1.0, 1.0], tolerance_for(dtype));
        assert!(y.node().is_none());

        Ok(())
    }

    pub fn add_scalar_test(dtype: DType) -> Result<()> {
        let x = setup_tensor_with_shape(TEST_DATA.to_vec(), dtype, &[4])?;
        let y = x.add_scalar(1.5f32)?;

        assert_close(&y.to_flatten_vec::<f32>()?, &[-0.5, 1.0, 2.5, 4.5], tolerance_for(dtype));

        Ok(())
    }

    pub fn mul_scalar_test(dtype: DType) -> Result<()> {
        let x = setup_tensor_with_shape(TEST_DATA.to_vec(), dtype, &[4])?;
        let y = x.mul_scalar(2.0f32)?;

        assert_close(&y.to_flatten_vec::<f32>()?, &[-4.0, -1.0, 2.0, 6.0], tolerance_for(dtype));

        Ok(())
    }

    pub fn div_scalar_test(dtype: DType) -> Result<()> {
        let x = setup_tensor_with_shape(TEST_DATA.to_vec(), dtype, &[4])?;
        let y = x.div_scalar(2.0f32)?;

        assert_close(&y.to_flatten_vec::<f32>()?, &[-1.0, -0.25, 0.5, 1.5], tolerance_for(dtype));

        Ok(())
    }

    pub fn sub_scalar_test(dtype: DType) -> Result<()> {
        let x = setup_tensor_with_shape(TEST_DATA.to_vec(), dtype, &[4])?;
        let y = x.sub_scalar(1.0f32)?;

        assert_close(&y.to_flatten_vec::<f32>()?, &[-3.0, -1.5, 0.0, 2.0], tolerance_for(dtype));

        Ok(())
    }
}

test_ops!([neg, square, relu, step, add_scalar, sub_scalar, mul_scalar, div_scalar]);

#[test]
fn neg_backward() -> Result<()> {
    let x = setup_grad_tensor_with_shape(vec![1.0, -2.0], DType::F32, &[2])?;
    let y = x.neg()?.sum_all()?;
    y.backward()?;

    assert_close(&x.grad()?.unwrap().to_flatten_vec::<f32>()?, &[-1.0, -1.0], 1e-6);

    Ok(())
}

#[test]
fn square_backward() -> Result<()> {
    let x = setup_grad_tensor_with_shape(vec![2.0, -3.0], DType::F32, &[2])?;
    let y = x.square()?.sum_all()?;
    y.backward()?;

    assert_close(&x.grad()?.unwrap().to_flatten_vec::<f32>()?, &[4.0, -6.0], 1e-6);

    Ok(())
}

#[test]
fn scalar_op_backward_scales_gradient() -> Result<()> {
    let x = setup_grad_tensor_with_shape(vec![1.0, 2.0], DType::F32, &[2])?;
    let y = x.mul_scalar(3.0f32)?.add_scalar(10.0f32)?.sum_all()?;
    y.backward()?;

    assert_close(&x.grad()?.unwrap().to_flatten_vec::<f32>()?, &[3.0, 3.0], 1e-6);

    Ok(())
}

#[test]
fn div_scalar_backward() -> Result<()> {
    let x = setup_grad_tensor_with_shape(vec![4.0, 8.0], DType::F32, &[2])?;
    let y = x.div_scalar(4.0f32)?.sum_all()?;
    y.backward()?;

    assert_close(&x.grad()?.unwrap().to_flatten_vec::<f32>()?, &[0.25, 0.25], 1e-6);

    Ok(())
}
