mod utils;

use gradix_core::{device::Device, dtype::DType, error::Result};
use gradix_tensor::Tensor;
use utils::{assert_close, setup_device};

#[test]
fn new_from_scalar() -> Result<()> {
    setup_device();
    let x = Tensor::new(3.5f32)?;

    assert_eq!(x.shape(), &[] as &[usize]);
    assert_eq!(x.size(), 1);
    assert_close(&x.to_flatten_vec::<f32>()?, &[3.5], 1e-6);

    Ok(())
}

#[test]
fn new_from_nested_vec() -> Result<()> {
    setup_device();
    let x = Tensor::new(vec![vec![1.0f32, 2.0], vec![3.0, 4.0]])?;

    assert_eq!(x.shape(), &[2, 2]);
    assert_close(&x.to_flatten_vec::<f32>()?, &[1.0, 2.0, 3.0, 4.0], 1e-6);

    Ok(())
}

#[test]
fn new_with_spec_converts_dtype() -> Result<()> {
    let x = Tensor::new_with_spec(vec![1.0f32, 2.0, 3.0], Device::CPU, DType::F64)?;

    assert_eq!(x.dtype(), DType::F64);
    assert_close(&x.to_flatten_vec::<f32>()?, &[1.0, 2.0, 3.0], 1e-6);

    let y = Tensor::new_with_spec(vec![0.5f32, 1.5], Device::CPU, DType::BF16)?;
    assert_eq!(y.dtype(), DType::BF16);
    assert_close(&y.to_flatten_vec::<f32>()?, &[0.5, 1.5], 0.01);

    Ok(())
}

#[test]
fn zeros_and_ones() -> Result<()> {
    setup_device();
    let z = Tensor::zeros(&[2, 3])?;
    assert_eq!(z.shape(), &[2, 3]);
    assert_close(&z.to_flatten_vec::<f32>()?, &[0.0; 6], 1e-6);

    let o = Tensor::ones(&[3])?;
    assert_close(&o.to_flatten_vec::<f32>()?, &[1.0; 3], 1e-6);

    Ok(())
}

#[test]
fn fill_with_value() -> Result<()> {
    setup_device();
    let x = Tensor::fill(&[2, 2], 2.5f32)?;

    assert_close(&x.to_flatten_vec::<f32>()?, &[2.5; 4], 1e-6);

    Ok(())
}

#[test]
fn like_constructors_copy_shape_and_dtype() -> Result<()> {
    let proto = Tensor::new_with_spec(vec![1.0f32, 2.0, 3.0, 4.0], Device::CPU, DType::F64)?;

    let z = Tensor::zeros_like(&proto)?;
    assert_eq!(z.shape(), proto.shape());
    assert_eq!(z.dtype(), DType::F64);

    let o = Tensor::ones_like(&proto)?;
    assert_close(&o.to_flatten_vec::<f32>()?, &[1.0; 4], 1e-6);

    let f = Tensor::fill_like(&proto, 7.0f32)?;
    assert_close(&f.to_flatten_vec::<f32>()?, &[7.0; 4], 1e-6);

    Ok(())
}

#[test]
fn empty_allocates_requested_shape() -> Result<()> {
    setup_device();
    let x = Tensor::empty(&[4, 5])?;

    assert_eq!(x.shape(), &[4, 5]);
    assert_eq!(x.size(), 20);
    assert_eq!(x.dtype(), DType::F32);

    Ok(())
}

#[test]
fn randn_shape_and_dtype() -> Result<()> {
    setup_device();
    let x = Tensor::randn(&[100])?;

    assert_eq!(x.shape(), &[100]);
    assert_eq!(x.dtype(), DType::F32);

    // Standard normal values land well within this range
    let values = x.to_flatten_vec::<f32>()?;
    assert!(values.iter().all(|v| v.abs() < 10.0));
    assert!(values.iter().any(|v| *v != values[0]));

    Ok(())
}

#[test]
fn item_reads_single_element() -> Result<()> {
    setup_device();
    let x = Tensor::new(2.25f32)?;

    assert!((x.item()?.as_f32() - 2.25).abs() < 1e-6);

    let multi = Tensor::ones(&[2])?;
    assert!(multi.item().is_err());

    Ok(())
}

#[test]
fn share_data_gets_a_fresh_identity() -> Result<()> {
    setup_device();
    let x = Tensor::new(vec![1.0f32, 2.0])?;
    let shared = Tensor::share_data(&x)?;

    assert_ne!(shared.id(), x.id());
    assert_close(&shared.to_flatten_vec::<f32>()?, &[1.0, 2.0], 1e-6);

    Ok(())
}

#[test]
fn from_tensor_copies_values() -> Result<()> {
    setup_device();
    let x = Tensor::new(vec![1.0f32, 2.0, 3.0])?;
    let copy = Tensor::from_tensor(&x)?;

    assert_ne!(copy.id(), x.id());
    assert_eq!(copy.shape(), x.shape());
    assert_close(&copy.to_flatten_vec::<f32>()?, &[1.0, 2.0, 3.0], 1e-6);

    Ok(())
}

#[test]
fn to_flatten_vec_widens_half_precision() -> Result<()> {
    let x = Tensor::new_with_spec(vec![1.0f32, 2.0, 3.0], Device::CPU, DType::F16)?;
    let values = x.to_flatten_vec::<f64>()?;

    assert_eq!(values.len(), 3);
    assert!((values[0] - 1.0).abs() < 1e-3);

    Ok(())
}
