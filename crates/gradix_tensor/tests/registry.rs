mod utils;

use gradix_core::error::Result;
use gradix_tensor::{Tensor, ValueRegistry};
use utils::setup_grad_tensor_with_shape;
use gradix_core::dtype::DType;

#[test]
fn track_and_lookup() -> Result<()> {
    let registry = ValueRegistry::new();
    let mut w = setup_grad_tensor_with_shape(vec![1.0, 2.0], DType::F32, &[2])?;
    w.with_label("weight");

    registry.track(&w);

    assert!(registry.contains(w.id()));
    assert_eq!(registry.len(), 1);

    let entry = registry.get(w.id()).unwrap();
    assert_eq!(entry.label.as_deref(), Some("weight"));
    assert_eq!(entry.shape, vec![2]);
    assert!(entry.requires_grad);

    Ok(())
}

#[test]
fn untrack_removes_the_entry() -> Result<()> {
    let registry = ValueRegistry::new();
    let w = Tensor::ones(&[3])?;

    registry.track(&w);
    let removed = registry.untrack(w.id()).unwrap();
    assert_eq!(removed.shape, vec![3]);
    assert!(!registry.contains(w.id()));
    assert!(registry.is_empty());

    assert!(registry.untrack(w.id()).is_none());

    Ok(())
}

#[test]
fn retracking_overwrites_the_snapshot() -> Result<()> {
    let registry = ValueRegistry::new();
    let mut w = Tensor::ones(&[2])?;

    registry.track(&w);
    assert!(!registry.get(w.id()).unwrap().requires_grad);

    w.with_grad()?;
    registry.track(&w);
    assert_eq!(registry.len(), 1);
    assert!(registry.get(w.id()).unwrap().requires_grad);

    Ok(())
}

#[test]
fn labels_collects_named_entries() -> Result<()> {
    let registry = ValueRegistry::new();

    let mut w = Tensor::ones(&[2])?;
    w.with_label("weight");
    let mut b = Tensor::zeros(&[2])?;
    b.with_label("bias");
    let anon = Tensor::ones(&[2])?;

    registry.track(&w);
    registry.track(&b);
    registry.track(&anon);

    let mut labels = registry.labels();
    labels.sort();
    assert_eq!(labels, vec!["bias".to_string(), "weight".to_string()]);

    Ok(())
}

#[test]
fn clear_empties_the_registry() -> Result<()> {
    let registry = ValueRegistry::new();
    registry.track(&Tensor::ones(&[1])?);
    registry.track(&Tensor::ones(&[1])?);

    assert_eq!(registry.len(), 2);
    registry.clear();
    assert!(registry.is_empty());

    Ok(())
}
