use gradix_core::{dtype::DType, error::Result};

use crate::{autograd::Op, Tensor, TensorNode};

pub fn get_promoted_dtype(dtype1: DType, dtype2: DType) -> DType {
    match (dtype1, dtype2) {
        (dtype1, dtype2) if dtype1 == dtype2 => dtype1,

        (_, DType::F64) | (DType::F64, _) => DType::F64,
        (_, DType::F32) | (DType::F32, _) => DType::F32,
        // Mixed half formats promote to a wider common type
        (DType::BF16, DType::F16) | (DType::F16, DType::BF16) => DType::F32,
        (dtype1, _) => dtype1,
    }
}

/// Converts `src` to `target_dtype`. The converted copy has a fresh
/// identity, so when `src` requires gradients a cast node links the copy
/// back to it; gradients reaching the copy convert back to `src`'s dtype.
pub fn promote_tensor(src: &Tensor, target_dtype: DType) -> Result<Tensor> {
    if src.dtype() == target_dtype {
        return Ok(src.clone());
    }

    let mut promoted = src.to_dtype(target_dtype)?;
    if src.requires_grad() {
        promoted.with_grad()?;
        promoted.set_node(TensorNode::new(Op::ToDType, vec![src.clone()]));
    }

    Ok(promoted)
}
