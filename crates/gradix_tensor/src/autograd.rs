use crate::Tensor;
use gradix_core::{
    error::{Error, Result},
    scalar::Scalar,
};
use std::{
    collections::{HashMap, HashSet},
    sync::atomic::{AtomicBool, Ordering},
};

/// The producing operation recorded on a graph node, with the payload its
/// backward rule needs beyond the operand values themselves.
#[derive(Clone, Debug)]
pub enum Op {
    Add,
    Sub,
    Mul,
    Div,
    AddScalar(Scalar),
    SubScalar(Scalar),
    MulScalar(Scalar),
    DivScalar(Scalar),
    Neg,
    Square,
    Relu,
    ToDType,
    Matmul,
    SumAll,
    SumDim { dim: usize },
    SumToShape { shape: Vec<usize> },
    Broadcast,
    View,
    Transpose { dim0: usize, dim1: usize },
    Slice { starts: Vec<usize>, lengths: Vec<isize> },
}

impl Op {
    pub fn name(&self) -> &'static str {
        match self {
            Op::Add => "add",
            Op::Sub => "sub",
            Op::Mul => "mul",
            Op::Div => "div",
            Op::AddScalar(_) => "add_scalar",
            Op::SubScalar(_) => "sub_scalar",
            Op::MulScalar(_) => "mul_scalar",
            Op::DivScalar(_) => "div_scalar",
            Op::Neg => "neg",
            Op::Square => "square",
            Op::Relu => "relu",
            Op::ToDType => "to_dtype",
            Op::Matmul => "matmul",
            Op::SumAll => "sum_all",
            Op::SumDim { .. } => "sum",
            Op::SumToShape { .. } => "sum_to_shape",
            Op::Broadcast => "broadcast",
            Op::View => "view",
            Op::Transpose { .. } => "transpose",
            Op::Slice { .. } => "slice",
        }
    }

    /// Whether a fused backend kernel (or a detached kernel-level
    /// computation) can produce this operation's vector-Jacobian product.
    pub fn has_native_gradient(&self) -> bool {
        matches!(
            self,
            Op::Add | Op::Sub | Op::Mul | Op::Div | Op::Matmul | Op::Relu | Op::SumAll
        )
    }
}

/// Graph vertex recording how a tensor was produced. Parents are shared
/// references; a tensor may feed any number of downstream nodes.
pub struct TensorNode {
    op: Op,
    inputs: Vec<Tensor>,
    consumed: AtomicBool,
    disable_native_gradient: AtomicBool,
}

impl TensorNode {
    pub fn new(op: Op, inputs: Vec<Tensor>) -> Self {
        Self {
            op,
            inputs,
            consumed: AtomicBool::new(false),
            disable_native_gradient: AtomicBool::new(false),
        }
    }

    pub fn op(&self) -> &Op {
        &self.op
    }

    pub fn inputs(&self) -> &[Tensor] {
        &self.inputs
    }

    pub fn is_consumed(&self) -> bool {
        self.consumed.load(Ordering::Acquire)
    }

    pub(crate) fn mark_consumed(&self) {
        self.consumed.store(true, Ordering::Release);
    }

    pub fn native_gradient_disabled(&self) -> bool {
        self.disable_native_gradient.load(Ordering::Acquire)
    }

    pub fn set_disable_native_gradient(&self, disable: bool) {
        self.disable_native_gradient.store(disable, Ordering::Release);
    }
}

/// Options for a single backward pass.
///
/// With `keep_graph` the traversed nodes stay usable and the gradients
/// written into `.grad` are themselves differentiable values, so an
/// expression built from them supports a further backward pass.
#[derive(Clone, Copy, Debug, Default)]
pub struct BackwardConfig {
    pub keep_graph: bool,
}

impl BackwardConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keep_graph(mut self, keep_graph: bool) -> Self {
        self.keep_graph = keep_graph;
        self
    }
}

impl Tensor {
    pub fn backward(&self) -> Result<()> {
        self.backward_with(None, &BackwardConfig::default())
    }

    pub fn backward_with_grad(&self, grad: &Tensor) -> Result<()> {
        self.backward_with(Some(grad), &BackwardConfig::default())
    }

    pub fn backward_with_config(&self, config: &BackwardConfig) -> Result<()> {
        self.backward_with(None, config)
    }

    /// Runs a backward pass from this tensor, accumulating gradients into
    /// every reachable tensor that requires them. Without an explicit
    /// incoming gradient the root must hold a single element; it is then
    /// seeded with ones.
    pub fn backward_with(&self, grad: Option<&Tensor>, config: &BackwardConfig) -> Result<()> {
        if !self.requires_grad() {
            return Err(Error::RequiresGradNotSet);
        }
        if let Some(node) = &self.node {
            if node.is_consumed() {
                return Err(Error::GraphConsumed);
            }
        }

        let seed = match grad {
            Some(grad) => {
                if grad.shape() != self.shape() {
                    return Err(Error::ShapeMismatch {
                        expected: self.size(),
                        got: grad.size(),
                        msg: format!(
                            "incoming gradient shape {:?} must match the root shape {:?}",
                            grad.shape(),
                            self.shape()
                        ),
                    });
                }
                grad.clone()
            },
            None => {
                if self.size() != 1 {
                    return Err(Error::InvalidArgument(
                        "backward without an explicit gradient requires a single-element root".to_string(),
                    ));
                }
                Tensor::ones_like(self)?
            },
        };

        run_backward(self, seed, config)
    }
}

fn run_backward(root: &Tensor, seed: Tensor, config: &BackwardConfig) -> Result<()> {
    // Post-order DFS; reversing it yields an order in which every tensor is
    // handled only after all of its consumers in the traversed subgraph.
    let mut topo: Vec<Tensor> = Vec::new();
    let mut visited: HashSet<usize> = HashSet::new();
    let mut stack: Vec<(Tensor, bool)> = vec![(root.clone(), false)];

    while let Some((tensor, children_done)) = stack.pop() {
        if children_done {
            topo.push(tensor);
            continue;
        }
        if !visited.insert(tensor.id()) {
            continue;
        }
        match tensor.node().cloned() {
            Some(node) => {
                // A consumed segment may be reached from a different root
                // than the one that consumed it
                if node.is_consumed() {
                    return Err(Error::GraphConsumed);
                }
                stack.push((tensor, true));
                for input in node.inputs() {
                    if !visited.contains(&input.id()) {
                        stack.push((input.clone(), false));
                    }
                }
            },
            None => topo.push(tensor),
        }
    }

    let mut grads: HashMap<usize, Tensor> = HashMap::new();
    grads.insert(root.id(), seed);

    for tensor in topo.iter().rev() {
        let grad_out = match grads.get(&tensor.id()) {
            Some(grad) => grad.clone(),
            None => continue,
        };

        if tensor.requires_grad() {
            let stored = if config.keep_graph { grad_out.clone() } else { grad_out.detach()? };
            tensor.accumulate_grad(&stored)?;
        }

        let node = match tensor.node() {
            Some(node) => node.clone(),
            None => continue,
        };

        // Native kernels produce opaque gradients that cannot be replayed,
        // so graph retention always falls back to the symbolic rules.
        let use_native = !config.keep_graph && !node.native_gradient_disabled() && node.op().has_native_gradient();
        let input_grads = if use_native {
            native_vjp(&node, &grad_out)?
        } else {
            symbolic_vjp(&node, &grad_out)?
        };

        for (input, grad_in) in node.inputs().iter().zip(input_grads) {
            let grad_in = match grad_in {
                Some(grad_in) => grad_in,
                None => continue,
            };
            let accumulated = match grads.remove(&input.id()) {
                Some(prev) => prev.add(&grad_in)?,
                None => grad_in,
            };
            grads.insert(input.id(), accumulated);
        }
    }

    if !config.keep_graph {
        for tensor in &topo {
            if let Some(node) = tensor.node() {
                node.mark_consumed();
            }
        }
    }

    Ok(())
}

/// Symbolic vector-Jacobian products. These are built from ordinary tensor
/// operations, so when the operands require gradients the results carry
/// graph nodes of their own and remain differentiable.
fn symbolic_vjp(node: &TensorNode, grad_out: &Tensor) -> Result<Vec<Option<Tensor>>> {
    let inputs = node.inputs();

    let grads = match node.op() {
        Op::Add => vec![
            Some(grad_out.sum_to_shape(inputs[0].shape())?),
            Some(grad_out.sum_to_shape(inputs[1].shape())?),
        ],
        Op::Sub => vec![
            Some(grad_out.sum_to_shape(inputs[0].shape())?),
            Some(grad_out.neg()?.sum_to_shape(inputs[1].shape())?),
        ],
        Op::Mul => vec![
            Some(grad_out.mul(&inputs[1])?.sum_to_shape(inputs[0].shape())?),
            Some(grad_out.mul(&inputs[0])?.sum_to_shape(inputs[1].shape())?),
        ],
        Op::Div => vec![
            Some(grad_out.div(&inputs[1])?.sum_to_shape(inputs[0].shape())?),
            Some(
                grad_out
                    .mul(&inputs[0])?
                    .div(&inputs[1].square()?)?
                    .neg()?
                    .sum_to_shape(inputs[1].shape())?,
            ),
        ],
        Op::AddScalar(_) | Op::SubScalar(_) => vec![Some(grad_out.clone())],
        Op::MulScalar(scalar) => vec![Some(grad_out.mul_scalar(*scalar)?)],
        Op::DivScalar(scalar) => vec![Some(grad_out.div_scalar(*scalar)?)],
        Op::Neg => vec![Some(grad_out.neg()?)],
        Op::Square => vec![Some(grad_out.mul_scalar(2.0f64)?.mul(&inputs[0])?)],
        Op::Relu => vec![Some(grad_out.mul(&inputs[0].step()?)?)],
        Op::ToDType => vec![Some(grad_out.to_dtype(inputs[0].dtype())?)],
        Op::Matmul => {
            let lhs = &inputs[0];
            let rhs = &inputs[1];
            let grad_lhs = grad_out.matmul(&rhs.transpose(rhs.ndim() - 2, rhs.ndim() - 1)?)?;
            let grad_rhs = lhs.transpose(lhs.ndim() - 2, lhs.ndim() - 1)?.matmul(grad_out)?;
            vec![Some(grad_lhs), Some(grad_rhs)]
        },
        Op::SumAll => vec![Some(grad_out.broadcast(inputs[0].shape())?)],
        Op::SumDim { dim } => {
            let input_shape = inputs[0].shape().to_vec();
            let mut grad_shape = input_shape.clone();
            grad_shape[*dim] = 1;
            vec![Some(grad_out.view(&grad_shape)?.broadcast(&input_shape)?)]
        },
        Op::SumToShape { .. } => vec![Some(grad_out.broadcast(inputs[0].shape())?)],
        Op::Broadcast => vec![Some(grad_out.sum_to_shape(inputs[0].shape())?)],
        Op::View => vec![Some(grad_out.reshape(inputs[0].shape())?)],
        Op::Transpose { dim0, dim1 } => vec![Some(grad_out.transpose(*dim0, *dim1)?)],
        Op::Slice { starts, lengths } => vec![Some(scatter_slice_grad(&inputs[0], grad_out, starts, lengths)?)],
    };

    Ok(grads)
}

/// Fused/native vector-Jacobian products. Operands and results are detached
/// from the graph; every produced gradient is tagged as native.
fn native_vjp(node: &TensorNode, grad_out: &Tensor) -> Result<Vec<Option<Tensor>>> {
    let inputs = node.inputs();
    let go = grad_out.detach()?;

    let grads = match node.op() {
        Op::Add => vec![
            Some(go.sum_to_shape(inputs[0].shape())?),
            Some(go.sum_to_shape(inputs[1].shape())?),
        ],
        Op::Sub => vec![
            Some(go.sum_to_shape(inputs[0].shape())?),
            Some(go.neg()?.sum_to_shape(inputs[1].shape())?),
        ],
        Op::Mul => {
            let lhs = inputs[0].detach()?;
            let rhs = inputs[1].detach()?;
            vec![
                Some(go.mul(&rhs)?.sum_to_shape(inputs[0].shape())?),
                Some(go.mul(&lhs)?.sum_to_shape(inputs[1].shape())?),
            ]
        },
        Op::Div => {
            let lhs = inputs[0].detach()?;
            let rhs = inputs[1].detach()?;
            vec![
                Some(go.div(&rhs)?.sum_to_shape(inputs[0].shape())?),
                Some(go.mul(&lhs)?.div(&rhs.square()?)?.neg()?.sum_to_shape(inputs[1].shape())?),
            ]
        },
        Op::Relu => {
            let input = inputs[0].detach()?.contiguous()?;
            let go = go.contiguous()?;
            let mut grad_input = Tensor::empty_like(&input)?;
            let metadata = crate::ops::unary::prepare_metadata(&input);
            unsafe {
                grad_input.with_buffer_mut(|gi_buf| {
                    gradix_core::be::ops::unary::relu_backward(
                        gi_buf,
                        input.buffer(),
                        go.buffer(),
                        input.size(),
                        input.ndim(),
                        Some(&metadata),
                    )?;
                    Ok(())
                })?;
            }
            vec![Some(grad_input)]
        },
        Op::Matmul => {
            // The backward kernel walks the operand buffers contiguously
            let lhs = inputs[0].detach()?.contiguous()?;
            let rhs = inputs[1].detach()?.contiguous()?;
            let go = go.contiguous()?;
            let (metadata, _) = crate::ops::matmul::prepare_metadata(&lhs, &rhs);

            let mut grad_lhs = Tensor::zeros_like(&lhs)?;
            let mut grad_rhs = Tensor::zeros_like(&rhs)?;
            let grad_lhs_size = grad_lhs.size();
            let grad_rhs_size = grad_rhs.size();

            unsafe {
                grad_lhs.with_buffer_mut(|gl_buf| {
                    grad_rhs.with_buffer_mut(|gr_buf| {
                        gradix_core::be::ops::matmul::matmul_backward(
                            Some(gl_buf),
                            Some(gr_buf),
                            go.buffer(),
                            lhs.buffer(),
                            rhs.buffer(),
                            grad_lhs_size,
                            grad_rhs_size,
                            Some(&metadata),
                        )?;
                        Ok(())
                    })
                })?;
            }
            vec![Some(grad_lhs), Some(grad_rhs)]
        },
        Op::SumAll => vec![Some(go.broadcast(inputs[0].shape())?)],
        // Guarded by has_native_gradient
        _ => return symbolic_vjp(node, grad_out),
    };

    let grads = grads
        .into_iter()
        .map(|grad| {
            grad.map(|mut tensor| {
                tensor.metadata.is_native_gradient = true;
                tensor
            })
        })
        .collect();

    Ok(grads)
}

/// Scatters an incoming slice gradient into a zero tensor shaped like the
/// slice's input, placing values at the sliced region.
fn scatter_slice_grad(input: &Tensor, grad_out: &Tensor, starts: &[usize], lengths: &[isize]) -> Result<Tensor> {
    let in_shape = input.shape().to_vec();
    let mut grad_in = Tensor::zeros_with_spec(&in_shape, grad_out.device(), grad_out.dtype())?;
    let go = grad_out.contiguous()?;

    let out_shape = go.shape().to_vec();
    for flat in 0..go.size() {
        let mut out_coords = vec![0; out_shape.len()];
        let mut remainder = flat;
        for d in (0..out_shape.len()).rev() {
            out_coords[d] = remainder % out_shape[d];
            remainder /= out_shape[d];
        }

        let mut dst_idx = 0;
        let mut kept = 0;
        for d in 0..in_shape.len() {
            let coord = if lengths[d] < 0 {
                starts[d]
            } else {
                let coord = starts[d] + out_coords[kept];
                kept += 1;
                coord
            };
            dst_idx = dst_idx * in_shape[d] + coord;
        }

        let value = go.item_at_flat_index(flat)?;
        grad_in.set_flat_index(dst_idx, value)?;
    }

    Ok(grad_in)
}
