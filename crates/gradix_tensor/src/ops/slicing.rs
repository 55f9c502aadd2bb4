use crate::{autograd::Op, Tensor, TensorNode};
use gradix_core::error::{Error, Result};

impl Tensor {
    /// Copies out a rectangular region. `starts[d]` is the first index taken
    /// along dimension `d` and `lengths[d]` the number of elements; a length
    /// of `-1` takes the single index `starts[d]` and drops the dimension
    /// from the result.
    pub fn slice(&self, starts: &[usize], lengths: &[isize]) -> Result<Tensor> {
        let in_shape = self.shape().to_vec();

        if starts.len() != in_shape.len() || lengths.len() != in_shape.len() {
            return Err(Error::InvalidShape {
                message: format!(
                    "slice expects one span per dimension: got {} starts and {} lengths for {} dimensions",
                    starts.len(),
                    lengths.len(),
                    in_shape.len()
                ),
            });
        }

        let mut out_shape = Vec::new();
        for d in 0..in_shape.len() {
            if lengths[d] < -1 {
                return Err(Error::InvalidArgument(format!(
                    "slice length must be non-negative or -1, got {} for dimension {}",
                    lengths[d], d
                )));
            }
            if lengths[d] == -1 {
                if starts[d] >= in_shape[d] {
                    return Err(Error::IndexOutOfBounds {
                        index: starts[d],
                        size: in_shape[d],
                    });
                }
            } else {
                let length = lengths[d] as usize;
                if starts[d] + length > in_shape[d] {
                    return Err(Error::IndexOutOfBounds {
                        index: starts[d] + length,
                        size: in_shape[d],
                    });
                }
                out_shape.push(length);
            }
        }

        let mut result = Self::empty_with_spec(&out_shape, self.device(), self.dtype())?;

        let out_size = result.size();
        let mut in_coords = vec![0; in_shape.len()];
        for flat in 0..out_size {
            let mut out_coords = vec![0; out_shape.len()];
            let mut remainder = flat;
            for d in (0..out_shape.len()).rev() {
                out_coords[d] = remainder % out_shape[d];
                remainder /= out_shape[d];
            }

            let mut kept = 0;
            for d in 0..in_shape.len() {
                in_coords[d] = if lengths[d] < 0 {
                    starts[d]
                } else {
                    let coord = starts[d] + out_coords[kept];
                    kept += 1;
                    coord
                };
            }

            let mut src_flat = 0;
            for d in 0..in_shape.len() {
                src_flat = src_flat * in_shape[d] + in_coords[d];
            }

            let value = self.item_at_flat_index(src_flat)?;
            result.set_flat_index(flat, value)?;
        }

        if self.requires_grad() {
            result.with_grad()?;
            result.set_node(TensorNode::new(
                Op::Slice {
                    starts: starts.to_vec(),
                    lengths: lengths.to_vec(),
                },
                vec![self.clone()],
            ));
        }

        Ok(result)
    }
}
