use rayon::prelude::*;

use crate::error::{CnnError, Result};
use crate::tensor::Tensor;

/// Output size of a `pool_size x pool_size` max pool with stride `pool_size`.
///
/// Rows and columns that do not fill a whole window are dropped.
pub fn pool_output_dims(in_h: usize, in_w: usize, pool_size: usize) -> Result<(usize, usize)> {
    if pool_size == 0 {
        return Err(CnnError::shape("max_pool size", "at least 1", 0));
    }
    Ok((in_h / pool_size, in_w / pool_size))
}

/// Max pooling with "valid" padding; each plane is reduced independently.
pub fn max_pool(output: &mut Tensor, input: &Tensor, pool_size: usize) -> Result<()> {
    if output.planes() != input.planes() {
        return Err(CnnError::shape("max_pool planes", input.planes(), output.planes()));
    }
    let (out_h, out_w) = pool_output_dims(input.height(), input.width(), pool_size)?;
    if output.height() != out_h || output.width() != out_w {
        return Err(CnnError::shape(
            "max_pool output size",
            format!("{}x{}", out_h, out_w),
            format!("{}x{}", output.height(), output.width()),
        ));
    }

    let in_w = input.width();
    let out_plane_len = output.plane_len();
    output
        .as_mut_slice()
        .par_chunks_mut(out_plane_len)
        .enumerate()
        .for_each(|(plane, out_plane)| {
            let in_plane = input.plane(plane);
            for oy in 0..out_h {
                for ox in 0..out_w {
                    let mut max_val = f32::NEG_INFINITY;
                    for iy in oy * pool_size..(oy + 1) * pool_size {
                        let row = &in_plane[in_w * iy + ox * pool_size..in_w * iy + (ox + 1) * pool_size];
                        for &v in row {
                            if v > max_val {
                                max_val = v;
                            }
                        }
                    }
                    out_plane[out_w * oy + ox] = max_val;
                }
            }
        });
    Ok(())
}
