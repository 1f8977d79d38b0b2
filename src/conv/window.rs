use rayon::prelude::*;

use super::ConvShape;

/// Where one kernel tap lands along a single axis.
///
/// For tap `k` the output cells `out_start..out_start + len` receive the input
/// cells `in_start..in_start + len` multiplied by the tap's weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisSpan {
    pub out_start: usize,
    pub in_start: usize,
    pub len: usize,
}

/// Spans for every tap of a kernel of size `kernel` along one axis.
///
/// With padding the part of the window that would read the zero border is
/// skipped instead of materialized. Without padding every tap covers the whole
/// output axis.
pub fn axis_spans(kernel: usize, out_size: usize, padded: bool) -> Vec<AxisSpan> {
    let half = kernel / 2;
    (0..kernel)
        .map(|k| {
            if padded {
                AxisSpan {
                    out_start: half.saturating_sub(k),
                    in_start: k.saturating_sub(half),
                    len: out_size.saturating_sub(half.abs_diff(k)),
                }
            } else {
                AxisSpan {
                    out_start: 0,
                    in_start: k,
                    len: out_size,
                }
            }
        })
        .collect()
}

/// Shifted-window convolution.
///
/// Each output plane is produced by one rayon task: the plane is zeroed, every
/// `(in_plane, ky, kx)` tap is accumulated row by row over its span, and the
/// plane's bias is added last. Tasks write disjoint planes, so no locking is
/// needed and the summation order inside a plane is fixed.
pub fn conv2d_window(
    shape: &ConvShape,
    input: &[f32],
    kernel: &[f32],
    bias: &[f32],
    output: &mut [f32],
) {
    let rows = axis_spans(shape.kernel_h, shape.out_h, shape.padded);
    let cols = axis_spans(shape.kernel_w, shape.out_w, shape.padded);

    let in_plane_len = shape.in_h * shape.in_w;
    let out_plane_len = shape.out_h * shape.out_w;
    let taps_len = shape.kernel_h * shape.kernel_w;
    let (in_w, out_w, kernel_w) = (shape.in_w, shape.out_w, shape.kernel_w);

    output
        .par_chunks_mut(out_plane_len)
        .enumerate()
        .for_each(|(oc, out_plane)| {
            out_plane.fill(0.0);

            for ic in 0..shape.in_planes {
                let in_plane = &input[ic * in_plane_len..(ic + 1) * in_plane_len];
                let taps_start = taps_len * (shape.in_planes * oc + ic);
                let taps = &kernel[taps_start..taps_start + taps_len];

                for (ky, row) in rows.iter().enumerate() {
                    if row.len == 0 {
                        continue;
                    }
                    for (kx, col) in cols.iter().enumerate() {
                        if col.len == 0 {
                            continue;
                        }
                        let w = taps[kernel_w * ky + kx];
                        for y in 0..row.len {
                            let out_start = out_w * (row.out_start + y) + col.out_start;
                            let in_start = in_w * (row.in_start + y) + col.in_start;
                            let out_row = &mut out_plane[out_start..out_start + col.len];
                            let in_row = &in_plane[in_start..in_start + col.len];
                            for (o, i) in out_row.iter_mut().zip(in_row) {
                                *o += w * i;
                            }
                        }
                    }
                }
            }

            let b = bias[oc];
            for o in out_plane.iter_mut() {
                *o += b;
            }
        });
}
