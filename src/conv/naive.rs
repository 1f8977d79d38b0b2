use super::ConvShape;

/// Naive 6-nested-loop convolution (reference implementation).
///
/// Computes each output cell independently; padding is handled by skipping
/// input coordinates that fall outside the plane, which is the same as reading
/// zeros. Single-threaded.
pub fn conv2d_naive(
    shape: &ConvShape,
    input: &[f32],
    kernel: &[f32],
    bias: &[f32],
    output: &mut [f32],
) {
    let (pad_h, pad_w) = if shape.padded {
        (shape.kernel_h / 2, shape.kernel_w / 2)
    } else {
        (0, 0)
    };

    for oc in 0..shape.out_planes {
        for oh in 0..shape.out_h {
            for ow in 0..shape.out_w {
                let mut sum = 0.0f32;
                for ic in 0..shape.in_planes {
                    for kh in 0..shape.kernel_h {
                        let ih = match (oh + kh).checked_sub(pad_h) {
                            Some(ih) if ih < shape.in_h => ih,
                            _ => continue,
                        };
                        for kw in 0..shape.kernel_w {
                            let iw = match (ow + kw).checked_sub(pad_w) {
                                Some(iw) if iw < shape.in_w => iw,
                                _ => continue,
                            };
                            let in_idx = ic * shape.in_h * shape.in_w + ih * shape.in_w + iw;
                            let w_idx = oc * shape.in_planes * shape.kernel_h * shape.kernel_w
                                + ic * shape.kernel_h * shape.kernel_w
                                + kh * shape.kernel_w
                                + kw;
                            sum += input[in_idx] * kernel[w_idx];
                        }
                    }
                }
                let out_idx = oc * shape.out_h * shape.out_w + oh * shape.out_w + ow;
                output[out_idx] = sum + bias[oc];
            }
        }
    }
}
