/// Zeroes negative cells in place. NaN is left as is.
pub fn relu(cells: &mut [f32]) {
    for cell in cells.iter_mut() {
        if *cell < 0.0 {
            *cell = 0.0;
        }
    }
}

/// Replaces every cell with `exp(cell) / sum(exp)`.
///
/// The maximum is not subtracted before exponentiating, so logits above ~88
/// overflow to infinity and produce NaN.
pub fn softmax(cells: &mut [f32]) {
    let mut sum = 0.0f32;
    for cell in cells.iter_mut() {
        *cell = cell.exp();
        sum += *cell;
    }
    for cell in cells.iter_mut() {
        *cell /= sum;
    }
}
