use crate::Matrix;

/// Value of an edge pixel after normalisation.
pub const NORMALISED_MAX: f32 = 255.0;

/// Force a matrix to the binary `{0, NORMALISED_MAX}` range in place.
///
/// Entries strictly above `NORMALISED_MAX / 2` become `NORMALISED_MAX`;
/// everything else, NaN included, becomes 0.
pub fn normalise_img(img: &mut Matrix) {
    let split = NORMALISED_MAX * 0.5;
    for v in img.data.iter_mut() {
        *v = if *v > split { NORMALISED_MAX } else { 0.0 };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalise_is_binary_and_idempotent() {
        let mut m = Matrix::from_vec(
            3,
            2,
            vec![-4.0, 0.0, 127.5, 128.0, 1e6, f32::NAN],
        )
        .unwrap();
        normalise_img(&mut m);
        assert_eq!(m.data, vec![0.0, 0.0, 0.0, 255.0, 255.0, 0.0]);

        let once = m.clone();
        normalise_img(&mut m);
        assert_eq!(m, once);
        assert!(m.data.iter().all(|&v| v == 0.0 || v == NORMALISED_MAX));
    }
}
