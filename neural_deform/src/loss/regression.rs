//! Region-masked regression terms.

use burn::prelude::*;

use crate::data::select_rows;

/// Mean absolute error over every element.
pub fn l1_loss<B: Backend>(prediction: Tensor<B, 2>, target: Tensor<B, 2>) -> Tensor<B, 1> {
    (prediction - target).abs().mean()
}

/// L1 loss restricted to the rows in `indices`.
///
/// An empty selection yields a zero `[1]` tensor on the prediction's device.
pub fn masked_l1<B: Backend>(
    prediction: Tensor<B, 2>,
    target: Tensor<B, 2>,
    indices: &[usize],
) -> Tensor<B, 1> {
    if indices.is_empty() {
        return Tensor::zeros([1], &prediction.device());
    }
    l1_loss(select_rows(prediction, indices), select_rows(target, indices))
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_masked_l1() {
        let device = Default::default();
        let prediction = Tensor::<TestBackend, 2>::from_floats(
            [[1.0, 1.0, 1.0], [0.0, 0.0, 0.0], [5.0, 5.0, 5.0]],
            &device,
        );
        let target = Tensor::<TestBackend, 2>::zeros([3, 3], &device);

        let loss: f32 = masked_l1(prediction.clone(), target.clone(), &[0, 1])
            .into_data()
            .to_vec()
            .unwrap()[0];
        assert!((loss - 0.5).abs() < 1e-6, "expected 0.5, got {}", loss);

        let empty: f32 = masked_l1(prediction, target, &[]).into_data().to_vec().unwrap()[0];
        assert_eq!(empty, 0.0);
    }
}
