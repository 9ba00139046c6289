use crate::error::{check_dims, check_len, Result};
use crate::matrix::{Matrix, MatrixBase};
use tracing::info;

/// Index of the largest value. Ties resolve to the first index, `None` for an empty slice.
pub fn argmax(values: &[f32]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f32)>, (i, &v)| match best {
            Some((_, b)) if b >= v => best,
            _ => Some((i, v)),
        })
        .map(|(i, _)| i)
}

/// Confusion matrix over argmax predictions of a multiclass model.
///
/// Rows are expected classes, columns predicted classes.
#[derive(Clone, Debug)]
pub struct MulticlassScorer {
    matrix: Matrix,
    count: usize,
}

impl MulticlassScorer {
    pub fn new(num_classes: usize) -> Self {
        MulticlassScorer {
            matrix: Matrix::new(num_classes, num_classes),
            count: 0,
        }
    }

    #[inline]
    pub fn num_classes(&self) -> usize {
        self.matrix.rows()
    }

    /// Scores every column of `output` (logits or probabilities) against the matching
    /// one-hot column of `expected`.
    pub fn process_batch<O, E>(&mut self, output: &O, expected: &E) -> Result<()>
    where
        O: MatrixBase + ?Sized,
        E: MatrixBase + ?Sized,
    {
        let n = self.num_classes();
        check_len("MulticlassScorer classes", n, output.rows())?;
        check_dims("MulticlassScorer::process_batch", output.dims(), expected.dims())?;
        let mut o = vec![0.0; n];
        let mut e = vec![0.0; n];
        for col in 0..output.cols() {
            output.read_col(col, &mut o)?;
            expected.read_col(col, &mut e)?;
            if let (Some(predicted), Some(actual)) = (argmax(&o), argmax(&e)) {
                let cell = self.matrix.value_at(actual, predicted) + 1.0;
                self.matrix.set_at(actual, predicted, cell);
                self.count += 1;
            }
        }
        Ok(())
    }

    /// Number of scored examples.
    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn correct(&self) -> usize {
        (0..self.num_classes())
            .map(|i| self.matrix.value_at(i, i) as usize)
            .sum()
    }

    pub fn accuracy(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.correct() as f64 / self.count as f64
        }
    }

    pub fn error_rate(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            1.0 - self.accuracy()
        }
    }

    /// Raw counts.
    #[inline]
    pub fn confusion_matrix(&self) -> &Matrix {
        &self.matrix
    }

    /// Confusion matrix with every row scaled to sum to one.
    pub fn normalized_confusion_matrix(&self) -> Matrix {
        let mut normalized = self.matrix.clone();
        let n = self.num_classes();
        for row in normalized.as_mut_slice().chunks_mut(n.max(1)) {
            let total: f32 = row.iter().sum();
            if total > 0.0 {
                row.iter_mut().for_each(|e| *e /= total);
            }
        }
        normalized
    }

    pub fn reset(&mut self) {
        self.matrix.clear_to_zero();
        self.count = 0;
    }

    pub fn log_report(&self) {
        let count = self.count;
        let incorrect = count - self.correct();
        info!("Confusion Matrix: {:.3?}", self.normalized_confusion_matrix());
        info!(
            "Error rate: {:.2}% ({incorrect}/{count})",
            self.error_rate() * 100.0
        );
    }
}

/// Fraction of columns whose argmax agrees.
pub fn accuracy<O, E>(output: &O, expected: &E) -> Result<f64>
where
    O: MatrixBase + ?Sized,
    E: MatrixBase + ?Sized,
{
    let mut scorer = MulticlassScorer::new(output.rows());
    scorer.process_batch(output, expected)?;
    Ok(scorer.accuracy())
}

#[cfg(test)]
mod test {
    use super::{accuracy, argmax, MulticlassScorer};
    use crate::matrix::Matrix;
    use approx::assert_abs_diff_eq;
    use std::iter::zip;

    #[test]
    fn test_argmax() {
        assert_eq!(argmax(&[]), None);
        assert_eq!(argmax(&[0.1, 0.7, 0.2]), Some(1));
        assert_eq!(argmax(&[-1.0, -1.0]), Some(0));
        assert_eq!(argmax(&[f32::NEG_INFINITY, -3.0]), Some(1));
    }

    #[test]
    fn test_scorer() {
        let mut scorer = MulticlassScorer::new(2);
        // columns predict: 0, 1, 1
        let output = Matrix::from_rows(&[[2.0, -1.0, 0.0], [1.0, 3.0, 0.5]]);
        let expected = Matrix::from_rows(&[[1.0, 0.0, 1.0], [0.0, 1.0, 0.0]]);
        scorer.process_batch(&output, &expected).unwrap();
        assert_eq!(scorer.count(), 3);
        assert_eq!(scorer.correct(), 2);
        assert_abs_diff_eq!(scorer.accuracy(), 2.0 / 3.0);
        assert_abs_diff_eq!(scorer.error_rate(), 1.0 / 3.0);
        assert_eq!(
            scorer.confusion_matrix(),
            &Matrix::from_rows(&[[1.0, 1.0], [0.0, 1.0]])
        );
        let normalized = scorer.normalized_confusion_matrix();
        for (a, b) in zip(normalized.as_slice(), [0.5, 0.5, 0.0, 1.0]) {
            assert_abs_diff_eq!(*a, b);
        }
        scorer.log_report();

        scorer.reset();
        assert_eq!(scorer.count(), 0);
        assert_eq!(scorer.accuracy(), 0.0);
    }

    #[test]
    fn test_shape_errors() {
        let mut scorer = MulticlassScorer::new(3);
        assert!(scorer
            .process_batch(&Matrix::new(2, 4), &Matrix::new(2, 4))
            .is_err());
        assert!(scorer
            .process_batch(&Matrix::new(3, 4), &Matrix::new(3, 2))
            .is_err());
        assert_eq!(scorer.count(), 0);
    }

    #[test]
    fn test_accuracy() {
        let output = Matrix::from_rows(&[[0.9, 0.2], [0.1, 0.8]]);
        assert_eq!(accuracy(&output, &Matrix::from_rows(&[[1.0, 0.0], [0.0, 1.0]])).unwrap(), 1.0);
        assert_eq!(accuracy(&output, &Matrix::from_rows(&[[0.0, 0.0], [1.0, 1.0]])).unwrap(), 0.5);
    }
}
