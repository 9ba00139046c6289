use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tinymlp::matrix::{Matrix, MatrixBase};
use tinymlp::{Error, Result};
use tracing::trace;

/// Endless shuffled supply of fixed-width batches over a labelled dataset.
///
/// Each batch holds one example per column: an `(embedding_size, m)` input and a one-hot
/// `(num_classes, m)` target. The dataset is reshuffled whenever the remaining examples cannot
/// fill a whole batch, so every example is seen at most once per pass.
pub struct Batch {
    rng: StdRng,
    embeddings: Box<[Vec<f32>]>,
    labels: Box<[usize]>,
    order: Vec<usize>,
    position: usize,
    num_classes: usize,
    input: Matrix,
    target: Matrix,
}

impl Batch {
    pub fn new(
        embeddings: Vec<Vec<f32>>,
        labels: Vec<usize>,
        num_classes: usize,
        batch_width: usize,
        mut rng: StdRng,
    ) -> Result<Batch> {
        if embeddings.len() != labels.len() {
            return Err(Error::InvalidConfig(format!(
                "{} embeddings but {} labels",
                embeddings.len(),
                labels.len()
            )));
        }
        if batch_width == 0 || batch_width > embeddings.len() {
            return Err(Error::InvalidConfig(format!(
                "batch width {batch_width} does not fit a dataset of {} examples",
                embeddings.len()
            )));
        }
        let embedding_size = embeddings[0].len();
        if let Some(bad) = embeddings.iter().find(|e| e.len() != embedding_size) {
            return Err(Error::LengthMismatch {
                op: "Batch embedding",
                expected: embedding_size,
                actual: bad.len(),
            });
        }
        if let Some(&label) = labels.iter().find(|&&l| l >= num_classes) {
            return Err(Error::InvalidLabel { label, num_classes });
        }

        let mut order: Vec<usize> = (0..embeddings.len()).collect();
        order.shuffle(&mut rng);
        Ok(Batch {
            rng,
            embeddings: embeddings.into_boxed_slice(),
            labels: labels.into_boxed_slice(),
            order,
            position: 0,
            num_classes,
            input: Matrix::new(embedding_size, batch_width),
            target: Matrix::new(num_classes, batch_width),
        })
    }

    /// Fills the next batch and returns `(input, target)`.
    pub fn next(&mut self) -> Result<(&Matrix, &Matrix)> {
        let width = self.batch_width();
        if self.position + width > self.order.len() {
            trace!("reshuffling {} examples", self.order.len());
            self.order.shuffle(&mut self.rng);
            self.position = 0;
        }
        self.target.clear_to_zero();
        for col in 0..width {
            let example = self.order[self.position + col];
            self.input.write_col(col, &self.embeddings[example])?;
            self.target.set(self.labels[example], col, 1.0)?;
        }
        self.position += width;
        Ok((&self.input, &self.target))
    }

    #[inline]
    pub fn input(&self) -> &Matrix {
        &self.input
    }

    #[inline]
    pub fn target(&self) -> &Matrix {
        &self.target
    }

    #[inline]
    pub fn batch_width(&self) -> usize {
        self.target.cols()
    }

    #[inline]
    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::Batch;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tinymlp::matrix::MatrixBase;
    use tinymlp::Error;

    fn dataset() -> (Vec<Vec<f32>>, Vec<usize>) {
        let embeddings = (0..6).map(|i| vec![i as f32, -(i as f32)]).collect();
        let labels = vec![0, 1, 2, 0, 1, 2];
        (embeddings, labels)
    }

    #[test]
    fn test_validation() {
        let (e, l) = dataset();
        let rng = || StdRng::seed_from_u64(1);
        assert_eq!(
            Batch::new(e.clone(), vec![0, 1, 5, 0, 1, 2], 3, 2, rng()).err(),
            Some(Error::InvalidLabel {
                label: 5,
                num_classes: 3
            })
        );
        assert!(Batch::new(e.clone(), l[..5].to_vec(), 3, 2, rng()).is_err());
        assert!(Batch::new(e.clone(), l.clone(), 3, 7, rng()).is_err());
        assert!(Batch::new(e.clone(), l.clone(), 3, 0, rng()).is_err());
        let mut ragged = e;
        ragged[3].push(1.0);
        assert!(matches!(
            Batch::new(ragged, l, 3, 2, rng()),
            Err(Error::LengthMismatch { .. })
        ));
    }

    #[test]
    fn test_one_hot_targets() {
        let (e, l) = dataset();
        let mut batch = Batch::new(e, l, 3, 4, StdRng::seed_from_u64(7)).unwrap();
        let (input, target) = batch.next().unwrap();
        for col in 0..4 {
            // labels follow i % 3 and the first feature is i
            let i = input.get(0, col).unwrap() as usize;
            assert_eq!(input.get(1, col).unwrap(), -(i as f32));
            for class in 0..3 {
                let expected = if class == i % 3 { 1.0 } else { 0.0 };
                assert_eq!(target.get(class, col).unwrap(), expected);
            }
        }
    }

    #[test]
    fn test_each_pass_covers_distinct_examples() {
        let (e, l) = dataset();
        let mut batch = Batch::new(e, l, 3, 3, StdRng::seed_from_u64(11)).unwrap();
        for _ in 0..4 {
            let mut seen = Vec::new();
            for _ in 0..2 {
                let (input, _) = batch.next().unwrap();
                seen.extend((0..3).map(|c| input.get(0, c).unwrap() as usize));
            }
            seen.sort_unstable();
            assert_eq!(seen, vec![0, 1, 2, 3, 4, 5]);
        }
    }

    #[test]
    fn test_seeded_order_is_reproducible() {
        let draw = |seed| {
            let (e, l) = dataset();
            let mut batch = Batch::new(e, l, 3, 2, StdRng::seed_from_u64(seed)).unwrap();
            (0..5)
                .map(|_| batch.next().unwrap().0.clone())
                .collect::<Vec<_>>()
        };
        assert_eq!(draw(3), draw(3));
    }
}
