use std::iter::zip;

/// Bias-corrected step sizes shared by every parameter of one update.
#[derive(Copy, Clone, Debug)]
pub(super) struct StepParams {
    pub learning_rate: f32,
    pub beta1: f32,
    pub beta2: f32,
    pub epsilon: f32,
    /// `1 - beta1^t`
    pub correction1: f32,
    /// `1 - beta2^t`
    pub correction2: f32,
}

impl StepParams {
    pub fn new(learning_rate: f32, beta1: f32, beta2: f32, epsilon: f32, t: u64) -> Self {
        let t = i32::try_from(t).unwrap_or(i32::MAX);
        StepParams {
            learning_rate,
            beta1,
            beta2,
            epsilon,
            correction1: 1.0 - beta1.powi(t),
            correction2: 1.0 - beta2.powi(t),
        }
    }
}

/// First and second moment accumulators for one parameter buffer.
#[derive(Clone, Debug)]
pub(super) struct Moments {
    m: Box<[f32]>,
    v: Box<[f32]>,
}

impl Moments {
    pub fn new(len: usize) -> Self {
        Moments {
            m: vec![0.0; len].into_boxed_slice(),
            v: vec![0.0; len].into_boxed_slice(),
        }
    }

    #[cfg(test)]
    pub fn first(&self) -> &[f32] {
        &self.m
    }

    #[cfg(test)]
    pub fn second(&self) -> &[f32] {
        &self.v
    }

    /// Folds `grads` into the moments and moves every element of `params` against them.
    pub fn update(&mut self, params: &mut [f32], grads: &[f32], step: &StepParams) {
        debug_assert_eq!(params.len(), self.m.len());
        debug_assert_eq!(grads.len(), self.m.len());
        let StepParams {
            learning_rate,
            beta1,
            beta2,
            epsilon,
            correction1,
            correction2,
        } = *step;
        for (p, (&g, (m, v))) in zip(params, zip(grads, zip(self.m.iter_mut(), self.v.iter_mut()))) {
            *m = beta1 * *m + (1.0 - beta1) * g;
            *v = beta2 * *v + (1.0 - beta2) * g * g;
            let m_hat = *m / correction1;
            let v_hat = *v / correction2;
            *p -= learning_rate * m_hat / (v_hat.sqrt() + epsilon);
        }
    }
}
