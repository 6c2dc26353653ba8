/// Hyperparameters shared by every gradient-based trainer.
///
/// Setters panic on out-of-range values.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GradientDescent {
    alpha: f64,
    lambda: f64,
    iterations: usize,
}

impl GradientDescent {
    pub fn new(alpha: f64, lambda: f64, iterations: usize) -> Self {
        Self::default()
            .alpha(alpha)
            .lambda(lambda)
            .iterations(iterations)
    }

    /// Learning rate. Must be finite and positive.
    pub fn alpha(mut self, alpha: f64) -> Self {
        if !(alpha.is_finite() && alpha > 0.0) {
            panic!("alpha must be finite and > 0, got {}", alpha);
        }
        self.alpha = alpha;
        self
    }

    /// Regularization strength. Must be finite and non-negative.
    pub fn lambda(mut self, lambda: f64) -> Self {
        check_lambda(lambda);
        self.lambda = lambda;
        self
    }

    pub fn iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn learning_rate(&self) -> f64 {
        self.alpha
    }

    pub fn regularization(&self) -> f64 {
        self.lambda
    }

    pub fn num_iterations(&self) -> usize {
        self.iterations
    }
}

impl Default for GradientDescent {
    fn default() -> Self {
        Self {
            alpha: 0.01,
            lambda: 0.0,
            iterations: 1000,
        }
    }
}

/// Panics unless `lambda` is a valid regularization strength.
pub(crate) fn check_lambda(lambda: f64) {
    if !(lambda.is_finite() && lambda >= 0.0) {
        panic!("lambda must be finite and >= 0, got {}", lambda);
    }
}
