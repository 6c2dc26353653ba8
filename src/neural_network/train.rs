use std::ops::Range;

use super::{backprop, NeuralNetwork};
use crate::config::GradientDescent;
use crate::dataset::{DataSet, DataSetTarget, FullDataSet};
use crate::error::{Error, Result};
use crate::Matrix;
use ndarray::s;
use tracing::debug;

/// Consecutive row windows of `size`, restarting at row 0 after the window
/// that reaches the last row. The final window of a pass may be short.
struct BatchWindows {
    rows: usize,
    size: usize,
    start: usize,
}

impl BatchWindows {
    fn new(rows: usize, size: usize) -> Self {
        Self { rows, size, start: 0 }
    }
}

impl Iterator for BatchWindows {
    type Item = Range<usize>;

    fn next(&mut self) -> Option<Range<usize>> {
        let end = (self.start + self.size).min(self.rows);
        let window = self.start..end;
        self.start = if end >= self.rows { 0 } else { end };
        Some(window)
    }
}

impl NeuralNetwork {
    /// Batch gradient descent: every iteration uses the whole data set.
    pub fn train(&mut self, data: &DataSet, target: &DataSetTarget, gd: &GradientDescent) -> Result<()> {
        let y = self.prepare(data, target)?;
        debug!(
            alpha = gd.learning_rate(),
            lambda = gd.regularization(),
            iterations = gd.num_iterations(),
            examples = data.num_examples(),
            layers = self.num_layers(),
            "training neural network"
        );

        for _ in 0..gd.num_iterations() {
            self.step(data.matrix(), &y, gd)?;
        }
        debug!(iterations = gd.num_iterations(), "neural network training finished");
        Ok(())
    }

    /// Gradient descent over consecutive windows of `batch_size` rows. A batch
    /// size equal to the example count is plain batch training.
    pub fn train_mini_batch(
        &mut self,
        data: &DataSet,
        target: &DataSetTarget,
        gd: &GradientDescent,
        batch_size: usize,
    ) -> Result<()> {
        if batch_size == 0 {
            return Err(Error::Empty("batch size must be > 0".to_string()));
        }
        if batch_size == data.num_examples() {
            return self.train(data, target, gd);
        }

        let y = self.prepare(data, target)?;
        debug!(
            alpha = gd.learning_rate(),
            lambda = gd.regularization(),
            iterations = gd.num_iterations(),
            examples = data.num_examples(),
            batch_size,
            "training neural network on mini-batches"
        );

        let x = data.matrix();
        let windows = BatchWindows::new(data.num_examples(), batch_size);
        for rows in windows.take(gd.num_iterations()) {
            let x_batch = x.slice(s![rows.clone(), ..]).to_owned();
            let y_batch = y.slice(s![rows, ..]).to_owned();
            self.step(&x_batch, &y_batch, gd)?;
        }
        debug!(iterations = gd.num_iterations(), "neural network training finished");
        Ok(())
    }

    /// Mini-batch training with one example per step.
    pub fn train_stochastic(&mut self, data: &DataSet, target: &DataSetTarget, gd: &GradientDescent) -> Result<()> {
        self.train_mini_batch(data, target, gd, 1)
    }

    /// Iteration `i` trains on `batches[i % batches.len()]`. Every batch is
    /// validated before the first step.
    pub fn train_on_batches(&mut self, batches: &[FullDataSet], gd: &GradientDescent) -> Result<()> {
        if batches.is_empty() {
            return Err(Error::Empty("batch list must not be empty".to_string()));
        }
        let prepared = batches
            .iter()
            .map(|batch| {
                let y = self.prepare(batch.data_set(), batch.target())?;
                Ok((batch.data_set().matrix(), y))
            })
            .collect::<Result<Vec<(&Matrix, Matrix)>>>()?;

        debug!(
            alpha = gd.learning_rate(),
            lambda = gd.regularization(),
            iterations = gd.num_iterations(),
            batches = batches.len(),
            "training neural network on fixed batches"
        );

        for i in 0..gd.num_iterations() {
            let (x, y) = &prepared[i % prepared.len()];
            self.step(x, y, gd)?;
        }
        debug!(iterations = gd.num_iterations(), "neural network training finished");
        Ok(())
    }

    /// Iteration `i` trains on `generator(i)`. If a generated batch is
    /// invalid, training stops with the weights from the completed iterations.
    pub fn train_with_generator<F>(&mut self, mut generator: F, gd: &GradientDescent) -> Result<()>
    where
        F: FnMut(usize) -> FullDataSet,
    {
        debug!(
            alpha = gd.learning_rate(),
            lambda = gd.regularization(),
            iterations = gd.num_iterations(),
            "training neural network on generated batches"
        );

        for i in 0..gd.num_iterations() {
            let batch = generator(i);
            let y = self.prepare(batch.data_set(), batch.target())?;
            self.step(batch.data_set().matrix(), &y, gd)?;
        }
        debug!(iterations = gd.num_iterations(), "neural network training finished");
        Ok(())
    }

    fn step(&mut self, x: &Matrix, y: &Matrix, gd: &GradientDescent) -> Result<()> {
        let grads = backprop::gradients(&self.thetas, x, y, gd.regularization())?;
        for (theta, grad) in self.thetas.iter_mut().zip(&grads) {
            theta.scaled_add(-gd.learning_rate(), grad);
        }
        Ok(())
    }
}
