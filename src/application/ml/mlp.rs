//! Feed-forward regression network trained with Adam on standardised data.

use super::predictor::{Regressor, check_rows};
use crate::domain::errors::AnalysisError;
use crate::domain::ml::LaggedFeatures;
use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::debug;

const MODEL_NAME: &str = "MLP";
const BETA1: f64 = 0.9;
const BETA2: f64 = 0.999;
const EPSILON: f64 = 1e-8;

/// Hyper-parameters of [`MlpRegressor`]
#[derive(Debug, Clone, PartialEq)]
pub struct MlpParams {
    pub hidden_layers: Vec<usize>,
    pub learning_rate: f64,
    pub max_epochs: usize,
    /// Upper bound on the mini-batch size; small datasets use one full batch
    pub batch_size: usize,
    /// L2 penalty on the weights
    pub l2_penalty: f64,
    /// Minimum epoch-loss improvement that resets the patience counter
    pub tolerance: f64,
    pub patience: usize,
    pub seed: u64,
}

impl Default for MlpParams {
    fn default() -> Self {
        Self {
            hidden_layers: vec![100, 50],
            learning_rate: 0.001,
            max_epochs: 500,
            batch_size: 200,
            l2_penalty: 1e-4,
            tolerance: 1e-4,
            patience: 10,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone)]
struct DenseLayer {
    weights: Array2<f64>,
    biases: Array1<f64>,
    relu: bool,
}

impl DenseLayer {
    /// Glorot-uniform weights, zero biases
    fn glorot(inputs: usize, outputs: usize, relu: bool, rng: &mut StdRng) -> Self {
        let limit = (6.0 / (inputs + outputs) as f64).sqrt();
        let weights = Array2::from_shape_fn((inputs, outputs), |_| rng.random_range(-limit..limit));
        Self {
            weights,
            biases: Array1::zeros(outputs),
            relu,
        }
    }

    /// Returns the activated output
    fn forward(&self, input: &Array2<f64>) -> Array2<f64> {
        let z = input.dot(&self.weights) + &self.biases;
        if self.relu { z.mapv(|v| v.max(0.0)) } else { z }
    }
}

#[derive(Debug, Clone)]
struct AdamState {
    m_w: Array2<f64>,
    v_w: Array2<f64>,
    m_b: Array1<f64>,
    v_b: Array1<f64>,
}

impl AdamState {
    fn for_layer(layer: &DenseLayer) -> Self {
        Self {
            m_w: Array2::zeros(layer.weights.dim()),
            v_w: Array2::zeros(layer.weights.dim()),
            m_b: Array1::zeros(layer.biases.len()),
            v_b: Array1::zeros(layer.biases.len()),
        }
    }

    fn apply(&mut self, layer: &mut DenseLayer, grad_w: &Array2<f64>, grad_b: &Array1<f64>, step_size: f64) {
        self.m_w = &self.m_w * BETA1 + grad_w * (1.0 - BETA1);
        self.v_w = &self.v_w * BETA2 + grad_w.mapv(|g| g * g) * (1.0 - BETA2);
        self.m_b = &self.m_b * BETA1 + grad_b * (1.0 - BETA1);
        self.v_b = &self.v_b * BETA2 + grad_b.mapv(|g| g * g) * (1.0 - BETA2);

        let update_w = &self.m_w / &(self.v_w.mapv(f64::sqrt) + EPSILON) * step_size;
        let update_b = &self.m_b / &(self.v_b.mapv(f64::sqrt) + EPSILON) * step_size;
        layer.weights -= &update_w;
        layer.biases -= &update_b;
    }
}

/// Column-wise standardisation fitted on training data
#[derive(Debug, Clone)]
struct Scaler {
    mean: Array1<f64>,
    scale: Array1<f64>,
}

impl Scaler {
    fn fit(x: &Array2<f64>) -> Self {
        let n = x.nrows() as f64;
        let mean = x.sum_axis(Axis(0)) / n;
        let scale = (x - &mean)
            .mapv(|v| v * v)
            .sum_axis(Axis(0))
            .mapv(|ss| {
                let std = (ss / n).sqrt();
                if std > 1e-12 { std } else { 1.0 }
            });
        Self { mean, scale }
    }

    fn transform(&self, x: &Array2<f64>) -> Array2<f64> {
        (x - &self.mean) / &self.scale
    }
}

/// Multi-layer perceptron with ReLU hidden layers and a linear output
#[derive(Debug, Clone)]
pub struct MlpRegressor {
    layers: Vec<DenseLayer>,
    x_scaler: Scaler,
    y_mean: f64,
    y_scale: f64,
    epochs_run: usize,
    final_loss: f64,
}

impl MlpRegressor {
    pub fn fit(data: &LaggedFeatures, params: &MlpParams) -> Result<Self, AnalysisError> {
        Self::fit_rows(&data.rows, &data.targets, params)
    }

    pub fn fit_rows(rows: &[Vec<f64>], targets: &[f64], params: &MlpParams) -> Result<Self, AnalysisError> {
        let n = rows.len();
        if n == 0 || targets.len() != n {
            return Err(AnalysisError::training_failed(
                MODEL_NAME,
                format!("{} rows for {} targets", n, targets.len()),
            ));
        }
        let width = rows[0].len();
        if width == 0 {
            return Err(AnalysisError::training_failed(MODEL_NAME, "rows have no features"));
        }
        check_rows(MODEL_NAME, rows, width)?;
        if rows.iter().flatten().chain(targets).any(|v| !v.is_finite()) {
            return Err(AnalysisError::training_failed(MODEL_NAME, "non-finite input value"));
        }
        if params.hidden_layers.contains(&0) {
            return Err(AnalysisError::training_failed(MODEL_NAME, "hidden layer of width 0"));
        }

        let x = to_matrix(rows, width)?;
        let x_scaler = Scaler::fit(&x);
        let xs = x_scaler.transform(&x);

        let y_mean = targets.iter().sum::<f64>() / n as f64;
        let y_std = (targets.iter().map(|t| (t - y_mean).powi(2)).sum::<f64>() / n as f64).sqrt();
        let y_scale = if y_std > 1e-12 { y_std } else { 1.0 };
        let ys = Array1::from_iter(targets.iter().map(|t| (t - y_mean) / y_scale));

        let mut rng = StdRng::seed_from_u64(params.seed);
        let mut sizes = vec![width];
        sizes.extend(&params.hidden_layers);
        sizes.push(1);
        let mut layers: Vec<DenseLayer> = sizes
            .windows(2)
            .enumerate()
            .map(|(i, pair)| DenseLayer::glorot(pair[0], pair[1], i + 2 < sizes.len(), &mut rng))
            .collect();
        let mut optimizers: Vec<AdamState> = layers.iter().map(AdamState::for_layer).collect();

        let batch_size = params.batch_size.clamp(1, n);
        let mut indices: Vec<usize> = (0..n).collect();
        let mut best_loss = f64::INFINITY;
        let mut stale_epochs = 0;
        let mut step = 0i32;
        let mut epochs_run = 0;
        let mut final_loss = f64::NAN;

        for epoch in 0..params.max_epochs {
            indices.shuffle(&mut rng);
            let mut epoch_loss = 0.0;

            for batch in indices.chunks(batch_size) {
                let xb = xs.select(Axis(0), batch);
                let yb = ys.select(Axis(0), batch);
                step += 1;
                let batch_loss = train_batch(&mut layers, &mut optimizers, &xb, &yb, params, step);
                epoch_loss += batch_loss * batch.len() as f64;
            }

            epoch_loss /= n as f64;
            epochs_run = epoch + 1;
            final_loss = epoch_loss;
            if !epoch_loss.is_finite() {
                return Err(AnalysisError::training_failed(
                    MODEL_NAME,
                    format!("loss diverged at epoch {}", epoch + 1),
                ));
            }

            if epoch_loss > best_loss - params.tolerance {
                stale_epochs += 1;
            } else {
                stale_epochs = 0;
            }
            best_loss = best_loss.min(epoch_loss);
            if stale_epochs > params.patience {
                debug!("MLP converged after {} epochs (loss {:.6})", epochs_run, epoch_loss);
                break;
            }
        }

        Ok(Self {
            layers,
            x_scaler,
            y_mean,
            y_scale,
            epochs_run,
            final_loss,
        })
    }

    pub fn epochs_run(&self) -> usize {
        self.epochs_run
    }

    /// Half mean squared error of the last epoch, in standardised units
    pub fn final_loss(&self) -> f64 {
        self.final_loss
    }

    fn input_width(&self) -> usize {
        self.x_scaler.mean.len()
    }
}

impl Regressor for MlpRegressor {
    fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>, AnalysisError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        check_rows(MODEL_NAME, rows, self.input_width())?;
        let x = to_matrix(rows, self.input_width())?;
        let mut activation = self.x_scaler.transform(&x);
        for layer in &self.layers {
            activation = layer.forward(&activation);
        }
        Ok(activation
            .column(0)
            .iter()
            .map(|v| v * self.y_scale + self.y_mean)
            .collect())
    }

    fn name(&self) -> &str {
        MODEL_NAME
    }
}

/// One forward/backward pass and Adam update; returns the batch loss
fn train_batch(
    layers: &mut [DenseLayer],
    optimizers: &mut [AdamState],
    xb: &Array2<f64>,
    yb: &Array1<f64>,
    params: &MlpParams,
    step: i32,
) -> f64 {
    let m = xb.nrows() as f64;

    // activations[0] is the input, activations[l + 1] the output of layer l
    let mut activations = Vec::with_capacity(layers.len() + 1);
    activations.push(xb.clone());
    for layer in layers.iter() {
        let next = layer.forward(&activations[activations.len() - 1]);
        activations.push(next);
    }

    let output = activations[layers.len()].column(0).to_owned();
    let diff = &output - yb;
    let penalty: f64 = layers.iter().map(|l| l.weights.mapv(|w| w * w).sum()).sum();
    let loss = diff.mapv(|d| d * d).sum() / (2.0 * m) + params.l2_penalty * penalty / (2.0 * m);

    let step_size = params.learning_rate * (1.0 - BETA2.powi(step)).sqrt() / (1.0 - BETA1.powi(step));

    let mut delta = (diff / m).insert_axis(Axis(1));
    for l in (0..layers.len()).rev() {
        let grad_w = activations[l].t().dot(&delta) + &layers[l].weights * (params.l2_penalty / m);
        let grad_b = delta.sum_axis(Axis(0));

        if l > 0 {
            let upstream = delta.dot(&layers[l].weights.t());
            // ReLU derivative taken from the stored activation
            delta = upstream * activations[l].mapv(|a| if a > 0.0 { 1.0 } else { 0.0 });
        }
        optimizers[l].apply(&mut layers[l], &grad_w, &grad_b, step_size);
    }

    loss
}

fn to_matrix(rows: &[Vec<f64>], width: usize) -> Result<Array2<f64>, AnalysisError> {
    let flat: Vec<f64> = rows.iter().flatten().copied().collect();
    Array2::from_shape_vec((rows.len(), width), flat).map_err(|e| AnalysisError::numerical(MODEL_NAME, e))
}
