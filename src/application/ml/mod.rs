pub mod baselines;
pub mod cross_validation;
pub mod evaluation;
pub mod mlp;
pub mod predictor;

pub use baselines::{LinearBaseline, POLY_EXPANSION, PolynomialBaseline};
pub use cross_validation::{CrossValidated, FoldSplit, KFold, train_with_cross_validation};
pub use evaluation::evaluate_model;
pub use mlp::{MlpParams, MlpRegressor};
pub use predictor::Regressor;
