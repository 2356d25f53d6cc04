pub mod features;

pub use features::LaggedFeatures;
