//! Value models for IQ-UCT.
//!
//! Both models implement `iquct_mcts::ValueModel` and keep one regressor
//! per action:
//!
//! - [`LinearModel`]: ridge regression solved exactly on all data seen so far
//! - [`KnnModel`]: mean target of the k nearest stored examples
//!
//! # Example
//!
//! ```
//! use iquct_core::Action;
//! use iquct_mcts::{TrainingExample, ValueModel};
//! use iquct_models::LinearModel;
//!
//! let mut model = LinearModel::new(1e-3).unwrap();
//! let batch: Vec<TrainingExample> = (0..10)
//!     .map(|i| TrainingExample {
//!         action: Action::Discrete(0),
//!         features: vec![i as f64],
//!         target: 2.0 * i as f64,
//!     })
//!     .collect();
//! model.update(&batch).unwrap();
//!
//! let p = model.prediction_at(&Action::Discrete(0), &[4.0]).unwrap();
//! assert!((p - 8.0).abs() < 0.1);
//! ```

mod knn;
mod linalg;
mod linear;

pub use knn::KnnModel;
pub use linear::LinearModel;
