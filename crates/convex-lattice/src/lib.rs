//! # Convex Lattice
//!
//! Backward-induction valuation on numerical lattices for the Convex analytics
//! library.
//!
//! This crate provides:
//!
//! - **Time grids**: Uniform grids and grids built around mandatory times
//! - **Lattices**: Deterministic discounting, CRR equity trees, Hull-White
//!   short rate trees
//! - **Discretized assets**: Discount bonds, vanilla options, swaps,
//!   convertibles, and options on any of them
//! - **Engine**: Stopping-time merging and the rollback driver
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use convex_lattice::prelude::*;
//!
//! // One-year American put on a 100-step binomial tree
//! let config = LatticeConfig::default().with_steps(100);
//! let grid = build_uniform_grid(&[1.0], &config).unwrap();
//! let lattice: Arc<dyn Lattice> =
//!     Arc::new(BlackScholesLattice::new(100.0, 0.05, 0.0, 0.2, grid).unwrap());
//!
//! let mut put = DiscretizedVanillaOption::new(
//!     PlainVanillaPayoff::new(OptionType::Put, 100.0),
//!     Exercise::american(0.0, 1.0).unwrap(),
//! );
//! let engine = RollbackEngine::new(config).unwrap();
//! let value = engine.price(&mut put, lattice).unwrap();
//! assert!(value > 5.5 && value < 6.5);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::similar_names)]
#![allow(clippy::float_cmp)]
#![allow(clippy::unnecessary_map_or)]
#![allow(clippy::needless_range_loop)]

pub mod closeness;
pub mod config;
pub mod discretized;
pub mod engine;
pub mod error;
pub mod exercise;
pub mod lattice;
pub mod models;
pub mod time_grid;

/// Prelude module for convenient imports.
pub mod prelude {
    // Configuration
    pub use crate::config::{LatticeConfig, Validate, ValidationError};

    // Discretized assets
    pub use crate::discretized::{
        AssetState, CallabilityKind, CallabilitySchedule, CashFlow, ConvertibleArguments,
        DiscretizedAsset, DiscretizedConvertible, DiscretizedDiscountBond, DiscretizedOption,
        DiscretizedSwap, DiscretizedVanillaOption, OptionType, PlainVanillaPayoff, SwapArguments,
        SwapType,
    };

    // Engine
    pub use crate::engine::{
        build_time_grid, build_uniform_grid, merge_mandatory_times, RollbackEngine,
    };

    // Errors
    pub use crate::error::{LatticeError, LatticeResult};

    // Exercise
    pub use crate::exercise::{Exercise, ExerciseType};

    // Lattices and models
    pub use crate::lattice::{BlackScholesLattice, DeterministicLattice, Lattice, ShortRateTree};
    pub use crate::models::{HullWhite, ModelError, ShortRateModel};

    // Time
    pub use crate::time_grid::TimeGrid;
}

pub use config::LatticeConfig;
pub use discretized::{
    DiscretizedAsset, DiscretizedConvertible, DiscretizedDiscountBond, DiscretizedOption,
    DiscretizedSwap, DiscretizedVanillaOption,
};
pub use engine::RollbackEngine;
pub use error::{LatticeError, LatticeResult};
pub use exercise::{Exercise, ExerciseType};
pub use lattice::{BlackScholesLattice, DeterministicLattice, Lattice, ShortRateTree};
pub use time_grid::TimeGrid;
