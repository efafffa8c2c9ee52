//! Zero-coupon bond paying 1 at maturity.

use super::{AssetState, DiscretizedAsset};
use crate::error::LatticeResult;

/// Unit discount bond.
///
/// Every node is worth 1 at maturity; the lattice's discounting during
/// rollback supplies the value. No adjustments.
#[derive(Debug, Clone)]
pub struct DiscretizedDiscountBond {
    state: AssetState,
    maturity: f64,
}

impl DiscretizedDiscountBond {
    /// Creates a discount bond maturing at `maturity`.
    #[must_use]
    pub fn new(maturity: f64) -> Self {
        Self {
            state: AssetState::new(),
            maturity,
        }
    }

    /// Maturity in lattice time.
    #[must_use]
    pub fn maturity(&self) -> f64 {
        self.maturity
    }
}

impl DiscretizedAsset for DiscretizedDiscountBond {
    fn state(&self) -> &AssetState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut AssetState {
        &mut self.state
    }

    fn reset(&mut self, size: usize) -> LatticeResult<()> {
        self.state.set_values(vec![1.0; size]);
        Ok(())
    }

    fn mandatory_times(&self) -> Vec<f64> {
        if self.maturity >= 0.0 {
            vec![self.maturity]
        } else {
            Vec::new()
        }
    }
}
