//! Fixed-versus-floating interest rate swap.
//!
//! Coupons are split between the two adjustment phases according to where
//! their reset falls:
//!
//! - a coupon resetting at or after the valuation date is added, at its reset
//!   time, as the value of the payment discounted back from its pay time
//!   (settlement phase)
//! - a coupon that reset before the valuation date has a known amount and is
//!   added at its pay time (decision phase)
//!
//! A swaption wrapping this swap therefore decides on exercise at a reset
//! time after the coupon starting there has been included.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{AssetState, DiscretizedAsset, DiscretizedDiscountBond};
use crate::error::{LatticeError, LatticeResult};
use crate::lattice::Lattice;

/// Direction of the swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SwapType {
    /// Pays fixed, receives floating.
    Payer,
    /// Receives fixed, pays floating.
    Receiver,
}

/// Cash flow description of a swap in lattice time.
///
/// The vectors of each leg run in parallel, one entry per coupon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapArguments {
    /// Payer or receiver.
    pub swap_type: SwapType,
    /// Notional amount.
    pub nominal: f64,
    /// Fixed coupon reset (accrual start) times.
    pub fixed_reset_times: Vec<f64>,
    /// Fixed coupon pay times.
    pub fixed_pay_times: Vec<f64>,
    /// Fixed coupon amounts.
    pub fixed_coupons: Vec<f64>,
    /// Floating coupon reset times.
    pub floating_reset_times: Vec<f64>,
    /// Floating coupon pay times.
    pub floating_pay_times: Vec<f64>,
    /// Floating coupon accrual periods (year fractions).
    pub floating_accrual_times: Vec<f64>,
    /// Spread over the floating index, per coupon.
    pub floating_spreads: Vec<f64>,
    /// Known floating coupon amounts. Required for coupons that reset before
    /// the valuation date and have not been paid yet.
    pub floating_coupons: Vec<Option<f64>>,
}

impl SwapArguments {
    fn validate(&self) -> LatticeResult<()> {
        let fixed = self.fixed_reset_times.len();
        if self.fixed_pay_times.len() != fixed || self.fixed_coupons.len() != fixed {
            return Err(LatticeError::invalid_input(
                "fixed leg vectors have different lengths",
            ));
        }

        let floating = self.floating_reset_times.len();
        if self.floating_pay_times.len() != floating
            || self.floating_accrual_times.len() != floating
            || self.floating_spreads.len() != floating
            || self.floating_coupons.len() != floating
        {
            return Err(LatticeError::invalid_input(
                "floating leg vectors have different lengths",
            ));
        }

        for i in 0..floating {
            let reset = self.floating_reset_times[i];
            let pay = self.floating_pay_times[i];
            if reset < 0.0 && pay >= 0.0 && self.floating_coupons[i].is_none() {
                return Err(missing_fixing(i, reset));
            }
        }
        Ok(())
    }
}

fn missing_fixing(coupon: usize, reset: f64) -> LatticeError {
    LatticeError::invalid_input(format!(
        "floating coupon {coupon} reset at t = {reset} but has no fixing"
    ))
}

/// Interest rate swap discretized on a short rate lattice.
#[derive(Debug, Clone)]
pub struct DiscretizedSwap {
    state: AssetState,
    arguments: SwapArguments,
}

impl DiscretizedSwap {
    /// Creates a swap from its cash flow description.
    ///
    /// # Errors
    ///
    /// Fails if the leg vectors have inconsistent lengths or a floating
    /// coupon that has already reset lacks its fixing.
    pub fn new(arguments: SwapArguments) -> LatticeResult<Self> {
        arguments.validate()?;
        Ok(Self {
            state: AssetState::new(),
            arguments,
        })
    }

    /// Creates a swap whose legs share a regular schedule.
    ///
    /// Coupons accrue over consecutive periods of `1 / frequency` years from
    /// `start` to `maturity`; the floating leg pays the index flat.
    ///
    /// # Errors
    ///
    /// Fails for a negative start, a maturity not after start, a zero
    /// frequency, or a period count that is not a whole number.
    pub fn regular(
        swap_type: SwapType,
        nominal: f64,
        fixed_rate: f64,
        start: f64,
        maturity: f64,
        frequency: u32,
    ) -> LatticeResult<Self> {
        if start < 0.0 || maturity <= start || frequency == 0 {
            return Err(LatticeError::invalid_input(format!(
                "invalid schedule: start {start}, maturity {maturity}, frequency {frequency}"
            )));
        }

        let tau = 1.0 / f64::from(frequency);
        let periods = (maturity - start) / tau;
        let count = periods.round();
        if (periods - count).abs() > 1e-9 {
            return Err(LatticeError::invalid_input(format!(
                "{} years is not a whole number of {tau}-year periods",
                maturity - start
            )));
        }
        let count = count as usize;

        let resets: Vec<f64> = (0..count).map(|k| start + k as f64 * tau).collect();
        let pays: Vec<f64> = (1..=count)
            .map(|k| if k == count { maturity } else { start + k as f64 * tau })
            .collect();

        Self::new(SwapArguments {
            swap_type,
            nominal,
            fixed_reset_times: resets.clone(),
            fixed_pay_times: pays.clone(),
            fixed_coupons: vec![nominal * fixed_rate * tau; count],
            floating_reset_times: resets,
            floating_pay_times: pays,
            floating_accrual_times: vec![tau; count],
            floating_spreads: vec![0.0; count],
            floating_coupons: vec![None; count],
        })
    }

    /// The cash flow description.
    #[must_use]
    pub fn arguments(&self) -> &SwapArguments {
        &self.arguments
    }

    /// Sign applied to floating coupons; fixed coupons take the opposite.
    fn floating_sign(&self) -> f64 {
        match self.arguments.swap_type {
            SwapType::Payer => 1.0,
            SwapType::Receiver => -1.0,
        }
    }

    /// Per-node value at the current time of 1 paid at `pay_time`.
    fn discount_bond_values(&self, lattice: &Arc<dyn Lattice>, pay_time: f64) -> LatticeResult<Vec<f64>> {
        let pay_time = lattice.time_grid().closest_time(pay_time);
        let mut bond = DiscretizedDiscountBond::new(pay_time);
        bond.initialize(Arc::clone(lattice), pay_time)?;
        bond.rollback(self.time())?;
        Ok(bond.values().to_vec())
    }

    fn add(&mut self, amounts: &[f64], sign: f64) {
        for (value, amount) in self.state.values_mut().iter_mut().zip(amounts) {
            *value += sign * amount;
        }
    }
}

impl DiscretizedAsset for DiscretizedSwap {
    fn state(&self) -> &AssetState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut AssetState {
        &mut self.state
    }

    fn reset(&mut self, size: usize) -> LatticeResult<()> {
        self.state.set_values(vec![0.0; size]);
        Ok(())
    }

    fn mandatory_times(&self) -> Vec<f64> {
        let args = &self.arguments;
        args.fixed_reset_times
            .iter()
            .chain(&args.fixed_pay_times)
            .chain(&args.floating_reset_times)
            .chain(&args.floating_pay_times)
            .copied()
            .filter(|&t| t >= 0.0)
            .collect()
    }

    fn pre_adjust_values_impl(&mut self) -> LatticeResult<()> {
        let lattice = Arc::clone(self.lattice()?);
        let sign = self.floating_sign();
        let nominal = self.arguments.nominal;

        for i in 0..self.arguments.floating_reset_times.len() {
            let reset = self.arguments.floating_reset_times[i];
            if reset >= 0.0 && self.is_on_time(reset) {
                let bond = self.discount_bond_values(&lattice, self.arguments.floating_pay_times[i])?;
                let accrued_spread = nominal
                    * self.arguments.floating_accrual_times[i]
                    * self.arguments.floating_spreads[i];
                let coupons: Vec<f64> = bond
                    .iter()
                    .map(|df| nominal * (1.0 - df) + accrued_spread * df)
                    .collect();
                self.add(&coupons, sign);
            }
        }

        for i in 0..self.arguments.fixed_reset_times.len() {
            let reset = self.arguments.fixed_reset_times[i];
            if reset >= 0.0 && self.is_on_time(reset) {
                let bond = self.discount_bond_values(&lattice, self.arguments.fixed_pay_times[i])?;
                let fixed = self.arguments.fixed_coupons[i];
                let coupons: Vec<f64> = bond.iter().map(|df| fixed * df).collect();
                self.add(&coupons, -sign);
            }
        }
        Ok(())
    }

    fn post_adjust_values_impl(&mut self) -> LatticeResult<()> {
        let sign = self.floating_sign();
        let size = self.values().len();

        for i in 0..self.arguments.fixed_pay_times.len() {
            let pay = self.arguments.fixed_pay_times[i];
            if self.arguments.fixed_reset_times[i] < 0.0 && pay >= 0.0 && self.is_on_time(pay) {
                let amounts = vec![self.arguments.fixed_coupons[i]; size];
                self.add(&amounts, -sign);
            }
        }

        for i in 0..self.arguments.floating_pay_times.len() {
            let reset = self.arguments.floating_reset_times[i];
            let pay = self.arguments.floating_pay_times[i];
            if reset < 0.0 && pay >= 0.0 && self.is_on_time(pay) {
                let coupon = self.arguments.floating_coupons[i].ok_or_else(|| missing_fixing(i, reset))?;
                self.add(&vec![coupon; size], sign);
            }
        }
        Ok(())
    }
}
