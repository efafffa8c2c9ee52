//! Convertible bond with call and put provisions.
//!
//! Valued with the Tsiveriotis-Fernandes split: the part of the bond expected
//! to end up as equity is discounted at the risk-free rate and the part
//! expected to stay debt at the risk-free rate plus the issuer's credit
//! spread. Each node carries a conversion probability that is rolled back
//! with the values and blends the two rates.
//!
//! At each stop the competing provisions are applied in this order:
//!
//! 1. conversion, where the conversion schedule allows it and the shares are
//!    worth at least the holding value floored by any put due at this stop
//! 2. calls and puts, on nodes not converted at this stop
//! 3. coupons due at this stop

use serde::{Deserialize, Serialize};

use super::{AssetState, DiscretizedAsset};
use crate::closeness::close_enough;
use crate::error::{LatticeError, LatticeResult};
use crate::exercise::Exercise;
use crate::lattice::Lattice;

/// Issuer call or holder put.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CallabilityKind {
    /// Issuer may redeem at the call price.
    Call,
    /// Holder may sell back at the put price.
    Put,
}

/// One call or put date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CallabilitySchedule {
    /// Time of the call or put.
    pub time: f64,
    /// Call or put price.
    pub price: f64,
    /// Call or put.
    pub kind: CallabilityKind,
    /// Soft-call trigger as a multiple of the conversion price; the call is
    /// only possible where the stock trades at or above it.
    #[serde(default)]
    pub trigger: Option<f64>,
}

/// A dated amount (coupon or dividend).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CashFlow {
    /// Payment time.
    pub time: f64,
    /// Amount paid.
    pub amount: f64,
}

/// Terms and market inputs of a convertible bond.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvertibleArguments {
    /// Amount repaid at maturity if not converted.
    pub redemption: f64,
    /// Shares received per bond on conversion.
    pub conversion_ratio: f64,
    /// Issuer credit spread (continuously compounded).
    pub credit_spread: f64,
    /// Risk-free rate (continuously compounded).
    pub risk_free_rate: f64,
    /// When conversion is allowed.
    pub exercise: Exercise,
    /// Call and put schedule.
    #[serde(default)]
    pub callabilities: Vec<CallabilitySchedule>,
    /// Coupon payments.
    #[serde(default)]
    pub coupons: Vec<CashFlow>,
    /// Cash dividends on the stock.
    #[serde(default)]
    pub dividends: Vec<CashFlow>,
}

/// Convertible bond discretized on an equity lattice.
#[derive(Debug, Clone)]
pub struct DiscretizedConvertible {
    state: AssetState,
    arguments: ConvertibleArguments,
    conversion_probability: Vec<f64>,
    spread_adjusted_rate: Vec<f64>,
    dividend_values: Vec<f64>,
}

impl DiscretizedConvertible {
    /// Creates the convertible.
    ///
    /// # Errors
    ///
    /// Fails for a non-positive redemption or conversion ratio.
    pub fn new(arguments: ConvertibleArguments) -> LatticeResult<Self> {
        if !(arguments.redemption > 0.0 && arguments.redemption.is_finite()) {
            return Err(LatticeError::invalid_input(format!(
                "redemption must be positive, got {}",
                arguments.redemption
            )));
        }
        if !(arguments.conversion_ratio > 0.0 && arguments.conversion_ratio.is_finite()) {
            return Err(LatticeError::invalid_input(format!(
                "conversion ratio must be positive, got {}",
                arguments.conversion_ratio
            )));
        }

        let rate = arguments.risk_free_rate;
        let dividend_values = arguments
            .dividends
            .iter()
            .map(|d| {
                if d.time >= 0.0 {
                    d.amount * (-rate * d.time).exp()
                } else {
                    0.0
                }
            })
            .collect();

        Ok(Self {
            state: AssetState::new(),
            arguments,
            conversion_probability: Vec::new(),
            spread_adjusted_rate: Vec::new(),
            dividend_values,
        })
    }

    /// The bond terms.
    #[must_use]
    pub fn arguments(&self) -> &ConvertibleArguments {
        &self.arguments
    }

    /// Per-node probability of ending up converted.
    #[must_use]
    pub fn conversion_probability(&self) -> &[f64] {
        &self.conversion_probability
    }

    /// Per-node blended discount rate.
    #[must_use]
    pub fn spread_adjusted_rate(&self) -> &[f64] {
        &self.spread_adjusted_rate
    }

    /// Present value of each dividend (zero for past dividends).
    #[must_use]
    pub fn dividend_values(&self) -> &[f64] {
        &self.dividend_values
    }

    /// Stock price per node with future dividends added back.
    ///
    /// The lattice spot is net of dividends; conversion decisions compare
    /// against the cum-dividend price.
    ///
    /// # Errors
    ///
    /// Fails if the asset is unbound or its time is off the grid.
    pub fn adjusted_grid(&self) -> LatticeResult<Vec<f64>> {
        let t = self.time();
        let mut grid = self.lattice()?.grid(t)?;

        for dividend in &self.arguments.dividends {
            if dividend.time >= t || close_enough(dividend.time, t) {
                let value = dividend.amount
                    * (-self.arguments.risk_free_rate * (dividend.time - t).max(0.0)).exp();
                grid.iter_mut().for_each(|s| *s += value);
            }
        }
        Ok(grid)
    }

    fn blended_rate(&self, probability: f64) -> f64 {
        let r = self.arguments.risk_free_rate;
        probability * r + (1.0 - probability) * (r + self.arguments.credit_spread)
    }

    fn refresh_rates(&mut self) {
        self.spread_adjusted_rate = self
            .conversion_probability
            .iter()
            .map(|&p| self.blended_rate(p))
            .collect();
    }

    fn is_convertible_now(&self) -> LatticeResult<bool> {
        self.arguments
            .exercise
            .is_exercisable_at(self.time(), |t| self.is_on_time(t))
    }

    /// Converts wherever the conversion value is at least the holding value
    /// floored at `put_floor`.
    ///
    /// Returns the nodes converted.
    fn apply_convertibility(&mut self, spots: &[f64], put_floor: f64) -> Vec<bool> {
        let ratio = self.arguments.conversion_ratio;
        let values = self.state.values_mut();

        values
            .iter_mut()
            .zip(&mut self.conversion_probability)
            .zip(spots)
            .map(|((value, probability), &spot)| {
                let payoff = ratio * spot;
                if value.max(put_floor) <= payoff {
                    *value = payoff;
                    *probability = 1.0;
                    true
                } else {
                    false
                }
            })
            .collect()
    }

    fn apply_callability(
        &mut self,
        callability: &CallabilitySchedule,
        convertible: bool,
        spots: &[f64],
        converted: &[bool],
    ) {
        let ratio = self.arguments.conversion_ratio;
        let trigger_level = callability
            .trigger
            .map(|trigger| self.arguments.redemption / ratio * trigger);
        let values = self.state.values_mut();

        for (j, value) in values.iter_mut().enumerate() {
            if converted[j] {
                continue;
            }
            let conversion_value = ratio * spots[j];

            match callability.kind {
                CallabilityKind::Put => *value = value.max(callability.price),
                CallabilityKind::Call => {
                    let holder_can_convert = match trigger_level {
                        Some(level) if spots[j] < level => continue,
                        Some(_) => true,
                        None => convertible,
                    };
                    if holder_can_convert {
                        let cap = callability.price.max(conversion_value);
                        if cap < *value {
                            *value = cap;
                            // Called holders convert when shares are worth more
                            if conversion_value >= callability.price {
                                self.conversion_probability[j] = 1.0;
                            }
                        }
                    } else {
                        *value = value.min(callability.price);
                    }
                }
            }
        }
    }
}

impl DiscretizedAsset for DiscretizedConvertible {
    fn state(&self) -> &AssetState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut AssetState {
        &mut self.state
    }

    fn reset(&mut self, size: usize) -> LatticeResult<()> {
        self.state.set_values(vec![self.arguments.redemption; size]);
        self.conversion_probability = vec![0.0; size];
        self.spread_adjusted_rate = vec![0.0; size];

        self.adjust_values()?;
        self.refresh_rates();
        Ok(())
    }

    fn mandatory_times(&self) -> Vec<f64> {
        let args = &self.arguments;
        args.exercise
            .future_times()
            .chain(args.callabilities.iter().map(|c| c.time))
            .chain(args.coupons.iter().map(|c| c.time))
            .filter(|&t| t >= 0.0)
            .collect()
    }

    fn step_back(&mut self, lattice: &dyn Lattice, i: usize) -> LatticeResult<()> {
        let expected = lattice.size(i + 1);
        let values = self.state.values();
        if values.len() != expected {
            return Err(LatticeError::size_mismatch(expected, values.len()));
        }

        let dt = lattice.time_grid().dt(i);
        let size = lattice.size(i);
        let mut new_values = vec![0.0; size];
        let mut new_probability = vec![0.0; size];

        for j in 0..size {
            for branch in 0..lattice.branches() {
                let k = lattice.descendant(i, j, branch);
                let p = lattice.probability(i, j, branch);
                new_values[j] += p * values[k] * (-self.spread_adjusted_rate[k] * dt).exp();
                new_probability[j] += p * self.conversion_probability[k];
            }
        }

        self.state.set_values(new_values);
        self.conversion_probability = new_probability;
        self.refresh_rates();
        Ok(())
    }

    fn post_adjust_values_impl(&mut self) -> LatticeResult<()> {
        let convertible = self.is_convertible_now()?;
        let spots = self.adjusted_grid()?;

        let callabilities: Vec<CallabilitySchedule> = self
            .arguments
            .callabilities
            .iter()
            .filter(|c| c.time >= 0.0 && self.is_on_time(c.time))
            .copied()
            .collect();
        let put_floor = callabilities
            .iter()
            .filter(|c| c.kind == CallabilityKind::Put)
            .map(|c| c.price)
            .fold(f64::NEG_INFINITY, f64::max);

        let converted = if convertible {
            self.apply_convertibility(&spots, put_floor)
        } else {
            vec![false; spots.len()]
        };

        for callability in &callabilities {
            self.apply_callability(callability, convertible, &spots, &converted);
        }

        let coupon: f64 = self
            .arguments
            .coupons
            .iter()
            .filter(|c| c.time >= 0.0 && self.is_on_time(c.time))
            .map(|c| c.amount)
            .sum();
        if coupon != 0.0 {
            self.state.values_mut().iter_mut().for_each(|v| *v += coupon);
        }

        self.refresh_rates();
        Ok(())
    }
}
