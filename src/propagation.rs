//! Propagation loss and delay strategies.
//!
//! Contains:
//! - The pluggable strategy traits the channel composes per link
//! - Friis free-space loss (the usual 60 GHz baseline)
//! - Log-distance path loss with optional log-normal shadowing
//! - Constant-speed propagation delay
//! - dBm/mW conversion helpers
//!
//! Units:
//! - Power: dBm, mW (conversion provided)
//! - Distance: meters
//! - Frequency: Hz

use rand::thread_rng;
use rand_distr::{Distribution, Normal};

use crate::geometry::Position;
use crate::time::SimDuration;

/// Speed of light in vacuum, m/s.
pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;

/// Default carrier frequency: 60.48 GHz, the center of 60 GHz channel 2.
pub const DEFAULT_FREQUENCY_HZ: f64 = 60.48e9;

/// Maps a transmit power and an endpoint position pair to received power.
///
/// Antenna gain is *not* part of the loss model; the channel adds directional
/// gains on top of the value returned here.
pub trait PropagationLossModel {
    fn rx_power_dbm(&self, tx_power_dbm: f64, a: &Position, b: &Position) -> f64;
}

/// Maps an endpoint position pair to a propagation delay.
pub trait PropagationDelayModel {
    fn delay(&self, a: &Position, b: &Position) -> SimDuration;
}

/// Subtracts a fixed loss regardless of distance. Mostly useful in tests and
/// in scenarios that want fully deterministic received power.
#[derive(Debug, Clone, Copy)]
pub struct FixedLossModel {
    pub loss_db: f64,
}

impl PropagationLossModel for FixedLossModel {
    fn rx_power_dbm(&self, tx_power_dbm: f64, _a: &Position, _b: &Position) -> f64 {
        tx_power_dbm - self.loss_db
    }
}

/// Friis free-space path loss.
///
/// # Formula
///
/// ```text
/// FSPL(d) = 20 × log₁₀(4π × d × f / c)
/// ```
///
/// Where:
/// - `d`: Distance in meters (clamped below to 1 meter)
/// - `f`: Carrier frequency in Hz
/// - `c`: Speed of light
///
/// At 60 GHz this is already ≈ 68 dB at 1 meter, which is why directional
/// antenna gain dominates every mmWave link budget.
///
/// # Notes
///
/// - Deterministic: repeated calls with the same positions return the same value
/// - For distances < 1.0 meter, uses the 1 meter loss (near-field is out of model)
#[derive(Debug, Clone, Copy)]
pub struct FriisLossModel {
    pub frequency_hz: f64,
}

impl Default for FriisLossModel {
    fn default() -> Self {
        FriisLossModel {
            frequency_hz: DEFAULT_FREQUENCY_HZ,
        }
    }
}

impl PropagationLossModel for FriisLossModel {
    fn rx_power_dbm(&self, tx_power_dbm: f64, a: &Position, b: &Position) -> f64 {
        let distance = a.distance_to(b).max(1.0);
        let fspl = 20.0 * (4.0 * std::f64::consts::PI * distance * self.frequency_hz / SPEED_OF_LIGHT).log10();
        tx_power_dbm - fspl
    }
}

/// Log-distance path loss with optional log-normal shadowing.
///
/// # Formula
///
/// ```text
/// PL(d) = PL(d₀) + 10 × n × log₁₀(d/d₀) + X_σ
/// where d₀ = 1 meter (reference distance)
/// ```
///
/// Where:
/// - `PL(d₀)`: Path loss at the 1 meter reference distance, `reference_loss_db`
/// - `n`: Path loss exponent, `exponent` (2.0 free space; higher indoors/NLOS)
/// - `X_σ`: Shadowing sampled from Normal(0, σ) dB, σ = `shadowing_sigma_db`
///
/// # Notes
///
/// - For distances < 1.0 meter, returns the reference loss without further attenuation
/// - With `shadowing_sigma_db > 0` every call samples a fresh shadowing value,
///   so repeated sends over the same link see different received powers
#[derive(Debug, Clone, Copy)]
pub struct LogDistanceLossModel {
    /// Path loss exponent (n).
    pub exponent: f64,
    /// Path loss at the reference distance d₀ = 1 m, in dB.
    pub reference_loss_db: f64,
    /// Standard deviation of the log-normal shadowing term, in dB. 0 disables it.
    pub shadowing_sigma_db: f64,
}

impl PropagationLossModel for LogDistanceLossModel {
    fn rx_power_dbm(&self, tx_power_dbm: f64, a: &Position, b: &Position) -> f64 {
        let distance = a.distance_to(b);
        let mut loss = self.reference_loss_db;
        if distance >= 1.0 {
            loss += 10.0 * self.exponent * distance.log10();
        }
        if self.shadowing_sigma_db > 0.0 {
            let normal = Normal::new(0.0, self.shadowing_sigma_db).expect("invalid shadowing sigma");
            loss += normal.sample(&mut thread_rng());
        }
        tx_power_dbm - loss
    }
}

/// Delay = distance / propagation speed, rounded to the nearest nanosecond.
#[derive(Debug, Clone, Copy)]
pub struct ConstantSpeedDelayModel {
    pub speed_mps: f64,
}

impl Default for ConstantSpeedDelayModel {
    fn default() -> Self {
        ConstantSpeedDelayModel { speed_mps: SPEED_OF_LIGHT }
    }
}

impl PropagationDelayModel for ConstantSpeedDelayModel {
    fn delay(&self, a: &Position, b: &Position) -> SimDuration {
        SimDuration::from_secs_f64(a.distance_to(b) / self.speed_mps)
    }
}

/// Convert power from dBm to milliwatts: `P(mW) = 10^(P(dBm) / 10)`.
pub fn dbm_to_mw(dbm: f64) -> f64 {
    10f64.powf(dbm / 10.0)
}

/// Convert power from milliwatts to dBm: `P(dBm) = 10 × log₁₀(P(mW))`.
///
/// Undefined for `mw <= 0` (returns NaN or -∞); power values should always
/// be positive.
pub fn mw_to_dbm(mw: f64) -> f64 {
    10.0 * mw.log10()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::SimDuration;

    fn p(x: f64, y: f64) -> Position {
        Position::new(x, y, 0.0)
    }

    #[test]
    fn fixed_loss_is_distance_independent() {
        let m = FixedLossModel { loss_db: 60.0 };
        assert_eq!(m.rx_power_dbm(10.0, &p(0.0, 0.0), &p(10.0, 0.0)), -50.0);
        assert_eq!(m.rx_power_dbm(10.0, &p(0.0, 0.0), &p(9000.0, 0.0)), -50.0);
    }

    #[test]
    fn friis_reference_loss_at_60ghz() {
        // At 1 m and 60.48 GHz the free-space loss is ≈ 68.1 dB
        let m = FriisLossModel::default();
        let rx = m.rx_power_dbm(0.0, &p(0.0, 0.0), &p(1.0, 0.0));
        assert!((rx + 68.08).abs() < 0.1, "got {rx}");
    }

    #[test]
    fn friis_loses_20db_per_decade() {
        let m = FriisLossModel::default();
        let a = p(0.0, 0.0);
        let rx_1 = m.rx_power_dbm(10.0, &a, &p(1.0, 0.0));
        let rx_10 = m.rx_power_dbm(10.0, &a, &p(10.0, 0.0));
        let rx_100 = m.rx_power_dbm(10.0, &a, &p(100.0, 0.0));
        assert!((rx_1 - rx_10 - 20.0).abs() < 1e-9);
        assert!((rx_10 - rx_100 - 20.0).abs() < 1e-9);
        // Sub-meter distances clamp to the 1 m loss
        assert_eq!(m.rx_power_dbm(10.0, &a, &p(0.2, 0.0)), rx_1);
    }

    #[test]
    fn log_distance_matches_formula_without_shadowing() {
        let m = LogDistanceLossModel {
            exponent: 2.0,
            reference_loss_db: 68.0,
            shadowing_sigma_db: 0.0,
        };
        let rx = m.rx_power_dbm(10.0, &p(0.0, 0.0), &p(100.0, 0.0));
        // 10 - (68 + 10*2*log10(100)) = 10 - 108
        assert!((rx + 98.0).abs() < 1e-9);
        // Below the reference distance only the reference loss applies
        let rx_near = m.rx_power_dbm(10.0, &p(0.0, 0.0), &p(0.5, 0.0));
        assert!((rx_near + 58.0).abs() < 1e-9);
    }

    #[test]
    fn shadowing_varies_between_samples() {
        let m = LogDistanceLossModel {
            exponent: 2.0,
            reference_loss_db: 68.0,
            shadowing_sigma_db: 6.0,
        };
        let a = p(0.0, 0.0);
        let b = p(50.0, 0.0);
        let samples: Vec<f64> = (0..16).map(|_| m.rx_power_dbm(10.0, &a, &b)).collect();
        let first = samples[0];
        assert!(samples.iter().any(|s| (s - first).abs() > 1e-9), "all shadowing samples identical");
    }

    #[test]
    fn constant_speed_delay() {
        let m = ConstantSpeedDelayModel::default();
        let d = m.delay(&p(0.0, 0.0), &p(10.0, 0.0));
        assert_eq!(d, SimDuration::from_secs_f64(10.0 / SPEED_OF_LIGHT));
        assert_eq!(d.as_nanos(), 33);
        assert_eq!(m.delay(&p(3.0, 3.0), &p(3.0, 3.0)), SimDuration::ZERO);
    }

    #[test]
    fn dbm_mw_conversion_roundtrip_reasonable() {
        let vals = [-100.0, -50.0, 0.0, 10.0];
        for v in vals {
            let mw = dbm_to_mw(v);
            let v2 = mw_to_dbm(mw);
            assert!((v - v2).abs() < 1e-9);
        }
        assert!((dbm_to_mw(20.0) - 100.0).abs() < 1e-9);
    }
}
