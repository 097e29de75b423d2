//! Directional antenna gain models.
//!
//! At 60 GHz the link budget lives or dies on antenna gain, so the channel
//! treats the gain provider as a first-class strategy: a pure function from
//! relative azimuth to gain in dB, evaluated independently at the transmit
//! and receive side of each link. Gain terms are applied only when *both*
//! endpoints of a link expose a directional antenna; otherwise the link falls
//! back to 0 dB (isotropic) on both sides.

use std::cell::Cell;
use std::f64::consts::{PI, TAU};

/// Gain provider queried per link per send.
///
/// The receive pattern defaults to the transmit pattern (reciprocity), which
/// is the common case for switched sector antennas; implementations with
/// asymmetric patterns override `rx_gain_db`.
pub trait DirectionalAntenna {
    /// Transmit gain in dB toward the given azimuth (radians).
    fn tx_gain_db(&self, azimuth_rad: f64) -> f64;

    /// Receive gain in dB from the given azimuth (radians).
    fn rx_gain_db(&self, azimuth_rad: f64) -> f64 {
        self.tx_gain_db(azimuth_rad)
    }
}

/// 0 dB in every direction.
#[derive(Debug, Clone, Copy, Default)]
pub struct Isotropic;

impl DirectionalAntenna for Isotropic {
    fn tx_gain_db(&self, _azimuth_rad: f64) -> f64 {
        0.0
    }
}

/// Idealized switched-sector pattern: a flat main lobe centered on the
/// current boresight, a flat side-lobe floor everywhere else.
///
/// The boresight is interior-mutable so beam-training logic can steer the
/// antenna between training fields while the channel keeps holding the same
/// shared reference. This is a two-level approximation of a real mmWave
/// phased-array pattern; it is deliberately simple but preserves the property
/// experiments care about: gain changes sharply when a link leaves the lobe.
#[derive(Debug)]
pub struct SectoredAntenna {
    boresight_rad: Cell<f64>,
    beamwidth_rad: f64,
    main_lobe_gain_db: f64,
    side_lobe_gain_db: f64,
}

impl SectoredAntenna {
    /// # Parameters
    ///
    /// * `boresight_rad` - Initial main-lobe center, radians from +x axis
    /// * `beamwidth_rad` - Full main-lobe width; must be in (0, 2π]
    /// * `main_lobe_gain_db` - Gain inside the lobe
    /// * `side_lobe_gain_db` - Gain everywhere else (typically negative)
    pub fn new(boresight_rad: f64, beamwidth_rad: f64, main_lobe_gain_db: f64, side_lobe_gain_db: f64) -> Self {
        assert!(
            beamwidth_rad > 0.0 && beamwidth_rad <= TAU,
            "sector beamwidth must be in (0, 2\u{3c0}], got {beamwidth_rad}"
        );
        SectoredAntenna {
            boresight_rad: Cell::new(boresight_rad),
            beamwidth_rad,
            main_lobe_gain_db,
            side_lobe_gain_db,
        }
    }

    pub fn boresight_rad(&self) -> f64 {
        self.boresight_rad.get()
    }

    /// Steer the main lobe to a new boresight. Takes effect on the next gain
    /// lookup; deliveries already scheduled keep their computed power.
    pub fn steer(&self, boresight_rad: f64) {
        self.boresight_rad.set(boresight_rad);
    }

    fn in_main_lobe(&self, azimuth_rad: f64) -> bool {
        angular_separation(azimuth_rad, self.boresight_rad.get()) <= self.beamwidth_rad / 2.0
    }
}

impl DirectionalAntenna for SectoredAntenna {
    fn tx_gain_db(&self, azimuth_rad: f64) -> f64 {
        if self.in_main_lobe(azimuth_rad) {
            self.main_lobe_gain_db
        } else {
            self.side_lobe_gain_db
        }
    }
}

/// Smallest absolute angle between two bearings, in [0, π].
fn angular_separation(a: f64, b: f64) -> f64 {
    let d = (a - b).rem_euclid(TAU);
    if d > PI { TAU - d } else { d }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_4;

    #[test]
    fn isotropic_is_flat() {
        for az in [-PI, -1.0, 0.0, 2.5, PI] {
            assert_eq!(Isotropic.tx_gain_db(az), 0.0);
            assert_eq!(Isotropic.rx_gain_db(az), 0.0);
        }
    }

    #[test]
    fn sector_main_lobe_vs_side_lobe() {
        // 90° lobe centered on +x, 20 dB main, -10 dB floor
        let ant = SectoredAntenna::new(0.0, FRAC_PI_4 * 2.0, 20.0, -10.0);
        assert_eq!(ant.tx_gain_db(0.0), 20.0);
        assert_eq!(ant.tx_gain_db(FRAC_PI_4), 20.0); // lobe edge inclusive
        assert_eq!(ant.tx_gain_db(FRAC_PI_4 + 0.01), -10.0);
        assert_eq!(ant.tx_gain_db(PI), -10.0);
        // Reciprocal by default
        assert_eq!(ant.rx_gain_db(0.0), 20.0);
    }

    #[test]
    fn sector_handles_wraparound_at_pi() {
        // Lobe centered on the -x axis spans the ±π seam
        let ant = SectoredAntenna::new(PI, 1.0, 15.0, -5.0);
        assert_eq!(ant.tx_gain_db(PI - 0.4), 15.0);
        assert_eq!(ant.tx_gain_db(-PI + 0.4), 15.0);
        assert_eq!(ant.tx_gain_db(0.0), -5.0);
    }

    #[test]
    fn steering_moves_the_lobe() {
        let ant = SectoredAntenna::new(0.0, 1.0, 18.0, -8.0);
        assert_eq!(ant.tx_gain_db(FRAC_PI_4 * 2.0), -8.0);
        ant.steer(FRAC_PI_4 * 2.0);
        assert_eq!(ant.tx_gain_db(FRAC_PI_4 * 2.0), 18.0);
        assert_eq!(ant.tx_gain_db(0.0), -8.0);
    }

    #[test]
    #[should_panic(expected = "beamwidth")]
    fn zero_beamwidth_is_rejected() {
        let _ = SectoredAntenna::new(0.0, 0.0, 10.0, -10.0);
    }
}
