//! Fault injection: blockage attenuation and packet dropping.
//!
//! Blockage and packet drops are first-class simulated phenomena, not error
//! paths: a matching blockage shifts the received power of a delivery, a
//! matching dropper suppresses one delivery entirely, and nothing at this
//! layer retries or reports either. Both are injected as strategy objects
//! that may hold their own state and are re-evaluated on every matching send
//! or delivery, so a scenario can model time-varying obstruction severity
//! without re-registering.
//!
//! The registry holds at most one blockage binding and one dropper binding
//! at a time, each keyed to an unordered endpoint pair: the binding applies
//! no matter which of the two endpoints is transmitting.

use crate::time::SimTime;
use crate::types::EndpointId;

/// Time-varying attenuation for one link, in dB (negative values attenuate).
///
/// Evaluated fresh for every matching delivery.
pub trait BlockageModel {
    fn attenuation_db(&mut self, now: SimTime) -> f64;
}

/// Per-send drop decision for one link. `true` suppresses the delivery:
/// nothing is scheduled and no power is computed. Models an uncorrelated
/// per-transmission link failure, not per-bit corruption.
pub trait PacketDropper {
    fn should_drop(&mut self, now: SimTime) -> bool;
}

/// Any closure of time works as a blockage model.
impl<F: FnMut(SimTime) -> f64> BlockageModel for F {
    fn attenuation_db(&mut self, now: SimTime) -> f64 {
        self(now)
    }
}

/// Any closure of time works as a dropper.
impl<F: FnMut(SimTime) -> bool> PacketDropper for F {
    fn should_drop(&mut self, now: SimTime) -> bool {
        self(now)
    }
}

/// Fixed attenuation, e.g. -30 dB for a human body at 60 GHz.
#[derive(Debug, Clone, Copy)]
pub struct ConstantBlockage {
    pub attenuation_db: f64,
}

impl BlockageModel for ConstantBlockage {
    fn attenuation_db(&mut self, _now: SimTime) -> f64 {
        self.attenuation_db
    }
}

/// Piecewise-linear attenuation over virtual time.
///
/// Interpolates between `(time, dB)` knots; before the first knot the first
/// value applies, after the last knot the last value applies. Knots must be
/// given in increasing time order. Models an obstruction moving through the
/// link: ramp in, hold, ramp out.
#[derive(Debug, Clone)]
pub struct ScriptedBlockage {
    knots: Vec<(SimTime, f64)>,
}

impl ScriptedBlockage {
    pub fn new(knots: Vec<(SimTime, f64)>) -> Self {
        assert!(!knots.is_empty(), "scripted blockage needs at least one knot");
        assert!(
            knots.windows(2).all(|w| w[0].0 <= w[1].0),
            "scripted blockage knots must be in increasing time order"
        );
        ScriptedBlockage { knots }
    }
}

impl BlockageModel for ScriptedBlockage {
    fn attenuation_db(&mut self, now: SimTime) -> f64 {
        let first = self.knots[0];
        if now <= first.0 {
            return first.1;
        }
        for w in self.knots.windows(2) {
            let (t0, v0) = w[0];
            let (t1, v1) = w[1];
            if now <= t1 {
                let span = t1.duration_since(t0).as_nanos();
                if span == 0 {
                    return v1;
                }
                let frac = now.duration_since(t0).as_nanos() as f64 / span as f64;
                return v0 + (v1 - v0) * frac;
            }
        }
        self.knots[self.knots.len() - 1].1
    }
}

/// Drops each matching send independently with a fixed probability.
#[derive(Debug, Clone, Copy)]
pub struct ProbabilisticDropper {
    pub drop_probability: f64,
}

impl PacketDropper for ProbabilisticDropper {
    fn should_drop(&mut self, _now: SimTime) -> bool {
        rand::random::<f64>() < self.drop_probability
    }
}

/// Drops exactly the first `count` matching sends at or after `from`.
#[derive(Debug, Clone, Copy)]
pub struct ScriptedDropper {
    from: SimTime,
    remaining: u32,
}

impl ScriptedDropper {
    pub fn new(from: SimTime, count: u32) -> Self {
        ScriptedDropper { from, remaining: count }
    }
}

impl PacketDropper for ScriptedDropper {
    fn should_drop(&mut self, now: SimTime) -> bool {
        if now >= self.from && self.remaining > 0 {
            self.remaining -= 1;
            return true;
        }
        false
    }
}

/// Unordered endpoint pair; stored normalized so `{a, b}` and `{b, a}`
/// compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct EndpointPair {
    lo: EndpointId,
    hi: EndpointId,
}

impl EndpointPair {
    pub(crate) fn new(a: EndpointId, b: EndpointId) -> Self {
        if a.0 <= b.0 {
            EndpointPair { lo: a, hi: b }
        } else {
            EndpointPair { lo: b, hi: a }
        }
    }

    pub(crate) fn matches(&self, a: EndpointId, b: EndpointId) -> bool {
        *self == EndpointPair::new(a, b)
    }
}

/// Holds the at-most-one active binding of each fault kind.
#[derive(Default)]
pub(crate) struct FaultRegistry {
    blockage: Option<(Box<dyn BlockageModel>, EndpointPair)>,
    dropper: Option<(Box<dyn PacketDropper>, EndpointPair)>,
}

impl FaultRegistry {
    /// Bind a blockage model to an unordered endpoint pair, replacing any
    /// prior binding.
    pub(crate) fn set_blockage(&mut self, model: Box<dyn BlockageModel>, a: EndpointId, b: EndpointId) {
        if self.blockage.is_some() {
            log::debug!("replacing active blockage binding with {a}<->{b}");
        }
        self.blockage = Some((model, EndpointPair::new(a, b)));
    }

    pub(crate) fn clear_blockage(&mut self) {
        self.blockage = None;
    }

    pub(crate) fn set_dropper(&mut self, dropper: Box<dyn PacketDropper>, a: EndpointId, b: EndpointId) {
        if self.dropper.is_some() {
            log::debug!("replacing active dropper binding with {a}<->{b}");
        }
        self.dropper = Some((dropper, EndpointPair::new(a, b)));
    }

    pub(crate) fn clear_dropper(&mut self) {
        self.dropper = None;
    }

    /// Blockage attenuation for the `{a, b}` link at `now`, or `None` when
    /// no binding matches. Evaluates the model fresh on every call.
    pub(crate) fn blockage_db(&mut self, a: EndpointId, b: EndpointId, now: SimTime) -> Option<f64> {
        match &mut self.blockage {
            Some((model, pair)) if pair.matches(a, b) => Some(model.attenuation_db(now)),
            _ => None,
        }
    }

    /// Whether the dropper suppresses a send over the `{a, b}` link at `now`.
    /// Evaluates the predicate fresh (it may be stateful) only when the pair
    /// matches.
    pub(crate) fn drops(&mut self, a: EndpointId, b: EndpointId, now: SimTime) -> bool {
        match &mut self.dropper {
            Some((dropper, pair)) if pair.matches(a, b) => dropper.should_drop(now),
            _ => false,
        }
    }
}
