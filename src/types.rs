//! Core data structures shared across the medium simulation.
//!
//! Contains:
//! - The opaque endpoint handle used for delivery addressing
//! - Transmission records for the full-frame and training-field paths
//! - The per-link budget result shared by both send paths

use core::fmt;
use std::cell::RefCell;
use std::rc::Rc;

use crate::antenna::DirectionalAntenna;
use crate::endpoint::FrameSink;
use crate::mobility::PositionProvider;
use crate::time::SimDuration;

/// Opaque handle identifying an endpoint attached to a channel.
///
/// Assigned by `Channel::attach` and stable for the whole run (endpoints are
/// never detached). Deliberately *not* a raw list index at the API surface:
/// in-flight delivery events address receivers through this handle, so the
/// addressing scheme cannot silently break if the internal storage changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EndpointId(pub(crate) u32);

impl EndpointId {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for EndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ep{}", self.0)
    }
}

/// Modulation/rate parameters of a transmission. Opaque to the channel
/// beyond being copied through to the receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDescriptor {
    pub mcs: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreambleType {
    Short,
    Long,
}

/// Frame-aggregation role of an MPDU within a send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregationTag {
    /// Stand-alone frame.
    Single,
    /// Frame inside an A-MPDU, more to follow.
    InAggregate,
    /// Final frame of an A-MPDU.
    LastInAggregate,
}

/// Transmission record carried through a single full-frame send.
///
/// Created fresh per send call and copied per receiver; the payload is a
/// shared handle so per-receiver copies stay cheap. `tx_power_dbm` already
/// includes the sender's own antenna/amplifier gain (the endpoint adapter
/// resolves it before calling the channel).
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub payload: Rc<[u8]>,
    pub tx_power_dbm: f64,
    pub rate: RateDescriptor,
    pub preamble: PreambleType,
    pub aggregation: AggregationTag,
    /// Nominal on-air duration; copied through, never interpreted here.
    pub duration: SimDuration,
}

/// Lightweight record for one beam-training (TRN) field.
///
/// Never carries a payload; `remaining_fields` counts down the current
/// training burst and is carried to the receiver unchanged — only
/// receiver-side beam-refinement logic decrements it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingField {
    pub tx_power_dbm: f64,
    pub rate: RateDescriptor,
    pub remaining_fields: u8,
}

/// Result of the per-link gain/loss/delay/blockage composition, shared by
/// the full-frame and training-field send paths.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkBudget {
    pub delay: SimDuration,
    pub rx_power_dbm: f64,
}

/// One radio interface to attach to the channel.
///
/// The channel takes shared references only; the simulation's device graph
/// remains the owner of position providers, antennas, and receive logic.
pub struct Endpoint {
    /// Owning simulated node, used to attribute delivery events in logs.
    pub node_id: u32,
    /// Partition key: endpoints interact only with others sharing this value.
    pub channel_number: u8,
    pub position: Rc<dyn PositionProvider>,
    /// `None` means no directional antenna; the link then uses the isotropic
    /// 0 dB fallback on both sides.
    pub antenna: Option<Rc<dyn DirectionalAntenna>>,
    /// Inbound delivery hooks for full frames and training fields.
    pub sink: Rc<RefCell<dyn FrameSink>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_id_display_and_index() {
        let id = EndpointId(3);
        assert_eq!(format!("{id}"), "ep3");
        assert_eq!(id.index(), 3);
    }

    #[test]
    fn frame_copies_share_the_payload() {
        let payload: Rc<[u8]> = Rc::from(vec![1u8, 2, 3]);
        let frame = Frame {
            payload: payload.clone(),
            tx_power_dbm: 10.0,
            rate: RateDescriptor { mcs: 4 },
            preamble: PreambleType::Long,
            aggregation: AggregationTag::Single,
            duration: SimDuration::from_micros(12),
        };
        let copy = frame.clone();
        assert_eq!(copy, frame);
        assert!(Rc::ptr_eq(&copy.payload, &frame.payload));
        assert_eq!(Rc::strong_count(&payload), 3);
    }
}
