//! Directional wireless medium simulation for 60 GHz (mmWave) links.
//!
//! This crate simulates the shared medium of a millimeter-wave link-layer
//! testbed: for every transmitted frame or beam-training field it decides
//! which receivers hear it, at what received power, after what propagation
//! delay, and whether an externally injected fault (blockage or packet drop)
//! must alter or suppress the delivery. Everything above the medium — sector
//! sweeps, beam refinement state machines, scheduling, traffic — is the
//! caller's code, attached through the endpoint adapter's hooks.
//!
//! ## Module Organization
//!
//! - `time`: Virtual timestamps and durations for the discrete-event core
//! - `scheduler`: Single-threaded event queue with stable equal-time ordering
//! - `geometry`: Positions, distances, and azimuth bearings
//! - `mobility`: Position providers queried per send
//! - `antenna`: Directional antenna gain strategies
//! - `propagation`: Loss and delay model strategies
//! - `fault`: Blockage and packet-dropper injection
//! - `types`: Transmission records and the endpoint handle
//! - `channel`: The medium itself — broadcast, link budget, delivery
//! - `endpoint`: PHY-facing adapter and inbound delivery hooks
//! - `scene`: JSON scenario configuration, validation, and instantiation
//!
//! ## Example
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use mmwave_channel_simulator::{
//!     Channel, ConstantPosition, ConstantSpeedDelayModel, DeliveryQueue, Endpoint,
//!     FriisLossModel, PhyAdapter, RecordingSink,
//! };
//! use mmwave_channel_simulator::types::{AggregationTag, PreambleType, RateDescriptor};
//! use mmwave_channel_simulator::time::SimDuration;
//!
//! let channel = Channel::new(
//!     Box::new(FriisLossModel::default()),
//!     Box::new(ConstantSpeedDelayModel::default()),
//! );
//!
//! let tx_sink = Rc::new(RefCell::new(RecordingSink::default()));
//! let rx_sink = Rc::new(RefCell::new(RecordingSink::default()));
//! let tx = channel.attach(Endpoint {
//!     node_id: 1,
//!     channel_number: 2,
//!     position: Rc::new(ConstantPosition::new(0.0, 0.0, 0.0)),
//!     antenna: None,
//!     sink: tx_sink,
//! });
//! channel.attach(Endpoint {
//!     node_id: 2,
//!     channel_number: 2,
//!     position: Rc::new(ConstantPosition::new(5.0, 0.0, 0.0)),
//!     antenna: None,
//!     sink: rx_sink.clone(),
//! });
//!
//! let adapter = PhyAdapter::new(tx, vec![10.0], 0.0);
//! let mut queue = DeliveryQueue::new();
//! adapter.transmit(
//!     &channel,
//!     &mut queue,
//!     Rc::from(vec![0u8; 128]),
//!     0,
//!     RateDescriptor { mcs: 4 },
//!     PreambleType::Long,
//!     AggregationTag::Single,
//!     SimDuration::from_micros(15),
//! );
//! channel.run_to_end(&mut queue);
//! assert_eq!(rx_sink.borrow().frames.len(), 1);
//! ```

pub mod antenna;
pub mod channel;
pub mod endpoint;
pub mod fault;
pub mod geometry;
pub mod mobility;
pub mod propagation;
pub mod scene;
pub mod scheduler;
pub mod time;
pub mod types;

// Re-export the types most scenarios touch
pub use antenna::{DirectionalAntenna, Isotropic, SectoredAntenna};
pub use channel::{Channel, DeliveryQueue};
pub use endpoint::{FrameSink, PhyAdapter, RecordingSink};
pub use fault::{BlockageModel, ConstantBlockage, PacketDropper, ProbabilisticDropper, ScriptedBlockage, ScriptedDropper};
pub use geometry::Position;
pub use mobility::{ConstantPosition, PositionProvider};
pub use propagation::{
    ConstantSpeedDelayModel, FixedLossModel, FriisLossModel, LogDistanceLossModel, PropagationDelayModel, PropagationLossModel,
};
pub use scene::{load_scene, parse_scene, validate_scene, Scene};
pub use time::{SimDuration, SimTime};
pub use types::{Endpoint, EndpointId, Frame, LinkBudget, TrainingField};
