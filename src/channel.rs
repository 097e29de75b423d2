//! The shared directional medium.
//!
//! The channel owns the list of attached endpoints, the propagation model
//! pair, and the fault-injection registry. For every send it decides which
//! receivers hear the transmission, at what received power, and after what
//! propagation delay, then schedules one delivery event per eligible
//! receiver. Two send paths exist over one shared link-budget computation:
//! full frames (`send`) and payload-free beam-training fields (`send_trn`).
//!
//! High-level flow of a send:
//! 1) Snapshot the endpoint count and iterate every other attached endpoint.
//! 2) Skip receivers on a different channel number, and (frames only)
//!    receivers whose link the active dropper suppresses.
//! 3) Compose loss, directional gains, and blockage into a per-link budget.
//! 4) Schedule a delivery event after the link's propagation delay,
//!    attributed to the receiver's owning node.
//!
//! The channel holds no per-transmission state after scheduling, and a
//! scheduled delivery always fires — there is no cancellation.

use std::cell::RefCell;
use std::rc::Rc;

use crate::antenna::DirectionalAntenna;
use crate::fault::{BlockageModel, FaultRegistry, PacketDropper};
use crate::geometry::Position;
use crate::propagation::{PropagationDelayModel, PropagationLossModel};
use crate::scheduler::EventQueue;
use crate::time::SimTime;
use crate::types::{Endpoint, EndpointId, Frame, LinkBudget, TrainingField};

/// Event queue carrying this channel's pending deliveries.
pub type DeliveryQueue = EventQueue<Delivery>;

/// A scheduled delivery to one receiver. Opaque outside the channel; it only
/// travels through the [`DeliveryQueue`] and back into [`Channel::deliver`].
pub struct Delivery(DeliveryKind);

enum DeliveryKind {
    Frame {
        receiver: EndpointId,
        node_id: u32,
        frame: Frame,
        rx_power_dbm: f64,
    },
    Training {
        receiver: EndpointId,
        node_id: u32,
        field: TrainingField,
        rx_power_dbm: f64,
    },
}

/// Per-receiver data captured under a short borrow of the endpoint table, so
/// that position and gain lookups run with the table released.
struct EndpointView {
    id: EndpointId,
    node_id: u32,
    channel_number: u8,
    position: Rc<dyn crate::mobility::PositionProvider>,
    antenna: Option<Rc<dyn DirectionalAntenna>>,
}

/// The shared medium for one simulated network.
///
/// Constructed once with its loss and delay strategies; endpoints attach
/// during setup and are never detached. All methods take `&self`: the
/// channel is single-threaded and uses interior mutability so that delivery
/// hooks may attach further endpoints or rebind faults mid-run.
pub struct Channel {
    endpoints: RefCell<Vec<Endpoint>>,
    loss_model: Box<dyn PropagationLossModel>,
    delay_model: Box<dyn PropagationDelayModel>,
    faults: RefCell<FaultRegistry>,
}

impl Channel {
    pub fn new(loss_model: Box<dyn PropagationLossModel>, delay_model: Box<dyn PropagationDelayModel>) -> Self {
        Channel {
            endpoints: RefCell::new(Vec::new()),
            loss_model,
            delay_model,
            faults: RefCell::new(FaultRegistry::default()),
        }
    }

    /// Attach an endpoint to the medium, returning its stable handle.
    pub fn attach(&self, endpoint: Endpoint) -> EndpointId {
        let mut endpoints = self.endpoints.borrow_mut();
        let id = EndpointId(endpoints.len() as u32);
        log::debug!("attach {id} (node {}, channel number {})", endpoint.node_id, endpoint.channel_number);
        endpoints.push(endpoint);
        id
    }

    pub fn endpoint_count(&self) -> usize {
        self.endpoints.borrow().len()
    }

    /// Broadcast a full frame from `sender` to every eligible receiver.
    ///
    /// For each other attached endpoint: skips it when the channel numbers
    /// differ; skips it entirely (nothing scheduled, no power computed) when
    /// the active dropper suppresses the link; otherwise computes the link
    /// budget and schedules a delivery event after the propagation delay.
    /// The frame is copied per receiver; deliveries to different receivers
    /// are independent.
    ///
    /// Sending from an endpoint that was never attached is a topology
    /// programming error and panics.
    pub fn send(&self, queue: &mut DeliveryQueue, sender: EndpointId, frame: Frame) {
        let sender_view = self.view(sender).unwrap_or_else(|| {
            panic!("send from {sender}, which is not attached to this channel");
        });
        let sender_pos = sender_view.position.position();
        let now = queue.now();
        let count = self.endpoints.borrow().len();

        for index in 0..count {
            if index == sender.index() {
                continue;
            }
            let receiver = self.view(EndpointId(index as u32)).expect("snapshot index in range");
            if receiver.channel_number != sender_view.channel_number {
                continue;
            }
            if self.faults.borrow_mut().drops(sender, receiver.id, now) {
                log::debug!("t={now} dropper suppressed {sender}->{} for this send", receiver.id);
                continue;
            }
            let budget = self.compute_budget(frame.tx_power_dbm, &sender_view, sender_pos, &receiver, now);
            log::trace!(
                "t={now} frame {sender}->{} (node {}): rx {:.1} dBm after {}",
                receiver.id,
                receiver.node_id,
                budget.rx_power_dbm,
                budget.delay
            );
            queue.schedule_after(
                budget.delay,
                Delivery(DeliveryKind::Frame {
                    receiver: receiver.id,
                    node_id: receiver.node_id,
                    frame: frame.clone(),
                    rx_power_dbm: budget.rx_power_dbm,
                }),
            );
        }
    }

    /// Broadcast one beam-training field from `sender`.
    ///
    /// Mirrors [`Channel::send`] minus the dropper check, payload, and
    /// duration handling, and delivers through the training-field hook with
    /// the field's countdown carried unchanged.
    pub fn send_trn(&self, queue: &mut DeliveryQueue, sender: EndpointId, field: TrainingField) {
        let sender_view = self.view(sender).unwrap_or_else(|| {
            panic!("send_trn from {sender}, which is not attached to this channel");
        });
        let sender_pos = sender_view.position.position();
        let now = queue.now();
        let count = self.endpoints.borrow().len();

        for index in 0..count {
            if index == sender.index() {
                continue;
            }
            let receiver = self.view(EndpointId(index as u32)).expect("snapshot index in range");
            if receiver.channel_number != sender_view.channel_number {
                continue;
            }
            let budget = self.compute_budget(field.tx_power_dbm, &sender_view, sender_pos, &receiver, now);
            log::trace!(
                "t={now} trn {sender}->{} (node {}, {} fields left): rx {:.1} dBm after {}",
                receiver.id,
                receiver.node_id,
                field.remaining_fields,
                budget.rx_power_dbm,
                budget.delay
            );
            queue.schedule_after(
                budget.delay,
                Delivery(DeliveryKind::Training {
                    receiver: receiver.id,
                    node_id: receiver.node_id,
                    field,
                    rx_power_dbm: budget.rx_power_dbm,
                }),
            );
        }
    }

    /// Link budget between two attached endpoints for a given transmit power
    /// at the current virtual time: delay from the delay model, received
    /// power composed from loss, directional gains (0 dB fallback unless both
    /// sides are directional), and any matching blockage attenuation.
    pub fn link_budget(&self, queue: &DeliveryQueue, sender: EndpointId, receiver: EndpointId, tx_power_dbm: f64) -> LinkBudget {
        let sender_view = self
            .view(sender)
            .unwrap_or_else(|| panic!("link_budget: {sender} is not attached to this channel"));
        let receiver_view = self
            .view(receiver)
            .unwrap_or_else(|| panic!("link_budget: {receiver} is not attached to this channel"));
        let sender_pos = sender_view.position.position();
        self.compute_budget(tx_power_dbm, &sender_view, sender_pos, &receiver_view, queue.now())
    }

    /// Bind a blockage model to the unordered `{a, b}` pair, replacing any
    /// prior blockage binding. Both endpoints must be attached.
    pub fn set_blockage(&self, model: Box<dyn BlockageModel>, a: EndpointId, b: EndpointId) {
        self.assert_attached(a, "set_blockage");
        self.assert_attached(b, "set_blockage");
        if a == b {
            log::warn!("blockage bound to a single endpoint {a}; it will never match a link");
        }
        self.faults.borrow_mut().set_blockage(model, a, b);
    }

    pub fn clear_blockage(&self) {
        self.faults.borrow_mut().clear_blockage();
    }

    /// Bind a packet dropper to the unordered `{a, b}` pair, replacing any
    /// prior dropper binding. Both endpoints must be attached.
    pub fn set_dropper(&self, dropper: Box<dyn PacketDropper>, a: EndpointId, b: EndpointId) {
        self.assert_attached(a, "set_dropper");
        self.assert_attached(b, "set_dropper");
        if a == b {
            log::warn!("dropper bound to a single endpoint {a}; it will never match a link");
        }
        self.faults.borrow_mut().set_dropper(dropper, a, b);
    }

    pub fn clear_dropper(&self) {
        self.faults.borrow_mut().clear_dropper();
    }

    /// Fire every delivery due at or before `deadline`, in virtual-time
    /// order with stable FIFO tie-break at equal timestamps.
    pub fn run_until(&self, queue: &mut DeliveryQueue, deadline: SimTime) {
        while queue.peek_deadline().is_some_and(|at| at <= deadline) {
            let (at, delivery) = queue.pop_next().expect("peeked event present");
            self.deliver(at, delivery);
        }
    }

    /// Fire every pending delivery.
    pub fn run_to_end(&self, queue: &mut DeliveryQueue) {
        while let Some((at, delivery)) = queue.pop_next() {
            self.deliver(at, delivery);
        }
    }

    /// Dispatch one delivery into the receiving endpoint's inbound hook.
    fn deliver(&self, at: SimTime, delivery: Delivery) {
        match delivery.0 {
            DeliveryKind::Frame {
                receiver,
                node_id,
                frame,
                rx_power_dbm,
            } => {
                let sink = self.sink_of(receiver);
                log::trace!("t={at} node {node_id}/{receiver}: frame arrives at {rx_power_dbm:.1} dBm");
                sink.borrow_mut().on_frame_arrival(frame, rx_power_dbm);
            }
            DeliveryKind::Training {
                receiver,
                node_id,
                field,
                rx_power_dbm,
            } => {
                let sink = self.sink_of(receiver);
                log::trace!(
                    "t={at} node {node_id}/{receiver}: trn field arrives at {rx_power_dbm:.1} dBm, {} left",
                    field.remaining_fields
                );
                sink.borrow_mut().on_training_field_arrival(field, rx_power_dbm);
            }
        }
    }

    /// Shared gain/loss/delay/blockage composition used by both send paths.
    ///
    /// Directional gains are added only when *both* endpoints expose a
    /// directional antenna; otherwise the link is isotropic (0 dB) on both
    /// sides. The transmit gain is looked up at the sender's azimuth toward
    /// the receiver, the receive gain at the receiver's azimuth toward the
    /// sender — generally two different angles, so link gain need not be
    /// symmetric even when distance is.
    fn compute_budget(&self, tx_power_dbm: f64, sender: &EndpointView, sender_pos: Position, receiver: &EndpointView, now: SimTime) -> LinkBudget {
        let receiver_pos = receiver.position.position();
        let delay = self.delay_model.delay(&sender_pos, &receiver_pos);
        let mut rx_power_dbm = self.loss_model.rx_power_dbm(tx_power_dbm, &sender_pos, &receiver_pos);

        if let (Some(tx_antenna), Some(rx_antenna)) = (&sender.antenna, &receiver.antenna) {
            let azimuth_to_receiver = sender_pos.azimuth_to(&receiver_pos);
            let azimuth_to_sender = receiver_pos.azimuth_to(&sender_pos);
            rx_power_dbm += tx_antenna.tx_gain_db(azimuth_to_receiver);
            rx_power_dbm += rx_antenna.rx_gain_db(azimuth_to_sender);
        }

        if let Some(blockage_db) = self.faults.borrow_mut().blockage_db(sender.id, receiver.id, now) {
            log::debug!("t={now} blockage {:+.1} dB on {}<->{}", blockage_db, sender.id, receiver.id);
            rx_power_dbm += blockage_db;
        }

        LinkBudget { delay, rx_power_dbm }
    }

    /// Capture one endpoint's fields under a short borrow of the table.
    fn view(&self, id: EndpointId) -> Option<EndpointView> {
        let endpoints = self.endpoints.borrow();
        let endpoint = endpoints.get(id.index())?;
        Some(EndpointView {
            id,
            node_id: endpoint.node_id,
            channel_number: endpoint.channel_number,
            position: endpoint.position.clone(),
            antenna: endpoint.antenna.clone(),
        })
    }

    fn sink_of(&self, id: EndpointId) -> Rc<RefCell<dyn crate::endpoint::FrameSink>> {
        let endpoints = self.endpoints.borrow();
        endpoints
            .get(id.index())
            .unwrap_or_else(|| panic!("delivery addressed to unknown endpoint {id}"))
            .sink
            .clone()
    }

    fn assert_attached(&self, id: EndpointId, operation: &str) {
        assert!(
            id.index() < self.endpoints.borrow().len(),
            "{operation}: {id} is not attached to this channel"
        );
    }
}
