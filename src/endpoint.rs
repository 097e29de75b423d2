//! PHY-facing endpoint adapter and inbound delivery hooks.
//!
//! The adapter is the glue between a device's transmit requests and the
//! channel: it resolves a TXVECTOR power level against the endpoint's power
//! table, adds the endpoint's own amplifier/antenna gain, and hands the
//! resulting transmission record to the channel. Inbound, the channel calls
//! the endpoint's registered `FrameSink`; this crate's responsibility ends
//! at invoking those hooks with correctly computed power and timing — the
//! receive state machine behind them belongs to the MAC layer above.

use std::rc::Rc;

use crate::channel::{Channel, DeliveryQueue};
use crate::time::SimDuration;
use crate::types::{AggregationTag, EndpointId, Frame, PreambleType, RateDescriptor, TrainingField};

/// Inbound delivery hooks of one endpoint.
///
/// Two entry points, matching the two delivery paths of the medium: full
/// frames and payload-free beam-training fields. Training fields arrive
/// through their own hook so a receiver can accumulate one gain sample per
/// field without parsing any frame structure.
pub trait FrameSink {
    fn on_frame_arrival(&mut self, frame: Frame, rx_power_dbm: f64);

    fn on_training_field_arrival(&mut self, field: TrainingField, rx_power_dbm: f64);
}

/// Converts local transmit requests into channel send calls.
///
/// Holds the endpoint's transmit-power table (dBm per TXVECTOR power level)
/// and its fixed transmit gain. Passing an out-of-range power level is a
/// topology programming error and fails fast.
pub struct PhyAdapter {
    endpoint: EndpointId,
    tx_power_levels_dbm: Vec<f64>,
    tx_gain_db: f64,
}

impl PhyAdapter {
    pub fn new(endpoint: EndpointId, tx_power_levels_dbm: Vec<f64>, tx_gain_db: f64) -> Self {
        assert!(!tx_power_levels_dbm.is_empty(), "{endpoint}: transmit-power table must not be empty");
        PhyAdapter {
            endpoint,
            tx_power_levels_dbm,
            tx_gain_db,
        }
    }

    pub fn endpoint(&self) -> EndpointId {
        self.endpoint
    }

    /// Actual transmit power for a TXVECTOR power level: table entry plus
    /// the endpoint's own gain.
    fn resolve_power_dbm(&self, power_level: usize) -> f64 {
        assert!(
            power_level < self.tx_power_levels_dbm.len(),
            "{}: power level {} outside table of {} entries",
            self.endpoint,
            power_level,
            self.tx_power_levels_dbm.len()
        );
        self.tx_power_levels_dbm[power_level] + self.tx_gain_db
    }

    /// Send a full frame over the medium.
    pub fn transmit(
        &self,
        channel: &Channel,
        queue: &mut DeliveryQueue,
        payload: Rc<[u8]>,
        power_level: usize,
        rate: RateDescriptor,
        preamble: PreambleType,
        aggregation: AggregationTag,
        duration: SimDuration,
    ) {
        let frame = Frame {
            payload,
            tx_power_dbm: self.resolve_power_dbm(power_level),
            rate,
            preamble,
            aggregation,
            duration,
        };
        channel.send(queue, self.endpoint, frame);
    }

    /// Send one beam-training field. `remaining_fields` is the countdown of
    /// fields left in the current burst, carried to receivers unchanged.
    pub fn transmit_training(
        &self,
        channel: &Channel,
        queue: &mut DeliveryQueue,
        power_level: usize,
        rate: RateDescriptor,
        remaining_fields: u8,
    ) {
        let field = TrainingField {
            tx_power_dbm: self.resolve_power_dbm(power_level),
            rate,
            remaining_fields,
        };
        channel.send_trn(queue, self.endpoint, field);
    }
}

/// Sink that records every arrival. Stands in for the MAC receive state
/// machine in scenarios and tests.
#[derive(Default)]
pub struct RecordingSink {
    pub frames: Vec<(Frame, f64)>,
    pub training_fields: Vec<(TrainingField, f64)>,
}

impl FrameSink for RecordingSink {
    fn on_frame_arrival(&mut self, frame: Frame, rx_power_dbm: f64) {
        self.frames.push((frame, rx_power_dbm));
    }

    fn on_training_field_arrival(&mut self, field: TrainingField, rx_power_dbm: f64) {
        self.training_fields.push((field, rx_power_dbm));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::Channel;
    use crate::mobility::ConstantPosition;
    use crate::propagation::{ConstantSpeedDelayModel, FixedLossModel};
    use crate::types::Endpoint;
    use std::cell::RefCell;

    fn test_channel() -> Channel {
        Channel::new(
            Box::new(FixedLossModel { loss_db: 60.0 }),
            Box::new(ConstantSpeedDelayModel::default()),
        )
    }

    fn attach_at(channel: &Channel, x: f64, sink: Rc<RefCell<RecordingSink>>) -> EndpointId {
        channel.attach(Endpoint {
            node_id: x as u32,
            channel_number: 1,
            position: Rc::new(ConstantPosition::new(x, 0.0, 0.0)),
            antenna: None,
            sink,
        })
    }

    #[test]
    fn transmit_resolves_power_level_and_gain() {
        let channel = test_channel();
        let tx_sink = Rc::new(RefCell::new(RecordingSink::default()));
        let rx_sink = Rc::new(RefCell::new(RecordingSink::default()));
        let tx = attach_at(&channel, 0.0, tx_sink);
        attach_at(&channel, 10.0, rx_sink.clone());

        // Table entry 1 (7 dBm) + 3 dB gain = 10 dBm at the channel
        let adapter = PhyAdapter::new(tx, vec![4.0, 7.0], 3.0);
        let mut queue = DeliveryQueue::new();
        adapter.transmit(
            &channel,
            &mut queue,
            Rc::from(vec![0u8; 32]),
            1,
            RateDescriptor { mcs: 2 },
            PreambleType::Long,
            AggregationTag::Single,
            SimDuration::from_micros(10),
        );
        channel.run_to_end(&mut queue);

        let frames = &rx_sink.borrow().frames;
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].0.tx_power_dbm, 10.0);
        assert_eq!(frames[0].1, -50.0); // 10 dBm - 60 dB fixed loss
    }

    #[test]
    fn transmit_training_carries_the_countdown() {
        let channel = test_channel();
        let rx_sink = Rc::new(RefCell::new(RecordingSink::default()));
        let tx = attach_at(&channel, 0.0, Rc::new(RefCell::new(RecordingSink::default())));
        attach_at(&channel, 5.0, rx_sink.clone());

        let adapter = PhyAdapter::new(tx, vec![10.0], 0.0);
        let mut queue = DeliveryQueue::new();
        adapter.transmit_training(&channel, &mut queue, 0, RateDescriptor { mcs: 0 }, 7);
        channel.run_to_end(&mut queue);

        let fields = &rx_sink.borrow().training_fields;
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].0.remaining_fields, 7);
    }

    #[test]
    #[should_panic(expected = "power level")]
    fn out_of_range_power_level_fails_fast() {
        let channel = test_channel();
        let tx = attach_at(&channel, 0.0, Rc::new(RefCell::new(RecordingSink::default())));
        let adapter = PhyAdapter::new(tx, vec![10.0], 0.0);
        let mut queue = DeliveryQueue::new();
        adapter.transmit_training(&channel, &mut queue, 3, RateDescriptor { mcs: 0 }, 1);
    }

    #[test]
    #[should_panic(expected = "must not be empty")]
    fn empty_power_table_is_rejected() {
        let _ = PhyAdapter::new(EndpointId(0), vec![], 0.0);
    }
}
