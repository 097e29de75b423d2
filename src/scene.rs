//! Scenario configuration: JSON scenes describing a channel and its endpoints.
//!
//! A scene file names the propagation models and lists every endpoint with
//! its position, channel number, transmit-power table, and antenna. Loading
//! goes through three stages: read the file, parse the JSON, validate the
//! parsed contents — each stage reporting a descriptive error. A validated
//! scene builds into a live [`Channel`] plus one [`PhyAdapter`] per endpoint;
//! the caller supplies the receive logic (one `FrameSink` per endpoint),
//! since that state machine lives above this crate.

use std::cell::RefCell;
use std::fs;
use std::rc::Rc;

use anyhow::Context;
use serde::Deserialize;

use crate::antenna::{DirectionalAntenna, Isotropic, SectoredAntenna};
use crate::channel::Channel;
use crate::endpoint::{FrameSink, PhyAdapter};
use crate::geometry::Position;
use crate::mobility::ConstantPosition;
use crate::propagation::{
    ConstantSpeedDelayModel, FixedLossModel, FriisLossModel, LogDistanceLossModel, PropagationLossModel, SPEED_OF_LIGHT,
};
use crate::types::Endpoint;

/// Root structure representing one simulated network.
#[derive(Debug, Deserialize)]
pub struct Scene {
    pub propagation: PropagationConfig,
    pub endpoints: Vec<EndpointConfig>,
}

#[derive(Debug, Deserialize)]
pub struct PropagationConfig {
    pub loss: LossConfig,
    /// Signal propagation speed in m/s; defaults to the speed of light.
    #[serde(default = "default_propagation_speed")]
    pub propagation_speed: f64,
}

fn default_propagation_speed() -> f64 {
    SPEED_OF_LIGHT
}

/// Loss model selection as a tagged enum.
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum LossConfig {
    #[serde(rename = "friis")]
    Friis {
        #[serde(default = "default_frequency_ghz")]
        frequency_ghz: f64,
    },
    #[serde(rename = "log-distance")]
    LogDistance {
        path_loss_exponent: f64,
        path_loss_at_reference_distance: f64,
        #[serde(default)]
        shadowing_sigma: f64,
    },
    #[serde(rename = "fixed")]
    Fixed { loss_db: f64 },
}

fn default_frequency_ghz() -> f64 {
    crate::propagation::DEFAULT_FREQUENCY_HZ / 1e9
}

#[derive(Debug, Deserialize)]
pub struct EndpointConfig {
    pub node_id: u32,
    pub channel_number: u8,
    pub position: Position,
    /// dBm per TXVECTOR power level; must not be empty.
    pub tx_power_levels_dbm: Vec<f64>,
    #[serde(default)]
    pub tx_gain_db: f64,
    /// Absent means no directional antenna (isotropic fallback on its links).
    #[serde(default)]
    pub antenna: Option<AntennaConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum AntennaConfig {
    #[serde(rename = "isotropic")]
    Isotropic,
    #[serde(rename = "sectored")]
    Sectored {
        boresight_deg: f64,
        beamwidth_deg: f64,
        main_lobe_gain_db: f64,
        side_lobe_gain_db: f64,
    },
}

/// A scene instantiated into live objects, ready to drive.
pub struct BuiltScene {
    pub channel: Channel,
    /// One adapter per scene endpoint, in scene order.
    pub adapters: Vec<PhyAdapter>,
}

/// Validate scene contents to reject malformed inputs.
///
/// Checks for issues that would otherwise surface as panics or nonsense
/// results at runtime:
/// - No endpoints, or duplicate node IDs
/// - Empty transmit-power tables or unrealistic power values
/// - Invalid antenna geometry (non-positive or >360° beamwidth)
/// - Non-positive path loss exponent, frequency, or propagation speed
/// - Negative shadowing sigma
pub fn validate_scene(scene: &Scene) -> Result<(), String> {
    const MIN_TX_POWER_DBM: f64 = -50.0;
    const MAX_TX_POWER_DBM: f64 = 50.0;

    if scene.endpoints.is_empty() {
        return Err("Scene must contain at least one endpoint".to_string());
    }

    let mut node_ids = std::collections::HashSet::new();
    for endpoint in &scene.endpoints {
        if !node_ids.insert(endpoint.node_id) {
            return Err(format!("Duplicate node_id found: {}", endpoint.node_id));
        }

        if endpoint.tx_power_levels_dbm.is_empty() {
            return Err(format!("Node {} has an empty tx_power_levels_dbm table", endpoint.node_id));
        }
        for &level in &endpoint.tx_power_levels_dbm {
            if !(MIN_TX_POWER_DBM..=MAX_TX_POWER_DBM).contains(&level) {
                return Err(format!(
                    "Node {} tx power {} dBm outside realistic range ({} to {} dBm)",
                    endpoint.node_id, level, MIN_TX_POWER_DBM, MAX_TX_POWER_DBM
                ));
            }
        }

        if let Some(AntennaConfig::Sectored { beamwidth_deg, .. }) = &endpoint.antenna {
            if *beamwidth_deg <= 0.0 || *beamwidth_deg > 360.0 {
                return Err(format!(
                    "Node {} sector beamwidth {} degrees, must be in (0, 360]",
                    endpoint.node_id, beamwidth_deg
                ));
            }
        }
    }

    match &scene.propagation.loss {
        LossConfig::Friis { frequency_ghz } => {
            if *frequency_ghz <= 0.0 {
                return Err(format!("Invalid frequency_ghz {frequency_ghz}, must be positive"));
            }
        }
        LossConfig::LogDistance {
            path_loss_exponent,
            shadowing_sigma,
            ..
        } => {
            if *path_loss_exponent <= 0.0 {
                return Err("Invalid path_loss_exponent, must be positive".to_string());
            }
            if *shadowing_sigma < 0.0 {
                return Err("Invalid shadowing_sigma, must be non-negative".to_string());
            }
        }
        LossConfig::Fixed { .. } => {}
    }

    if scene.propagation.propagation_speed <= 0.0 {
        return Err("Invalid propagation_speed, must be positive".to_string());
    }

    Ok(())
}

/// Parse and validate a scene from a JSON string.
pub fn parse_scene(data: &str) -> anyhow::Result<Scene> {
    let scene = serde_json::from_str::<Scene>(data).context("Invalid JSON format")?;
    validate_scene(&scene).map_err(|e| anyhow::anyhow!("Invalid scene configuration: {e}"))?;
    Ok(scene)
}

/// Load, parse, and validate a scene configuration file.
pub fn load_scene(config_file_path: &str) -> anyhow::Result<Scene> {
    let data = fs::read_to_string(config_file_path).with_context(|| format!("Failed to read file: {config_file_path}"))?;
    parse_scene(&data)
}

impl Scene {
    /// Instantiate the scene: build the propagation models and the channel,
    /// attach every endpoint, and wrap each in a `PhyAdapter`.
    ///
    /// `make_sink` supplies the receive hooks for each endpoint, called with
    /// the endpoint's node ID in scene order.
    pub fn build(&self, mut make_sink: impl FnMut(u32) -> Rc<RefCell<dyn FrameSink>>) -> BuiltScene {
        let loss_model: Box<dyn PropagationLossModel> = match &self.propagation.loss {
            LossConfig::Friis { frequency_ghz } => Box::new(FriisLossModel {
                frequency_hz: frequency_ghz * 1e9,
            }),
            LossConfig::LogDistance {
                path_loss_exponent,
                path_loss_at_reference_distance,
                shadowing_sigma,
            } => Box::new(LogDistanceLossModel {
                exponent: *path_loss_exponent,
                reference_loss_db: *path_loss_at_reference_distance,
                shadowing_sigma_db: *shadowing_sigma,
            }),
            LossConfig::Fixed { loss_db } => Box::new(FixedLossModel { loss_db: *loss_db }),
        };
        let delay_model = ConstantSpeedDelayModel {
            speed_mps: self.propagation.propagation_speed,
        };

        let channel = Channel::new(loss_model, Box::new(delay_model));
        let mut adapters = Vec::with_capacity(self.endpoints.len());

        for config in &self.endpoints {
            let antenna: Option<Rc<dyn DirectionalAntenna>> = match &config.antenna {
                None => None,
                Some(AntennaConfig::Isotropic) => Some(Rc::new(Isotropic)),
                Some(AntennaConfig::Sectored {
                    boresight_deg,
                    beamwidth_deg,
                    main_lobe_gain_db,
                    side_lobe_gain_db,
                }) => Some(Rc::new(SectoredAntenna::new(
                    boresight_deg.to_radians(),
                    beamwidth_deg.to_radians(),
                    *main_lobe_gain_db,
                    *side_lobe_gain_db,
                ))),
            };

            let id = channel.attach(Endpoint {
                node_id: config.node_id,
                channel_number: config.channel_number,
                position: Rc::new(ConstantPosition(config.position)),
                antenna,
                sink: make_sink(config.node_id),
            });
            adapters.push(PhyAdapter::new(id, config.tx_power_levels_dbm.clone(), config.tx_gain_db));
        }

        log::info!("scene built: {} endpoints attached", adapters.len());
        BuiltScene { channel, adapters }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::DeliveryQueue;
    use crate::endpoint::RecordingSink;
    use crate::types::{AggregationTag, PreambleType, RateDescriptor};
    use crate::time::SimDuration;

    const SCENE_JSON: &str = r#"{
        "propagation": {
            "loss": { "type": "fixed", "loss_db": 60.0 }
        },
        "endpoints": [
            {
                "node_id": 1,
                "channel_number": 2,
                "position": { "x": 0.0, "y": 0.0 },
                "tx_power_levels_dbm": [0.0, 10.0]
            },
            {
                "node_id": 2,
                "channel_number": 2,
                "position": { "x": 10.0, "y": 0.0 },
                "tx_power_levels_dbm": [10.0],
                "antenna": { "type": "isotropic" }
            },
            {
                "node_id": 3,
                "channel_number": 1,
                "position": { "x": 20.0, "y": 0.0 },
                "tx_power_levels_dbm": [10.0],
                "antenna": {
                    "type": "sectored",
                    "boresight_deg": 180.0,
                    "beamwidth_deg": 60.0,
                    "main_lobe_gain_db": 18.0,
                    "side_lobe_gain_db": -8.0
                }
            }
        ]
    }"#;

    #[test]
    fn parse_and_validate_good_scene() {
        let scene = parse_scene(SCENE_JSON).expect("scene should parse");
        assert_eq!(scene.endpoints.len(), 3);
        assert_eq!(scene.propagation.propagation_speed, SPEED_OF_LIGHT);
        assert!(matches!(scene.propagation.loss, LossConfig::Fixed { .. }));
        assert_eq!(scene.endpoints[2].position.z, 0.0);
    }

    #[test]
    fn validation_rejects_bad_scenes() {
        let mut scene = parse_scene(SCENE_JSON).unwrap();
        scene.endpoints[1].node_id = 1;
        assert!(validate_scene(&scene).unwrap_err().contains("Duplicate node_id"));

        let mut scene = parse_scene(SCENE_JSON).unwrap();
        scene.endpoints[0].tx_power_levels_dbm.clear();
        assert!(validate_scene(&scene).unwrap_err().contains("empty tx_power_levels_dbm"));

        let mut scene = parse_scene(SCENE_JSON).unwrap();
        scene.endpoints[0].tx_power_levels_dbm[0] = 80.0;
        assert!(validate_scene(&scene).unwrap_err().contains("outside realistic range"));

        let mut scene = parse_scene(SCENE_JSON).unwrap();
        scene.endpoints.clear();
        assert!(validate_scene(&scene).unwrap_err().contains("at least one endpoint"));

        let mut scene = parse_scene(SCENE_JSON).unwrap();
        if let Some(AntennaConfig::Sectored { beamwidth_deg, .. }) = &mut scene.endpoints[2].antenna {
            *beamwidth_deg = 0.0;
        }
        assert!(validate_scene(&scene).unwrap_err().contains("beamwidth"));

        let mut scene = parse_scene(SCENE_JSON).unwrap();
        scene.propagation.propagation_speed = 0.0;
        assert!(validate_scene(&scene).unwrap_err().contains("propagation_speed"));
    }

    #[test]
    fn malformed_json_reports_parse_error() {
        let err = parse_scene("{ not json").unwrap_err();
        assert!(err.to_string().contains("Invalid JSON format"));
    }

    #[test]
    fn built_scene_delivers_between_same_channel_endpoints() {
        let scene = parse_scene(SCENE_JSON).unwrap();
        let mut sinks: Vec<Rc<RefCell<RecordingSink>>> = Vec::new();
        let built = scene.build(|_node_id| {
            let sink = Rc::new(RefCell::new(RecordingSink::default()));
            sinks.push(sink.clone());
            sink
        });

        let mut queue = DeliveryQueue::new();
        built.adapters[0].transmit(
            &built.channel,
            &mut queue,
            Rc::from(vec![1u8; 16]),
            1,
            RateDescriptor { mcs: 1 },
            PreambleType::Short,
            AggregationTag::Single,
            SimDuration::from_micros(4),
        );
        built.channel.run_to_end(&mut queue);

        // Node 2 shares channel number 2; node 3 is on channel number 1
        assert_eq!(sinks[1].borrow().frames.len(), 1);
        assert_eq!(sinks[1].borrow().frames[0].1, -50.0);
        assert!(sinks[2].borrow().frames.is_empty());
    }
}
