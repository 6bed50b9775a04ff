//! Single-joint view over a multi-joint bus.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{
    Error, Result,
    ports::{Actuator, JointBus},
};

/// What happens to the joints that are not being trained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HoldPolicy {
    /// Re-read every joint and re-send all positions with only the
    /// controlled one replaced, so the rest of the body stays stiff at its
    /// last read position.
    #[default]
    HoldOthers,
    /// Write the controlled joint alone.
    ControlledOnly,
}

impl FromStr for HoldPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hold-others" | "hold_others" | "hold" => Ok(HoldPolicy::HoldOthers),
            "controlled-only" | "controlled_only" | "single" => Ok(HoldPolicy::ControlledOnly),
            other => Err(Error::config(format!(
                "unknown hold policy '{other}' (expected 'hold-others' or 'controlled-only')"
            ))),
        }
    }
}

/// Adapts a [`JointBus`] to the [`Actuator`] port for one joint.
pub struct JointBusActuator<B: JointBus> {
    bus: B,
    joint: usize,
    hold: HoldPolicy,
    name: String,
}

impl<B: JointBus> JointBusActuator<B> {
    /// Control joint `joint` of `bus`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] if `joint` is not addressable.
    pub fn new(bus: B, joint: usize, hold: HoldPolicy) -> Result<Self> {
        if joint >= bus.joint_count() {
            return Err(Error::config(format!(
                "controlled joint index {joint} out of range for a bus of {} joints",
                bus.joint_count()
            )));
        }
        let name = bus
            .joint_name(joint)
            .map(str::to_string)
            .unwrap_or_else(|| format!("joint-{joint}"));
        Ok(Self {
            bus,
            joint,
            hold,
            name,
        })
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn into_bus(self) -> B {
        self.bus
    }

    pub fn hold_policy(&self) -> HoldPolicy {
        self.hold
    }
}

impl<B: JointBus> Actuator for JointBusActuator<B> {
    fn read_angle(&mut self) -> Result<f64> {
        self.bus.read_position(self.joint)
    }

    fn command_angle(&mut self, angle: f64) -> Result<()> {
        match self.hold {
            HoldPolicy::HoldOthers => {
                let mut positions = self.bus.read_positions()?;
                if positions.len() != self.bus.joint_count() {
                    return Err(Error::config(format!(
                        "bus returned {} positions for {} joints",
                        positions.len(),
                        self.bus.joint_count()
                    )));
                }
                positions[self.joint] = angle;
                self.bus.write_positions(&positions)
            }
            HoldPolicy::ControlledOnly => self.bus.write_position(self.joint, angle),
        }
    }

    fn start(&mut self) -> Result<()> {
        self.bus.start()
    }

    fn stop(&mut self) -> Result<()> {
        self.bus.stop()
    }

    fn name(&self) -> &str {
        &self.name
    }
}
