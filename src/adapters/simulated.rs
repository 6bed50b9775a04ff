//! Simulated actuators for offline training and tests.
//!
//! Two backends stand in for real hardware:
//!
//! - [`SimulatedJoint`] implements the single-joint [`Actuator`] port
//!   directly.
//! - [`SimulatedJointBus`] implements [`JointBus`] for a whole body and is
//!   driven through [`crate::adapters::JointBusActuator`].
//!
//! Both move each commanded joint a fixed fraction (`tracking_gain`) of the
//! way toward its target per command, which is the only notion of dynamics
//! they model, and both can be told to become unavailable after a number of
//! calls.

use serde::{Deserialize, Serialize};

use crate::{
    Error, Result,
    ports::{Actuator, JointBus},
};

/// Joint names of the humanoid the controller was first trained on, in the
/// order the simulator reports them.
pub const HUMANOID_JOINTS: [&str; 24] = [
    "HeadYaw",
    "HeadPitch",
    "LShoulderPitch",
    "LShoulderRoll",
    "LElbowYaw",
    "LElbowRoll",
    "LWristYaw",
    "RShoulderPitch",
    "RShoulderRoll",
    "RElbowYaw",
    "RElbowRoll",
    "RWristYaw",
    "LHipYawPitch",
    "LHipRoll",
    "LHipPitch",
    "LKneePitch",
    "LAnklePitch",
    "LAnkleRoll",
    "RHipYawPitch",
    "RHipRoll",
    "RHipPitch",
    "RKneePitch",
    "RAnklePitch",
    "RAnkleRoll",
];

/// Index of `LShoulderPitch` in [`HUMANOID_JOINTS`]
pub const LEFT_SHOULDER_PITCH: usize = 2;

fn check_gain(tracking_gain: f64) -> Result<f64> {
    if tracking_gain.is_finite() && tracking_gain > 0.0 && tracking_gain <= 1.0 {
        Ok(tracking_gain)
    } else {
        Err(Error::config(format!(
            "tracking gain must be in (0, 1], got {tracking_gain}"
        )))
    }
}

/// Settings shared by the simulated backends
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Fraction of the remaining distance covered per command
    pub tracking_gain: f64,
    /// Starting angle of every joint (radians)
    pub initial_angle: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tracking_gain: 1.0,
            initial_angle: 0.0,
        }
    }
}

/// Kinematic single joint.
#[derive(Debug, Clone)]
pub struct SimulatedJoint {
    name: String,
    angle: f64,
    tracking_gain: f64,
    calls: usize,
    fail_after: Option<usize>,
    commands: usize,
    started: usize,
    stopped: usize,
}

impl SimulatedJoint {
    /// Joint that reaches every commanded angle exactly.
    pub fn new(name: impl Into<String>, initial_angle: f64) -> Self {
        Self {
            name: name.into(),
            angle: initial_angle,
            tracking_gain: 1.0,
            calls: 0,
            fail_after: None,
            commands: 0,
            started: 0,
            stopped: 0,
        }
    }

    pub fn from_config(name: impl Into<String>, config: &SimulationConfig) -> Result<Self> {
        Self::new(name, config.initial_angle).with_tracking_gain(config.tracking_gain)
    }

    pub fn with_tracking_gain(mut self, tracking_gain: f64) -> Result<Self> {
        self.tracking_gain = check_gain(tracking_gain)?;
        Ok(self)
    }

    /// Fail every read or command after `calls` successful ones.
    pub fn fail_after(mut self, calls: usize) -> Self {
        self.fail_after = Some(calls);
        self
    }

    pub fn angle(&self) -> f64 {
        self.angle
    }

    /// Number of successful `command_angle` calls
    pub fn commands(&self) -> usize {
        self.commands
    }

    pub fn start_count(&self) -> usize {
        self.started
    }

    pub fn stop_count(&self) -> usize {
        self.stopped
    }

    fn check_available(&mut self) -> Result<()> {
        if self.fail_after.is_some_and(|limit| self.calls >= limit) {
            return Err(Error::unavailable(&self.name, "simulated connection lost"));
        }
        self.calls += 1;
        Ok(())
    }
}

impl Actuator for SimulatedJoint {
    fn read_angle(&mut self) -> Result<f64> {
        self.check_available()?;
        Ok(self.angle)
    }

    fn command_angle(&mut self, angle: f64) -> Result<()> {
        self.check_available()?;
        self.angle += self.tracking_gain * (angle - self.angle);
        self.commands += 1;
        Ok(())
    }

    fn start(&mut self) -> Result<()> {
        self.started += 1;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.stopped += 1;
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Simulated multi-joint body.
#[derive(Debug, Clone)]
pub struct SimulatedJointBus {
    names: Vec<String>,
    positions: Vec<f64>,
    tracking_gain: f64,
    running: bool,
    missing: Vec<usize>,
    writes: usize,
    last_write: Option<Vec<f64>>,
}

impl SimulatedJointBus {
    pub fn new<S: Into<String>>(names: impl IntoIterator<Item = S>, initial_angle: f64) -> Self {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let positions = vec![initial_angle; names.len()];
        Self {
            names,
            positions,
            tracking_gain: 1.0,
            running: false,
            missing: Vec::new(),
            writes: 0,
            last_write: None,
        }
    }

    /// Body with the [`HUMANOID_JOINTS`] layout.
    pub fn humanoid(config: &SimulationConfig) -> Result<Self> {
        Self::new(HUMANOID_JOINTS, config.initial_angle).with_tracking_gain(config.tracking_gain)
    }

    pub fn with_tracking_gain(mut self, tracking_gain: f64) -> Result<Self> {
        self.tracking_gain = check_gain(tracking_gain)?;
        Ok(self)
    }

    pub fn with_position(mut self, index: usize, position: f64) -> Self {
        if let Some(slot) = self.positions.get_mut(index) {
            *slot = position;
        }
        self
    }

    /// Make a joint unreachable, as if its handle could not be resolved.
    pub fn disconnect(&mut self, index: usize) {
        self.missing.push(index);
    }

    pub fn positions(&self) -> &[f64] {
        &self.positions
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Number of write calls (single or bulk)
    pub fn writes(&self) -> usize {
        self.writes
    }

    /// Targets of the last bulk write
    pub fn last_write(&self) -> Option<&[f64]> {
        self.last_write.as_deref()
    }

    fn check_joint(&self, index: usize) -> Result<()> {
        let label = self
            .names
            .get(index)
            .cloned()
            .unwrap_or_else(|| format!("#{index}"));
        if index >= self.positions.len() {
            return Err(Error::unavailable(label, "joint not found"));
        }
        if self.missing.contains(&index) {
            return Err(Error::unavailable(label, "joint handle unavailable"));
        }
        Ok(())
    }

    fn track(&mut self, index: usize, target: f64) {
        let current = self.positions[index];
        self.positions[index] = current + self.tracking_gain * (target - current);
    }
}

impl JointBus for SimulatedJointBus {
    fn joint_count(&self) -> usize {
        self.positions.len()
    }

    fn joint_name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    fn read_position(&mut self, index: usize) -> Result<f64> {
        self.check_joint(index)?;
        Ok(self.positions[index])
    }

    fn write_position(&mut self, index: usize, position: f64) -> Result<()> {
        self.check_joint(index)?;
        self.track(index, position);
        self.writes += 1;
        Ok(())
    }

    fn write_positions(&mut self, positions: &[f64]) -> Result<()> {
        if positions.len() != self.positions.len() {
            return Err(Error::config(format!(
                "number of positions ({}) must match number of joints ({})",
                positions.len(),
                self.positions.len()
            )));
        }
        for index in 0..positions.len() {
            self.check_joint(index)?;
        }
        for (index, &target) in positions.iter().enumerate() {
            self.track(index, target);
        }
        self.writes += 1;
        self.last_write = Some(positions.to_vec());
        Ok(())
    }

    fn start(&mut self) -> Result<()> {
        self.running = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.running = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_joint_tracks_exactly_by_default() {
        let mut joint = SimulatedJoint::new("LShoulderPitch", 0.0);
        joint.command_angle(0.3).unwrap();
        assert_eq!(joint.read_angle().unwrap(), 0.3);
        assert_eq!(joint.commands(), 1);
    }

    #[test]
    fn test_joint_partial_tracking() {
        let mut joint = SimulatedJoint::new("j", 0.0)
            .with_tracking_gain(0.5)
            .unwrap();
        joint.command_angle(1.0).unwrap();
        assert_eq!(joint.angle(), 0.5);
        joint.command_angle(1.0).unwrap();
        assert_eq!(joint.angle(), 0.75);
    }

    #[test]
    fn test_joint_fails_after_limit() {
        let mut joint = SimulatedJoint::new("j", 0.0).fail_after(2);
        assert!(joint.read_angle().is_ok());
        assert!(joint.command_angle(0.1).is_ok());
        assert!(matches!(
            joint.read_angle(),
            Err(Error::Unavailable { .. })
        ));
    }

    #[test]
    fn test_rejects_bad_gain() {
        assert!(SimulatedJoint::new("j", 0.0).with_tracking_gain(0.0).is_err());
        assert!(SimulatedJoint::new("j", 0.0).with_tracking_gain(1.5).is_err());
    }

    #[test]
    fn test_humanoid_bus_layout() {
        let bus = SimulatedJointBus::humanoid(&SimulationConfig::default()).unwrap();
        assert_eq!(bus.joint_count(), 24);
        assert_eq!(bus.joint_name(LEFT_SHOULDER_PITCH), Some("LShoulderPitch"));
    }

    #[test]
    fn test_bulk_write_length_mismatch() {
        let mut bus = SimulatedJointBus::new(["a", "b", "c"], 0.0);
        let result = bus.write_positions(&[0.0, 0.1]);
        assert!(matches!(result, Err(Error::InvalidConfiguration { .. })));
        assert_eq!(bus.writes(), 0);
    }

    #[test]
    fn test_disconnected_joint_is_unavailable() {
        let mut bus = SimulatedJointBus::new(["a", "b"], 0.0);
        bus.disconnect(1);
        assert!(bus.read_position(0).is_ok());
        assert!(matches!(
            bus.read_position(1),
            Err(Error::Unavailable { .. })
        ));
        assert!(bus.read_positions().is_err());
    }
}
