//! Actuator port - abstraction over whatever moves the joint
//!
//! The learning core only ever reads an angle and commands an angle. How
//! that happens (a stepped physics simulation, a robot motion API, a test
//! double) lives behind these traits.

use crate::Result;

/// Single controlled joint.
///
/// # Event Sequence
///
/// 1. `start()` - once, before the first episode
/// 2. `read_angle()` / `command_angle()` - repeatedly, one pair per step
/// 3. `stop()` - once, after the last episode (also on error paths)
///
/// # Examples
///
/// ```
/// use jointq::ports::Actuator;
///
/// struct Servo {
///     angle: f64,
/// }
///
/// impl Actuator for Servo {
///     fn read_angle(&mut self) -> jointq::Result<f64> {
///         Ok(self.angle)
///     }
///
///     fn command_angle(&mut self, angle: f64) -> jointq::Result<()> {
///         self.angle = angle;
///         Ok(())
///     }
/// }
/// ```
pub trait Actuator: Send {
    /// Current joint angle in radians.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Unavailable`] if the connection or joint
    /// cannot be reached.
    fn read_angle(&mut self) -> Result<f64>;

    /// Command the joint toward `angle` (radians).
    ///
    /// Best-effort; may advance simulated time as a side effect.
    fn command_angle(&mut self, angle: f64) -> Result<()>;

    /// Called once when training starts.
    fn start(&mut self) -> Result<()> {
        Ok(())
    }

    /// Called once when training ends.
    fn stop(&mut self) -> Result<()> {
        Ok(())
    }

    /// Name used in logs.
    fn name(&self) -> &str {
        "actuator"
    }
}

impl<A: Actuator + ?Sized> Actuator for Box<A> {
    fn read_angle(&mut self) -> Result<f64> {
        (**self).read_angle()
    }

    fn command_angle(&mut self, angle: f64) -> Result<()> {
        (**self).command_angle(angle)
    }

    fn start(&mut self) -> Result<()> {
        (**self).start()
    }

    fn stop(&mut self) -> Result<()> {
        (**self).stop()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Multi-joint position interface.
///
/// Both robot control APIs the controller has been driven through expose
/// all joints of a body at once. [`crate::adapters::JointBusActuator`]
/// narrows a bus down to the single-joint [`Actuator`] port.
pub trait JointBus: Send {
    /// Number of joints addressed by `read_positions`/`write_positions`.
    fn joint_count(&self) -> usize;

    /// Name of the joint at `index`, if known.
    fn joint_name(&self, _index: usize) -> Option<&str> {
        None
    }

    /// Position of a single joint (radians).
    fn read_position(&mut self, index: usize) -> Result<f64>;

    /// Positions of every joint, in index order.
    fn read_positions(&mut self) -> Result<Vec<f64>> {
        (0..self.joint_count())
            .map(|i| self.read_position(i))
            .collect()
    }

    /// Target a single joint.
    fn write_position(&mut self, index: usize, position: f64) -> Result<()>;

    /// Target every joint. `positions.len()` must equal `joint_count()`.
    fn write_positions(&mut self, positions: &[f64]) -> Result<()>;

    fn start(&mut self) -> Result<()> {
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        Ok(())
    }
}
