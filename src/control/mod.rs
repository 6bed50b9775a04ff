//! Pure control-domain pieces of the controller
//!
//! Everything in this module is a deterministic function of its inputs:
//!
//! - [`StateDiscretizer`]: joint angle → state index
//! - [`ActionSpace`]: action index → signed angular delta
//! - [`RewardFunction`]: transition score by proximity to the target
//!
//! None of these types talk to an actuator or hold learned state.

pub mod action;
pub mod discretizer;
pub mod reward;

pub use action::ActionSpace;
pub use discretizer::StateDiscretizer;
pub use reward::{RewardBasis, RewardFunction};
