mod alert;
mod control;
mod device;
mod reading;
mod threshold;

pub use alert::*;
pub use control::*;
pub use device::*;
pub use reading::*;
pub use threshold::*;

/// Rounds to one decimal place, the precision every displayed temperature uses.
pub fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
