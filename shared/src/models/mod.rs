//! Domain models for the Gebeya inventory platform

mod alert;
mod item;
mod movement;
mod sale;

pub use alert::*;
pub use item::*;
pub use movement::*;
pub use sale::*;
