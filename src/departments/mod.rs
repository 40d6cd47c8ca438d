//! Department state machines registered with the coordinator

pub mod engineering;
pub mod helm;
pub mod memory;
pub mod ops;
pub mod tactical;

pub use engineering::Engineering;
pub use helm::{Course, Helm};
pub use memory::CommandMemory;
pub use ops::{Contact, Ops, ScanRecord, ScanType};
pub use tactical::{ShieldState, Tactical, TargetLock, WeaponKind};
