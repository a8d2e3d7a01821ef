pub mod doctor;
pub mod persist;
pub mod polygon;
pub mod store;

pub use persist::{FileZoneRepository, MemoryZoneRepository, ZoneRepository};
pub use store::{Zone, ZoneStore};
