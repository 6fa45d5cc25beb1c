//! Preference store implementations

pub mod disk;
pub mod memory;

pub use disk::DiskPreferences;
pub use memory::MemoryPreferences;
