pub mod components;
pub mod config;
pub mod electrode;
pub mod morphology;

pub use components::Connectivity;
pub use config::MaskConfig;
pub use electrode::{build_electrode_mask, build_mask, ElectrodeMask, ExcludedRegion};
