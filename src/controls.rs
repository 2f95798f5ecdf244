pub mod drift;

pub use drift::DriftCorrection;
