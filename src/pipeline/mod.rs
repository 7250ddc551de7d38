pub mod batch;
pub mod consistency;
pub mod detectors;
pub mod extraction;
pub mod identity;
pub mod photo;
pub mod processor;
