pub mod download;
pub mod image_model;
pub mod runner;

pub use image_model::{GenerationRequest, ImageModel, ReplicateImageModel};
pub use runner::{Outcome, RunConfig, RunReport, run};
