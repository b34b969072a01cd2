// src/response/mod.rs

pub mod generator;

pub use generator::{GeneratedReply, GeneratorConfig, ResponseGenerator};
