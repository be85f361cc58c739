//! Use cases - request orchestration around the domain engine.

pub mod probability;

pub use probability::ProbabilityUseCases;
