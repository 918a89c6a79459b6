// Query classification and routing
pub mod router;

// Structured and semantic engines
pub mod engines;

// Routing workflow and response synthesis
pub mod workflow;

// Language model access
pub mod llm;

// Settings loaded at startup
pub mod config;

// Command-line front end
pub mod cli;

// Text and YAML helpers
pub mod utils;
