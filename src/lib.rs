// The binary is the main deliverable; the library surface exists for integration tests
// and for embedding the pipeline in another service.
pub mod analysis;
pub mod cli;
pub mod config;
pub mod logging;
pub mod server;
pub mod worker;
