pub mod evaluator;
pub mod exchange;
pub mod logging;
pub mod metrics;
pub mod monitor;
pub mod notify;
pub mod registry;
pub mod state;
pub mod window;
