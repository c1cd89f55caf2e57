//! Lambda handler and request processing

pub mod event_handler;
pub mod handler;
pub mod helpers;
pub mod parsing;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export the main handler for convenience
pub use event_handler::Relay;
pub use handler::{function_handler as handler, process_request};
