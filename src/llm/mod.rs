pub mod client;
pub mod codec;
pub mod prompts;
pub mod sse;

#[cfg(test)]
pub(crate) mod fake;

pub use client::*;
pub use codec::*;
pub use prompts::*;
pub use sse::*;
