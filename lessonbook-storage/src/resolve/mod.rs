//! Resolution pipeline: live source, then durable cache, then mock dataset.
//!
//! Every resolved value carries a [`Provenance`] tag so callers can tell a
//! live answer from a cached or mock stand-in, and an empty live result from
//! a failed one.

pub mod mock;
pub mod pipeline;
pub mod provenance;
pub mod traits;

pub use pipeline::Resolver;
pub use provenance::{FallbackReason, Provenance, Resolved};
pub use traits::{LiveFn, LiveSource, Resource};
