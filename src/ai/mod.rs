//! AI-backed generation
//!
//! Proxy client with timeout and cold-start reporting, retry/backoff,
//! typed response shapes, prompt builders, and the services built on them.

pub mod backend;
pub mod citations;
pub mod generation;
pub mod http_client;
pub mod images;
pub mod progress;
pub mod prompts;
pub mod retry;
pub mod schema;

pub use backend::{BackendClient, BackendRequest, BackendResponse, GenerationConfig};
pub use generation::{flatten_plan_ingredients, GenerationService, MEALS_PER_DAY};
pub use http_client::{ReqwestTransport, Transport, TransportResponse};
pub use images::{ImageGenerator, ImageService};
pub use progress::{GenerationPhase, GenerationProgress, NoProgress, ProgressSink};
pub use retry::{with_retry, RetryPolicy, Retryable};
