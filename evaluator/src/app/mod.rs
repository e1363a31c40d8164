//! Application layer
//!
//! Batching, request building, retrying and correlation around the
//! threat-matching call, plus the runner that drives processing units.

pub mod batch;
pub mod correlator;
pub mod evaluation_unit;
pub mod pipeline;
pub mod query_client;
pub mod request;
pub mod retry;

pub use batch::{DEFAULT_BATCH_SIZE, MAX_BATCH_SIZE};
pub use pipeline::{run, PipelineConfig};
pub use query_client::{QueryClientConfig, ThreatQueryClient, SAFE_BROWSING_URL};
pub use request::ClientInfo;
pub use retry::{Retrier, RetryConfig};
