//! elix-client: typed access to the Elix HTTP API.
//!
//! [`DashboardClient`] mirrors every route the server exposes. The
//! `*_or_demo` variants never fail: when a request does, the error is logged
//! and the answer is computed locally from the built-in sample data.
//! [`RealtimePoller`] fetches the realtime feed on a fixed interval.

mod client;
mod demo;
mod error;
mod poller;

pub use client::{DashboardClient, SignUp, SignUpOutcome, SignedUpUser};
pub use demo::DemoData;
pub use error::ClientError;
pub use poller::{PollerHandle, RealtimePoller};
