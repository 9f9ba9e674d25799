//! Progressive accumulation: many short compute dispatches, each followed by
//! a display pass, until the requested samples per pixel are reached.
//!
//! ```text
//!   pass i:  uniform += s ─▶ compute(group i%2) ─▶ [timing] ─▶ cancel? ─▶ display(group i%2)
//!            acc[src] ──read──▶ compute ──write──▶ acc[dst] ──read──▶ display
//! ```
//!
//! [`AccumulationRun`] is the single-threaded state machine. [`RenderHost`]
//! runs it on a worker thread and makes sure a new run only starts after the
//! previous one has been cancelled and drained.

mod cancel;
mod error;
mod host;
mod pingpong;
mod plan;
mod progress;
mod run;

#[cfg(test)]
mod fake;

pub use cancel::CancellationToken;
pub use error::RenderError;
pub use host::{RenderHost, RenderJob, RunHandle, RunReport};
pub use pingpong::{PingPong, Slot};
pub use plan::{PassPlan, RenderRequest, DEFAULT_MAX_RAY_TRACE_DEPTH, DEFAULT_SAMPLES_PER_PASS};
pub use progress::{PassReport, ProgressEvent, ProgressSink, RenderSummary};
pub use run::{AccumulationRun, Programs, RunOutcome, RunState};
