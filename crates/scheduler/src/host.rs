use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver};
use image::RgbaImage;
use renderer::GpuFacade;
use scene::Scene;

use crate::cancel::CancellationToken;
use crate::error::RenderError;
use crate::plan::RenderRequest;
use crate::progress::ProgressSink;
use crate::run::{AccumulationRun, Programs, RunOutcome};

/// Everything needed to start one run on a [`RenderHost`].
#[derive(Debug, Clone)]
pub struct RenderJob {
    pub request: RenderRequest,
    pub scene: Arc<Scene>,
    pub programs: Programs,
    /// Read the display target back once the loop stops.
    pub capture_frame: bool,
}

impl RenderJob {
    pub fn new(request: RenderRequest, scene: Arc<Scene>) -> Self {
        Self {
            request,
            scene,
            programs: Programs::default(),
            capture_frame: false,
        }
    }
}

#[derive(Debug)]
pub struct RunReport {
    pub outcome: RunOutcome,
    pub frame: Option<RgbaImage>,
}

/// Caller's end of a run started by [`RenderHost::start`].
pub struct RunHandle {
    cancel: CancellationToken,
    worker: JoinHandle<Result<RunReport, RenderError>>,
}

impl RunHandle {
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Token that cancels this run, for watchdogs and signal handlers.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.worker.is_finished()
    }

    pub fn wait(self) -> Result<RunReport, RenderError> {
        self.worker
            .join()
            .map_err(|_| RenderError::WorkerPanicked)?
    }
}

struct ActiveRun {
    cancel: CancellationToken,
    drained: Receiver<()>,
}

/// Owns the device and guarantees at most one run uses it at a time.
pub struct RenderHost<G> {
    gpu: Arc<G>,
    active: Option<ActiveRun>,
}

impl<G> RenderHost<G>
where
    G: GpuFacade + Send + Sync + 'static,
{
    pub fn new(gpu: Arc<G>) -> Self {
        Self { gpu, active: None }
    }

    pub fn gpu(&self) -> &Arc<G> {
        &self.gpu
    }

    /// Cancels and drains the previous run, if any, then starts `job` on a
    /// worker thread.
    pub fn start<S>(&mut self, job: RenderJob, mut sink: S) -> Result<RunHandle, RenderError>
    where
        S: ProgressSink + Send + 'static,
    {
        self.cancel_active();

        let cancel = CancellationToken::new();
        let (drained_tx, drained_rx) = bounded::<()>(0);
        let gpu = Arc::clone(&self.gpu);
        let token = cancel.clone();
        let worker = thread::Builder::new()
            .name("accumulation-run".into())
            .spawn(move || {
                // Dropped when the worker exits, which wakes `cancel_active`.
                let _drained = drained_tx;
                execute(gpu.as_ref(), job, &token, &mut sink)
            })
            .map_err(|err| RenderError::Spawn(err.to_string()))?;

        self.active = Some(ActiveRun {
            cancel: cancel.clone(),
            drained: drained_rx,
        });
        Ok(RunHandle { cancel, worker })
    }

    /// Signals the active run and blocks until its worker has exited.
    pub fn cancel_active(&mut self) {
        if let Some(previous) = self.active.take() {
            previous.cancel.cancel();
            // Disconnects once the worker drops its sender.
            let _ = previous.drained.recv();
            tracing::debug!("previous run drained");
        }
    }
}

fn execute<G: GpuFacade>(
    gpu: &G,
    job: RenderJob,
    cancel: &CancellationToken,
    sink: &mut dyn ProgressSink,
) -> Result<RunReport, RenderError> {
    let mut run = AccumulationRun::initialize(gpu, job.request, &job.scene, &job.programs)?;
    let outcome = run.run(cancel, sink)?;
    let frame = if job.capture_frame {
        Some(run.read_output()?)
    } else {
        None
    };
    Ok(RunReport { outcome, frame })
}
