use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Context, Result};
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError};
use image::RgbaImage;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use renderer::WgpuBackend;
use scene::Scene;
use scheduler::{
    CancellationToken, ProgressEvent, RenderError, RenderHost, RenderJob, RunOutcome,
};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use crate::cli::RunArgs;
use crate::settings;

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

pub fn print_config(args: &RunArgs) -> Result<()> {
    let config = settings::resolve_config(args)?;
    let text = config
        .to_toml_string()
        .context("failed to serialise settings")?;
    print!("{text}");
    Ok(())
}

pub fn run(args: RunArgs) -> Result<()> {
    let config = settings::resolve_config(&args)?;
    let request = settings::render_request(&config, !args.no_timing);
    let programs = settings::programs(args.compute_shader.as_ref(), args.display_shader.as_ref())?;

    let seed = config.scene.seed.unwrap_or_else(|| rand::thread_rng().gen());
    let scene = Scene::random(&mut StdRng::seed_from_u64(seed));
    tracing::info!(
        seed,
        spheres = scene.len(),
        width = request.width,
        height = request.height,
        samples = request.samples_per_pixel,
        samples_per_pass = request.samples_per_compute_pass,
        "generated scene"
    );

    let backend = WgpuBackend::new(settings::gpu_options(&config))
        .context("failed to initialise GPU backend")?;
    let profile = backend.context().adapter_profile();
    tracing::info!(
        adapter = %profile.name,
        driver = %profile.driver,
        backend = ?profile.backend,
        "GPU adapter selected"
    );

    let output = config.output.path.clone();
    let mut job = RenderJob::new(request, Arc::new(scene));
    job.programs = programs;
    job.capture_frame = output.is_some();

    let mut host = RenderHost::new(Arc::new(backend));
    let (events_tx, events_rx) = unbounded::<ProgressEvent>();
    let handle = host.start(job, events_tx).context("failed to start render")?;

    let (done_tx, done_rx) = unbounded::<()>();
    let watchdog = config
        .time_limit
        .map(|limit| spawn_watchdog(limit, handle.cancellation_token(), done_rx))
        .transpose()?;

    print_progress(&events_rx, args.json);
    let report = handle.wait();
    drop(done_tx);
    if let Some(watchdog) = watchdog {
        let _ = watchdog.join();
    }
    let report = report.map_err(explain_render_error)?;

    let saved = match (report.frame.as_ref(), output) {
        (Some(frame), Some(path)) => {
            save_png(frame, &path)?;
            Some(path)
        }
        _ => None,
    };

    if args.json {
        let summary = JsonSummary::new(&report.outcome, &request, seed, saved);
        let stdout = io::stdout();
        let mut lock = stdout.lock();
        serde_json::to_writer_pretty(&mut lock, &summary).context("failed to write summary")?;
        writeln!(lock)?;
    }

    Ok(())
}

/// Allocation failures get a hint, since the accumulation buffers grow with
/// the image size.
fn explain_render_error(err: RenderError) -> anyhow::Error {
    let exhausted = matches!(&err, RenderError::Gpu(gpu) if gpu.is_resource_exhausted());
    let err = anyhow::Error::new(err).context("render failed");
    if exhausted {
        err.context("GPU ran out of memory; try a smaller --size or --resolution")
    } else {
        err
    }
}

/// Drains events until the worker drops its sender. With `--json` the human
/// lines move to stderr so stdout stays machine-readable.
fn print_progress(events: &Receiver<ProgressEvent>, json: bool) {
    for event in events.iter() {
        if json {
            eprintln!("{event}");
        } else {
            println!("{event}");
        }
    }
}

fn spawn_watchdog(
    limit: Duration,
    cancel: CancellationToken,
    done: Receiver<()>,
) -> Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("time-limit".into())
        .spawn(move || match done.recv_timeout(limit) {
            Err(RecvTimeoutError::Timeout) => {
                tracing::info!(limit = ?limit, "time limit reached; cancelling render");
                cancel.cancel();
            }
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {}
        })
        .context("failed to spawn time limit watchdog")
}

fn save_png(frame: &RgbaImage, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    frame
        .save_with_format(path, image::ImageFormat::Png)
        .with_context(|| format!("failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), "saved frame");
    Ok(())
}

#[derive(Debug, Serialize)]
struct JsonSummary {
    status: &'static str,
    width: u32,
    height: u32,
    seed: u64,
    passes: u32,
    samples_per_pixel: u32,
    compute_ms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    mean_ms_per_sample: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<PathBuf>,
}

impl JsonSummary {
    fn new(
        outcome: &RunOutcome,
        request: &scheduler::RenderRequest,
        seed: u64,
        output: Option<PathBuf>,
    ) -> Self {
        match outcome {
            RunOutcome::Completed(summary) => Self {
                status: "completed",
                width: summary.width,
                height: summary.height,
                seed,
                passes: summary.passes,
                samples_per_pixel: summary.samples_per_pixel,
                compute_ms: summary.compute_time.as_secs_f64() * 1000.0,
                mean_ms_per_sample: Some(summary.mean_ms_per_sample()),
                output,
            },
            RunOutcome::Cancelled {
                completed_passes,
                samples_per_pixel,
                compute_time,
            } => Self {
                status: "cancelled",
                width: request.width,
                height: request.height,
                seed,
                passes: *completed_passes,
                samples_per_pixel: *samples_per_pixel,
                compute_ms: compute_time.as_secs_f64() * 1000.0,
                mean_ms_per_sample: None,
                output,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use renderer::GpuError;
    use scheduler::{RenderRequest, RenderSummary};

    use super::*;

    #[test]
    fn completed_summary_json() {
        let outcome = RunOutcome::Completed(RenderSummary {
            width: 64,
            height: 36,
            passes: 4,
            samples_per_pixel: 12,
            compute_time: Duration::from_secs(3),
        });
        let request = RenderRequest::new(64, 36, 10).with_samples_per_pass(3);
        let summary = JsonSummary::new(&outcome, &request, 9, None);
        let value = serde_json::to_value(&summary).unwrap();

        assert_eq!(value["status"], "completed");
        assert_eq!(value["samples_per_pixel"], 12);
        assert_eq!(value["passes"], 4);
        assert_eq!(value["mean_ms_per_sample"], 250.0);
        assert!(value.get("output").is_none());
    }

    #[test]
    fn cancelled_summary_json() {
        let outcome = RunOutcome::Cancelled {
            completed_passes: 2,
            samples_per_pixel: 6,
            compute_time: Duration::from_millis(10),
        };
        let request = RenderRequest::new(8, 8, 12).with_samples_per_pass(3);
        let summary = JsonSummary::new(&outcome, &request, 1, Some(PathBuf::from("out.png")));
        let value = serde_json::to_value(&summary).unwrap();

        assert_eq!(value["status"], "cancelled");
        assert_eq!(value["passes"], 2);
        assert_eq!(value["width"], 8);
        assert_eq!(value["output"], "out.png");
        assert!(value.get("mean_ms_per_sample").is_none());
    }

    #[test]
    fn resource_exhaustion_suggests_a_smaller_image() {
        let err = explain_render_error(RenderError::Gpu(GpuError::ResourceExhausted {
            resource: "accumulation buffer".into(),
            message: "out of memory".into(),
        }));
        assert!(err.to_string().contains("--size"));
        assert!(format!("{err:#}").contains("render failed"));

        let err = explain_render_error(RenderError::InvalidRequest("zero width".into()));
        assert_eq!(err.to_string(), "render failed");
    }

    #[test]
    fn watchdog_cancels_after_limit() {
        let token = CancellationToken::new();
        let (_done_tx, done_rx) = unbounded::<()>();
        let watchdog = spawn_watchdog(Duration::from_millis(10), token.clone(), done_rx).unwrap();
        watchdog.join().unwrap();
        assert!(token.is_cancelled());
    }

    #[test]
    fn watchdog_stands_down_when_run_finishes() {
        let token = CancellationToken::new();
        let (done_tx, done_rx) = unbounded::<()>();
        let watchdog = spawn_watchdog(Duration::from_secs(60), token.clone(), done_rx).unwrap();
        drop(done_tx);
        watchdog.join().unwrap();
        assert!(!token.is_cancelled());
    }

    #[test]
    fn saves_png_into_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/frame.png");
        let frame = RgbaImage::from_pixel(4, 2, image::Rgba([10, 20, 30, 255]));
        save_png(&frame, &path).unwrap();
        let loaded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(loaded.dimensions(), (4, 2));
    }
}
