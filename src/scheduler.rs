//! Rotation scheduling and the playback loop.
//!
//! [`Backdrop`] owns the animator, the catalog and the sampler settings and
//! is only ever mutated from one task. [`run_backdrop`] drives it from a
//! single `select!` loop with two due-times (animation tick and image
//! rotation) plus at most one in-flight sample. A rotation is only requested
//! while the animator is idle and no sample is pending.

use std::future::Future;
use std::io::Write;
use std::pin::Pin;
use std::time::Duration;

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::Rng;
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::{interval, interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::animator::{DiffusionAnimator, TickOutcome};
use crate::catalog::ImageCatalog;
use crate::config::BackdropConfig;
use crate::error::{ConfigError, LoadError};
use crate::glyph_grid::GlyphGrid;
use crate::sampler::{ImageFetcher, ImageSource, Sampler};

/// Receives every published frame.
pub trait FrameSink {
    fn frame_updated(&mut self, grid: &GlyphGrid) -> Result<()>;
}

/// Redraws the whole block in place on an ANSI terminal.
pub struct TerminalSink<W: Write> {
    out: W,
    cleared: bool,
}

impl<W: Write> TerminalSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            cleared: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> FrameSink for TerminalSink<W> {
    fn frame_updated(&mut self, grid: &GlyphGrid) -> Result<()> {
        if !self.cleared {
            self.out.write_all(b"\x1b[2J")?;
            self.cleared = true;
        }
        self.out.write_all(b"\x1b[H")?;
        self.out.write_all(grid.to_text().as_bytes())?;
        self.out.write_all(b"\n")?;
        self.out.flush().context("failed to flush frame to terminal")
    }
}

/// Forwards frames to a channel, for embedding in another event loop.
pub struct ChannelSink {
    sender: UnboundedSender<GlyphGrid>,
}

impl ChannelSink {
    pub fn new(sender: UnboundedSender<GlyphGrid>) -> Self {
        Self { sender }
    }
}

impl FrameSink for ChannelSink {
    fn frame_updated(&mut self, grid: &GlyphGrid) -> Result<()> {
        self.sender
            .send(grid.clone())
            .map_err(|_| anyhow::anyhow!("frame receiver was dropped"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    pub tick: Duration,
    pub rotation: Duration,
}

impl Timing {
    pub fn from_config(config: &BackdropConfig) -> Self {
        Self {
            tick: config.tick_interval(),
            rotation: config.rotation_interval(),
        }
    }
}

/// The animation state machine: Idle ⇄ Transitioning, plus a flag for a
/// sample that has been requested but not yet delivered.
#[derive(Debug)]
pub struct Backdrop<R = StdRng> {
    animator: DiffusionAnimator<R>,
    catalog: ImageCatalog,
    sampler: Sampler,
    sample_in_flight: bool,
}

impl Backdrop<StdRng> {
    /// Validates `config` and starts from a blank display.
    pub fn from_config(config: &BackdropConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let animator =
            DiffusionAnimator::with_seed(GlyphGrid::blank(config.rows, config.cols), config.seed)
                .with_batch_fraction(config.batch_fraction);
        Ok(Self::new(animator, config.catalog()?, config.sampler()))
    }
}

impl<R: Rng> Backdrop<R> {
    pub fn new(animator: DiffusionAnimator<R>, catalog: ImageCatalog, sampler: Sampler) -> Self {
        Self {
            animator,
            catalog,
            sampler,
            sample_in_flight: false,
        }
    }

    pub fn animator(&self) -> &DiffusionAnimator<R> {
        &self.animator
    }

    pub fn catalog(&self) -> &ImageCatalog {
        &self.catalog
    }

    pub fn sampler(&self) -> Sampler {
        self.sampler
    }

    pub fn current(&self) -> &GlyphGrid {
        self.animator.current()
    }

    pub fn sample_in_flight(&self) -> bool {
        self.sample_in_flight
    }

    /// Requests the entry under the cursor without advancing it. Used once at
    /// start-up so the first image shown is catalog entry 0.
    pub fn request_initial(&mut self) -> Option<ImageSource> {
        if self.is_busy() {
            return None;
        }
        self.sample_in_flight = true;
        Some(self.catalog.current().clone())
    }

    /// Called when the rotation period elapses. Returns the next source to
    /// sample, or `None` when a transition or sample is still running; the
    /// cursor only moves when a source is returned.
    pub fn request_rotation(&mut self) -> Option<ImageSource> {
        if self.animator.is_transitioning() {
            debug!("rotation skipped: transition in progress");
            return None;
        }
        if self.sample_in_flight {
            debug!("rotation skipped: sample still loading");
            return None;
        }

        let next = self.catalog.advance().clone();
        self.sample_in_flight = true;
        debug!(cursor = self.catalog.cursor(), source = %next, "rotation requested");
        Some(next)
    }

    /// Delivers a sample result. A failed load leaves the display, target and
    /// transition flag untouched. Returns whether a transition started.
    pub fn complete_sample(
        &mut self,
        source: &ImageSource,
        result: Result<GlyphGrid, LoadError>,
    ) -> bool {
        self.sample_in_flight = false;
        let grid = match result {
            Ok(grid) => grid,
            Err(error) => {
                warn!(source = %source, %error, "image load failed; keeping current frame");
                return false;
            }
        };

        if let Err(error) = self.animator.start_transition(grid) {
            warn!(source = %source, %error, "sampled grid rejected");
            return false;
        }

        if self.animator.is_transitioning() {
            info!(source = %source, "transition started");
            true
        } else {
            debug!(source = %source, "sampled image already on display");
            false
        }
    }

    pub fn tick(&mut self) -> TickOutcome {
        let outcome = self.animator.tick();
        if let TickOutcome::Converged { .. } = outcome {
            info!(cursor = self.catalog.cursor(), "transition converged");
        }
        outcome
    }

    fn is_busy(&self) -> bool {
        self.animator.is_transitioning() || self.sample_in_flight
    }
}

/// Counters reported when the loop exits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub frames_published: u64,
    pub samples_requested: u64,
    pub samples_failed: u64,
    pub transitions_started: u64,
}

type PendingSample<'a> = Pin<Box<dyn Future<Output = Result<GlyphGrid, LoadError>> + 'a>>;

fn begin_sample<'a, F>(sampler: Sampler, fetcher: &'a F, source: ImageSource) -> PendingSample<'a>
where
    F: ImageFetcher + 'a,
{
    Box::pin(async move { sampler.sample(fetcher, &source).await })
}

async fn await_pending(
    pending: &mut Option<(ImageSource, PendingSample<'_>)>,
) -> Result<GlyphGrid, LoadError> {
    match pending {
        Some((_, sample)) => sample.as_mut().await,
        None => std::future::pending().await,
    }
}

/// Plays `backdrop` into `sink` until `shutdown` resolves.
///
/// Publishes the current (initially blank) grid, samples catalog entry 0,
/// then ticks every `timing.tick` and attempts a rotation every
/// `timing.rotation`. Both timers are dropped on return.
///
/// Fails before publishing anything if either period is zero.
pub async fn run_backdrop<R, F, S, Fut>(
    backdrop: &mut Backdrop<R>,
    fetcher: &F,
    sink: &mut S,
    timing: Timing,
    shutdown: Fut,
) -> Result<RunSummary>
where
    R: Rng,
    F: ImageFetcher,
    S: FrameSink,
    Fut: Future<Output = ()>,
{
    anyhow::ensure!(!timing.tick.is_zero(), "tick interval must be > 0");
    anyhow::ensure!(!timing.rotation.is_zero(), "rotation interval must be > 0");

    let mut summary = RunSummary::default();
    let sampler = backdrop.sampler();

    let mut tick_timer = interval(timing.tick);
    tick_timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut rotation_timer = interval_at(Instant::now() + timing.rotation, timing.rotation);
    rotation_timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
    tokio::pin!(shutdown);

    sink.frame_updated(backdrop.current())?;
    summary.frames_published += 1;

    let mut pending = backdrop.request_initial().map(|source| {
        summary.samples_requested += 1;
        (source.clone(), begin_sample(sampler, fetcher, source))
    });

    loop {
        tokio::select! {
            biased;

            _ = &mut shutdown => {
                info!("shutdown requested; stopping timers");
                break;
            }

            result = await_pending(&mut pending), if pending.is_some() => {
                if let Some((source, _)) = pending.take() {
                    if result.is_err() {
                        summary.samples_failed += 1;
                    }
                    if backdrop.complete_sample(&source, result) {
                        summary.transitions_started += 1;
                    }
                }
            }

            _ = tick_timer.tick() => {
                if backdrop.tick().mutated() {
                    sink.frame_updated(backdrop.current())?;
                    summary.frames_published += 1;
                }
            }

            _ = rotation_timer.tick() => {
                if let Some(source) = backdrop.request_rotation() {
                    summary.samples_requested += 1;
                    pending = Some((source.clone(), begin_sample(sampler, fetcher, source)));
                }
            }
        }
    }

    debug!(?summary, "backdrop loop finished");
    Ok(summary)
}
