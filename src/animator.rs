//! Randomized cell diffusion from the displayed grid toward a target grid.
//!
//! Each tick collects the differing cells and copies the target glyph into
//! `max(1, floor(fraction * |diff|))` of them, drawn uniformly **with
//! replacement**. Repeated draws of the same cell are allowed, so a tick may
//! touch fewer distinct cells than the batch size.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::GridError;
use crate::glyph_grid::GlyphGrid;

pub const DEFAULT_BATCH_FRACTION: f64 = 0.1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimationState {
    pub current: GlyphGrid,
    pub target: GlyphGrid,
    pub transitioning: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not transitioning; nothing was touched.
    Idle,
    /// Cells were rewritten and some still differ.
    Advanced { draws: usize, remaining: usize },
    /// The display now equals the target and the animator went idle.
    Converged { draws: usize },
}

impl TickOutcome {
    /// Whether the displayed grid changed and should be re-rendered.
    pub fn mutated(self) -> bool {
        match self {
            Self::Idle => false,
            Self::Advanced { .. } => true,
            Self::Converged { draws } => draws > 0,
        }
    }
}

#[derive(Debug)]
pub struct DiffusionAnimator<R = StdRng> {
    state: AnimationState,
    batch_fraction: f64,
    rng: R,
}

impl DiffusionAnimator<StdRng> {
    /// Seeded when `seed` is given, OS entropy otherwise.
    pub fn with_seed(initial: GlyphGrid, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self::new(initial, rng)
    }
}

impl<R: Rng> DiffusionAnimator<R> {
    /// Starts idle with `initial` as both the displayed and target grid.
    pub fn new(initial: GlyphGrid, rng: R) -> Self {
        Self {
            state: AnimationState {
                current: initial.clone(),
                target: initial,
                transitioning: false,
            },
            batch_fraction: DEFAULT_BATCH_FRACTION,
            rng,
        }
    }

    /// `fraction` must lie in `(0, 1]`; config validation enforces this.
    pub fn with_batch_fraction(mut self, fraction: f64) -> Self {
        self.batch_fraction = fraction;
        self
    }

    pub fn state(&self) -> &AnimationState {
        &self.state
    }

    pub fn current(&self) -> &GlyphGrid {
        &self.state.current
    }

    pub fn target(&self) -> &GlyphGrid {
        &self.state.target
    }

    pub fn is_transitioning(&self) -> bool {
        self.state.transitioning
    }

    /// Sets a new target. If it already equals the display the animator stays
    /// idle and no tick is needed.
    ///
    /// Callers must not start a transition while one is running; the
    /// rotation scheduler checks [`Self::is_transitioning`] first.
    pub fn start_transition(&mut self, target: GlyphGrid) -> Result<(), GridError> {
        self.state.current.ensure_same_shape(&target)?;
        self.state.transitioning = self.state.current != target;
        self.state.target = target;
        Ok(())
    }

    pub fn tick(&mut self) -> TickOutcome {
        if !self.state.transitioning {
            return TickOutcome::Idle;
        }

        let diff = self.state.current.diff_positions(&self.state.target);
        if diff.is_empty() {
            self.state.transitioning = false;
            return TickOutcome::Converged { draws: 0 };
        }

        let draws = batch_size(diff.len(), self.batch_fraction);
        for _ in 0..draws {
            let (row, col) = diff[self.rng.random_range(0..diff.len())];
            if let Some(glyph) = self.state.target.get(row, col) {
                self.state.current.set(row, col, glyph);
            }
        }

        if self.state.current == self.state.target {
            self.state.transitioning = false;
            TickOutcome::Converged { draws }
        } else {
            let remaining = self.state.current.diff_positions(&self.state.target).len();
            TickOutcome::Advanced { draws, remaining }
        }
    }
}

/// `max(1, floor(fraction * diff_len))`.
pub fn batch_size(diff_len: usize, fraction: f64) -> usize {
    ((diff_len as f64 * fraction).floor() as usize).max(1)
}
