//! Display color selection
//!
//! Each new participant is given a color token by a [`ColorPicker`] owned by
//! the room. Production rooms pick uniformly at random from a small ANSI
//! palette; tests inject a deterministic picker.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::types::Color;

/// Default palette: red, green, yellow, blue, magenta, cyan
pub const DEFAULT_PALETTE: [&str; 6] = [
    "\x1b[31m", "\x1b[32m", "\x1b[33m", "\x1b[34m", "\x1b[35m", "\x1b[36m",
];

/// Strategy for choosing a display color for a new participant
pub trait ColorPicker: Send + Sync {
    /// Color for the next participant. Colors may repeat.
    fn next_color(&self) -> Color;
}

/// Uniform random selection from a fixed palette
///
/// Holds its own generator; nothing is shared process-wide.
#[derive(Debug)]
pub struct RandomColorPicker {
    palette: Vec<Color>,
    rng: Mutex<StdRng>,
}

impl RandomColorPicker {
    pub fn new(palette: &[&str]) -> Self {
        Self::with_rng(palette, StdRng::from_entropy())
    }

    /// Picker with a seeded generator, for reproducible sequences
    #[cfg(test)]
    fn seeded(palette: &[&str], seed: u64) -> Self {
        Self::with_rng(palette, StdRng::seed_from_u64(seed))
    }

    fn with_rng(palette: &[&str], rng: StdRng) -> Self {
        Self {
            palette: palette.iter().map(|&code| Color::from(code)).collect(),
            rng: Mutex::new(rng),
        }
    }
}

impl Default for RandomColorPicker {
    fn default() -> Self {
        Self::new(&DEFAULT_PALETTE)
    }
}

impl ColorPicker for RandomColorPicker {
    fn next_color(&self) -> Color {
        if self.palette.is_empty() {
            return Color::none();
        }
        let index = self
            .rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .gen_range(0..self.palette.len());
        self.palette[index].clone()
    }
}

/// Deterministic picker that cycles through the given colors in order
#[derive(Debug)]
pub struct FixedColorPicker {
    colors: Vec<Color>,
    cursor: AtomicUsize,
}

impl FixedColorPicker {
    pub fn new(colors: &[&str]) -> Self {
        Self {
            colors: colors.iter().map(|&code| Color::from(code)).collect(),
            cursor: AtomicUsize::new(0),
        }
    }

    /// Picker that never colors names
    pub fn plain() -> Self {
        Self::new(&[])
    }
}

impl ColorPicker for FixedColorPicker {
    fn next_color(&self) -> Color {
        if self.colors.is_empty() {
            return Color::none();
        }
        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % self.colors.len();
        self.colors[index].clone()
    }
}
