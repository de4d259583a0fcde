//! Infinite-loop carousel state machine.
//!
//! The track holds `K` leading clones (copies of the last `K` slides), the
//! `N` real slides, then `K` trailing clones (copies of the first `K`).
//! Moving onto a clone animates normally; when the transition ends the
//! position is swapped, without animation, for the real slide the clone
//! mirrors.

use thiserror::Error;

/// Minimum horizontal travel, in pixels, for a touch to count as a swipe.
pub const SWIPE_THRESHOLD_PX: f64 = 50.0;
/// Interval between automatic advances.
pub const AUTO_PLAY_INTERVAL_MS: u64 = 3000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CarouselError {
    #[error("carousel needs at least one slide")]
    Empty,
    #[error("clone count {clones} exceeds slide count {slides}")]
    TooManyClones { clones: usize, slides: usize },
}

/// One position on the track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackSlot {
    /// Real slide shown at this position.
    pub slide: usize,
    pub is_clone: bool,
}

/// Result of a transition finishing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settle {
    /// Already on a real slide.
    Stay,
    /// Jump, without animation, to this track index.
    Reset(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Carousel {
    slides: usize,
    clones: usize,
    index: usize,
    transitioning: bool,
}

impl Carousel {
    /// A carousel over `slides` real slides with `clones` copies on each side,
    /// positioned on the first real slide.
    ///
    /// # Errors
    ///
    /// [`CarouselError::Empty`] with no slides;
    /// [`CarouselError::TooManyClones`] when `clones` exceeds `slides`.
    pub fn new(slides: usize, clones: usize) -> Result<Self, CarouselError> {
        if slides == 0 {
            return Err(CarouselError::Empty);
        }
        if clones > slides {
            return Err(CarouselError::TooManyClones { clones, slides });
        }

        Ok(Self {
            slides,
            clones,
            index: clones,
            transitioning: false,
        })
    }

    /// Place the carousel at a track index and settle it as if a transition
    /// had just ended there. Out-of-range indices clamp to the track.
    #[must_use]
    pub fn at(mut self, index: usize) -> Self {
        self.index = index.min(self.track_len() - 1);
        self.transitioning = true;
        self.transition_end();
        self
    }

    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub const fn is_transitioning(&self) -> bool {
        self.transitioning
    }

    #[must_use]
    pub const fn track_len(&self) -> usize {
        self.slides + 2 * self.clones
    }

    /// Real slide under the current position.
    #[must_use]
    pub const fn real_index(&self) -> usize {
        self.slot(self.index).slide
    }

    #[must_use]
    pub const fn slot(&self, index: usize) -> TrackSlot {
        if index < self.clones {
            TrackSlot {
                slide: self.slides - self.clones + index,
                is_clone: true,
            }
        } else if index < self.clones + self.slides {
            TrackSlot {
                slide: index - self.clones,
                is_clone: false,
            }
        } else {
            TrackSlot {
                slide: (index - self.clones - self.slides) % self.slides,
                is_clone: true,
            }
        }
    }

    /// Every track position in order, clones included.
    #[must_use]
    pub fn track(&self) -> Vec<TrackSlot> {
        (0..self.track_len()).map(|i| self.slot(i)).collect()
    }

    /// Start an animated move forward. Ignored while a transition is in
    /// flight or at the end of the track.
    pub fn next(&mut self) -> bool {
        if self.transitioning || self.index + 1 >= self.track_len() {
            return false;
        }
        self.index += 1;
        self.transitioning = true;
        true
    }

    /// Start an animated move backward. Ignored while a transition is in
    /// flight or at the start of the track.
    pub fn prev(&mut self) -> bool {
        if self.transitioning || self.index == 0 {
            return false;
        }
        self.index -= 1;
        self.transitioning = true;
        true
    }

    /// Finish the current transition, swapping a clone for its real slide.
    pub fn transition_end(&mut self) -> Settle {
        self.transitioning = false;

        let end = self.slides + self.clones;
        let target = if self.index >= end {
            self.clones + (self.index - end)
        } else if self.index < self.clones {
            self.slides + self.index
        } else {
            return Settle::Stay;
        };

        self.index = target;
        Settle::Reset(target)
    }

    /// Handle a touch that started at `start_x` and ended at `end_x`.
    /// A leftward swipe moves forward.
    pub fn swipe(&mut self, start_x: f64, end_x: f64) -> bool {
        let diff = start_x - end_x;
        if diff.abs() <= SWIPE_THRESHOLD_PX {
            return false;
        }
        if diff > 0.0 { self.next() } else { self.prev() }
    }

    /// Track translation for the current index.
    #[must_use]
    pub fn offset(&self, card_width: f64) -> f64 {
        #[allow(clippy::cast_precision_loss)] // Track length is tiny
        let index = self.index as f64;
        -(index * card_width)
    }

    /// Index the next button should request, already settled.
    #[must_use]
    pub fn next_index(&self) -> usize {
        let mut probe = self.clone();
        probe.transitioning = false;
        probe.next();
        probe.transition_end();
        probe.index
    }

    /// Index the previous button should request, already settled.
    #[must_use]
    pub fn prev_index(&self) -> usize {
        let mut probe = self.clone();
        probe.transitioning = false;
        probe.prev();
        probe.transition_end();
        probe.index
    }
}
