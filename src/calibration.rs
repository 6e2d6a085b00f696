//! On-line offset calibration
//!
//! [`Calibration`] estimates the zero-motion bias of the accelerometer from
//! the stream of samples the host feeds it. It never touches the bus.
//!
//! Samples enter a sliding window of [`WINDOW_LEN`] vectors. Once the window
//! is full, the spread of each axis (`max - min` over the window) is compared
//! with the configured variation. When every axis spreads less than the
//! variation the device is judged stationary, and the estimate moves a
//! quarter of the way toward the window centroid (the first stationary window
//! seeds it directly). A single axis at or above the variation means the
//! device is moving, and the estimate is left alone.
//!
//! All state sits behind the host-supplied [`RawLock`], so `update()` and the
//! getters may be called from different execution contexts.
//!
//! # Example
//!
//! ```
//! use bma250::{Calibration, NoLock, Vector3};
//!
//! let calibration = Calibration::new(NoLock::new());
//! calibration.init()?;
//! for _ in 0..16 {
//!     calibration.update(&Vector3::new(12_000, -8_000, 9_806_650))?;
//! }
//! assert_eq!(
//!     calibration.offset()?,
//!     Some(Vector3::new(12_000, -8_000, 9_806_650))
//! );
//! # Ok::<(), bma250::Error>(())
//! ```

use crate::Error;
use crate::lock::{Guarded, RawLock};
use crate::report::Report;
use crate::vector::Vector3;

/// Number of samples the motion check looks at
pub const WINDOW_LEN: usize = 8;

/// Variation programmed on first use, in µm/s²
pub const DEFAULT_VARIATION: i32 = 250_000;

/// Movement of the estimate that is worth a [`Report::CALIB_OFFSET_CHANGED`],
/// in µm/s²
pub const OFFSET_CHANGE_EPSILON: i32 = 10_000;

/// Each stationary window closes `1 / STEP_DIVISOR` of the remaining gap
const STEP_DIVISOR: i64 = 4;

/// Calibration threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibrationThreshold {
    /// Per-axis spread below which the device counts as stationary, in µm/s²
    pub variation: i32,
}

impl Default for CalibrationThreshold {
    fn default() -> Self {
        Self {
            variation: DEFAULT_VARIATION,
        }
    }
}

/// Fixed-size ring of recent samples
#[derive(Debug)]
struct Window {
    samples: [Vector3; WINDOW_LEN],
    len: usize,
    next: usize,
}

impl Window {
    const fn new() -> Self {
        Self {
            samples: [Vector3::ZERO; WINDOW_LEN],
            len: 0,
            next: 0,
        }
    }

    fn push(&mut self, sample: Vector3) {
        self.samples[self.next] = sample;
        self.next = (self.next + 1) % WINDOW_LEN;
        self.len = (self.len + 1).min(WINDOW_LEN);
    }

    const fn is_full(&self) -> bool {
        self.len == WINDOW_LEN
    }

    /// Centroid and the widest per-axis spread (`max - min`) of the samples held
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    fn statistics(&self) -> (Vector3, i64) {
        let samples = &self.samples[..self.len];
        let n = samples.len() as i64;

        let mut sum = [0i64; 3];
        let mut min = [i32::MAX; 3];
        let mut max = [i32::MIN; 3];
        for sample in samples {
            for (axis, c) in sample.to_array().into_iter().enumerate() {
                sum[axis] += i64::from(c);
                min[axis] = min[axis].min(c);
                max[axis] = max[axis].max(c);
            }
        }
        // The mean of i32 values fits in i32
        let centroid = Vector3::from(sum.map(|s| (s / n) as i32));

        let spread = min
            .iter()
            .zip(max)
            .map(|(&lo, hi)| i64::from(hi) - i64::from(lo))
            .max()
            .unwrap_or(0);

        (centroid, spread)
    }
}

/// Move `current` toward `target` by a fraction of the gap, at least one unit
#[allow(clippy::cast_possible_truncation)]
fn step_toward(current: i32, target: i32) -> i32 {
    let gap = i64::from(target) - i64::from(current);
    if gap == 0 {
        return current;
    }
    let step = match gap / STEP_DIVISOR {
        0 => gap.signum(),
        step => step,
    };
    // current + step lies between current and target
    (i64::from(current) + step) as i32
}

/// Running state between `init()` and `term()`
#[derive(Debug)]
struct Engine {
    window: Window,
    estimate: Option<Vector3>,
    reported: Option<Vector3>,
    report: Report,
}

impl Engine {
    const fn new() -> Self {
        Self {
            window: Window::new(),
            estimate: None,
            reported: None,
            report: Report::empty(),
        }
    }

    fn update(&mut self, sample: Vector3, threshold: CalibrationThreshold) {
        self.window.push(sample);
        if !self.window.is_full() {
            return;
        }

        let (centroid, spread) = self.window.statistics();
        if spread >= i64::from(threshold.variation) {
            return;
        }

        let estimate = match self.estimate {
            None => centroid,
            Some(current) => current.zip_with(centroid, step_toward),
        };
        self.estimate = Some(estimate);
        self.report |= Report::CALIB;

        let moved = self.reported.is_none_or(|reported| {
            (estimate - reported).any(|d| d.saturating_abs() > OFFSET_CHANGE_EPSILON)
        });
        if moved {
            #[cfg(feature = "defmt")]
            defmt::debug!("Calibration offset: {}", estimate);
            self.reported = Some(estimate);
            self.report |= Report::CALIB_OFFSET_CHANGED;
        }
    }
}

#[derive(Debug)]
struct State {
    threshold: CalibrationThreshold,
    engine: Option<Engine>,
}

/// Offset calibration engine
///
/// `L` guards the internal state; use [`NoLock`](crate::NoLock) on a single
/// execution context or a real lock when `update()` and the getters run in
/// different contexts.
pub struct Calibration<L> {
    state: Guarded<L, State>,
}

impl<L: RawLock> Calibration<L> {
    /// Create an uninitialized engine guarded by `lock`
    pub const fn new(lock: L) -> Self {
        Self {
            state: Guarded::new(
                lock,
                State {
                    threshold: CalibrationThreshold {
                        variation: DEFAULT_VARIATION,
                    },
                    engine: None,
                },
            ),
        }
    }

    fn access<R>(&self, f: impl FnOnce(&mut State) -> Result<R, Error>) -> Result<R, Error> {
        self.state.with(f).map_err(Error::from_lock)?
    }

    fn engine<R>(
        &self,
        f: impl FnOnce(&mut Engine, CalibrationThreshold) -> R,
    ) -> Result<R, Error> {
        self.access(|state| {
            let threshold = state.threshold;
            let engine = state.engine.as_mut().ok_or(Error::NotInitialized)?;
            Ok(f(engine, threshold))
        })
    }

    /// Start a calibration session with an unknown offset
    ///
    /// The variation survives `term()`/`init()` cycles.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyActive` if a session is running, or a lock error.
    pub fn init(&self) -> Result<(), Error> {
        self.access(|state| {
            if state.engine.is_some() {
                return Err(Error::AlreadyActive);
            }
            state.engine = Some(Engine::new());
            Ok(())
        })
    }

    /// End the session and forget the estimate
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized` without a running session, or a lock error.
    pub fn term(&self) -> Result<(), Error> {
        self.access(|state| {
            state.engine.take().ok_or(Error::NotInitialized)?;
            Ok(())
        })
    }

    /// `true` while a session is running
    ///
    /// # Errors
    ///
    /// Returns a lock error.
    pub fn is_initialized(&self) -> Result<bool, Error> {
        self.access(|state| Ok(state.engine.is_some()))
    }

    /// Feed one acceleration sample in µm/s²
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized` without a running session, or a lock error.
    pub fn update(&self, acceleration: &Vector3) -> Result<(), Error> {
        self.engine(|engine, threshold| engine.update(*acceleration, threshold))
    }

    /// Current calibration offset, `None` until a stationary window was seen
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized` without a running session, or a lock error.
    pub fn offset(&self) -> Result<Option<Vector3>, Error> {
        self.engine(|engine, _| engine.estimate)
    }

    /// `true` once a stationary window produced an estimate
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized` without a running session, or a lock error.
    pub fn has_estimate(&self) -> Result<bool, Error> {
        self.engine(|engine, _| engine.estimate.is_some())
    }

    /// Current threshold
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized` without a running session, or a lock error.
    pub fn threshold(&self) -> Result<CalibrationThreshold, Error> {
        self.engine(|_, threshold| threshold)
    }

    /// Set the threshold; applies from the next `update()`
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for a negative variation, `NotInitialized`
    /// without a running session, or a lock error.
    pub fn set_threshold(&self, threshold: CalibrationThreshold) -> Result<(), Error> {
        self.access(|state| {
            if state.engine.is_none() {
                return Err(Error::NotInitialized);
            }
            if threshold.variation < 0 {
                return Err(Error::InvalidArgument);
            }
            state.threshold = threshold;
            Ok(())
        })
    }

    /// Return the pending report flags and clear them
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized` without a running session, or a lock error.
    pub fn take_report(&self) -> Result<Report, Error> {
        self.engine(|engine, _| engine.report.take())
    }
}
