//! Playback clock.
//!
//! A [`TimeSource`] reports raw milliseconds on some basis (audio position,
//! `performance.now()`, a test counter). [`PlaybackClock`] anchors it at the
//! moment playback began and guarantees the elapsed value never goes below
//! zero and never decreases, even when the source is swapped mid-session.

pub trait TimeSource {
    fn now_ms(&self) -> f64;
}

impl<F: Fn() -> f64> TimeSource for F {
    fn now_ms(&self) -> f64 {
        self()
    }
}

pub struct PlaybackClock<S> {
    source: S,
    origin_ms: f64,
    /// Elapsed value already handed out; the floor for every later reading.
    last_ms: f64,
}

impl<S: TimeSource> PlaybackClock<S> {
    /// Anchor at the source's current reading.
    pub fn start(source: S) -> Self {
        let origin_ms = source.now_ms();
        Self::with_origin(source, origin_ms)
    }

    /// Anchor at an explicit origin, e.g. 0 for an audio element's position.
    pub fn with_origin(source: S, origin_ms: f64) -> Self {
        Self {
            source,
            origin_ms,
            last_ms: 0.0,
        }
    }

    pub fn elapsed_ms(&mut self) -> f64 {
        let raw = self.source.now_ms() - self.origin_ms;
        if raw.is_finite() && raw > self.last_ms {
            self.last_ms = raw;
        }
        self.last_ms
    }

    /// Last value returned by `elapsed_ms()` without sampling the source.
    pub fn peek_ms(&self) -> f64 {
        self.last_ms
    }

    /// Switch to another basis; the new source is re-anchored so elapsed
    /// time continues from the last reading instead of jumping.
    pub fn rebase<T: TimeSource>(self, source: T) -> PlaybackClock<T> {
        let origin_ms = source.now_ms() - self.last_ms;
        PlaybackClock {
            source,
            origin_ms,
            last_ms: self.last_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn counter(start: f64) -> (Rc<Cell<f64>>, impl Fn() -> f64) {
        let cell = Rc::new(Cell::new(start));
        let c = cell.clone();
        (cell, move || c.get())
    }

    #[test]
    fn elapsed_is_relative_to_start() {
        let (t, src) = counter(5_000.0);
        let mut clock = PlaybackClock::start(src);
        assert_eq!(clock.elapsed_ms(), 0.0);
        t.set(5_250.0);
        assert_eq!(clock.elapsed_ms(), 250.0);
    }

    #[test]
    fn never_decreases_or_goes_negative() {
        let (t, src) = counter(100.0);
        let mut clock = PlaybackClock::with_origin(src, 200.0);
        assert_eq!(clock.elapsed_ms(), 0.0);
        t.set(700.0);
        assert_eq!(clock.elapsed_ms(), 500.0);
        t.set(650.0);
        assert_eq!(clock.elapsed_ms(), 500.0);
        t.set(f64::NAN);
        assert_eq!(clock.elapsed_ms(), 500.0);
        assert_eq!(clock.peek_ms(), 500.0);
    }

    #[test]
    fn rebase_continues_without_jump() {
        let (audio, audio_src) = counter(0.0);
        let mut clock = PlaybackClock::with_origin(audio_src, 0.0);
        audio.set(300.0);
        assert_eq!(clock.elapsed_ms(), 300.0);

        let (wall, wall_src) = counter(90_000.0);
        let mut clock = clock.rebase(wall_src);
        assert_eq!(clock.elapsed_ms(), 300.0);
        wall.set(90_100.0);
        assert_eq!(clock.elapsed_ms(), 400.0);
    }
}
