use instant::Instant;

/// Frame clock. The first tick returns zero; later ticks return the time since
/// the previous tick, clamped to `max_delta` seconds.
#[derive(Debug, Clone)]
pub struct Timer {
    last: Option<Instant>,
    max_delta: f32,
}

impl Timer {
    pub fn new(max_delta: f32) -> Self {
        Self {
            last: None,
            max_delta,
        }
    }

    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        let raw = match self.last.replace(now) {
            Some(last) => now.duration_since(last).as_secs_f32(),
            None => return 0.0,
        };
        clamp_delta(raw, self.max_delta)
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new(0.1)
    }
}

pub fn clamp_delta(raw: f32, max_delta: f32) -> f32 {
    if raw > max_delta {
        log::debug!("delta time clamped to {} (was {})", max_delta, raw);
        max_delta
    } else {
        raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_tick_is_zero() {
        let mut timer = Timer::new(0.1);
        assert_eq!(timer.tick(), 0.0);
        let second = timer.tick();
        assert!((0.0..=0.1).contains(&second));
    }

    #[test]
    fn long_frames_are_clamped() {
        assert_eq!(clamp_delta(0.5, 0.1), 0.1);
        assert_eq!(clamp_delta(0.016, 0.1), 0.016);
    }
}
