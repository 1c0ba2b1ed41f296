//! Per-player countdown clocks driven by one-second ticks.

use serde::{Deserialize, Serialize};

use crate::game::board::Color;

/// Starting time and Fischer increment for both players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeControl {
    /// `None` means unlimited.
    pub initial_secs: Option<u32>,
    pub increment_secs: u32,
}

impl TimeControl {
    pub const UNLIMITED: TimeControl = TimeControl {
        initial_secs: None,
        increment_secs: 0,
    };

    /// Clamps at `u32::MAX` seconds rather than wrapping.
    pub fn minutes(minutes: u32, increment_secs: u32) -> Self {
        Self {
            initial_secs: Some(minutes.saturating_mul(60)),
            increment_secs,
        }
    }
}

impl Default for TimeControl {
    fn default() -> Self {
        Self::UNLIMITED
    }
}

/// What a tick did to the clocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockTick {
    /// Nothing is running, or the running clock is unlimited.
    Idle,
    Running { color: Color, remaining_secs: u32 },
    /// `color`'s clock reached zero on this tick.
    Expired { color: Color },
}

/// The two clocks of a game. Only one side can ever be running, since the
/// running side is a single field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockPair {
    white_secs: Option<u32>,
    black_secs: Option<u32>,
    increment_secs: u32,
    running: Option<Color>,
}

impl ClockPair {
    pub fn new(control: TimeControl) -> Self {
        Self {
            white_secs: control.initial_secs,
            black_secs: control.initial_secs,
            increment_secs: control.increment_secs,
            running: None,
        }
    }

    /// Remaining seconds, `None` for an unlimited clock.
    pub fn remaining(&self, color: Color) -> Option<u32> {
        match color {
            Color::White => self.white_secs,
            Color::Black => self.black_secs,
        }
    }

    pub fn is_running(&self, color: Color) -> bool {
        self.running == Some(color)
    }

    pub fn running(&self) -> Option<Color> {
        self.running
    }

    fn slot(&mut self, color: Color) -> &mut Option<u32> {
        match color {
            Color::White => &mut self.white_secs,
            Color::Black => &mut self.black_secs,
        }
    }

    /// Start `color`'s clock, stopping the other.
    pub fn start(&mut self, color: Color) {
        if self.remaining(color) != Some(0) {
            self.running = Some(color);
        }
    }

    pub fn stop(&mut self) {
        self.running = None;
    }

    /// Credit `color` with one Fischer increment without touching which
    /// clock runs.
    pub fn add_increment(&mut self, color: Color) {
        let increment = self.increment_secs;
        if let Some(secs) = self.slot(color) {
            *secs = secs.saturating_add(increment);
        }
    }

    /// Hand the move to `next`: the side that just moved gets its
    /// increment and `next`'s clock starts.
    pub fn switch_to(&mut self, next: Color) {
        self.add_increment(next.opponent());
        self.running = None;
        self.start(next);
    }

    /// Advance the running clock by one second.
    pub fn tick(&mut self) -> ClockTick {
        let Some(color) = self.running else {
            return ClockTick::Idle;
        };
        let Some(secs) = self.slot(color) else {
            return ClockTick::Idle;
        };

        *secs = secs.saturating_sub(1);
        let remaining_secs = *secs;
        if remaining_secs == 0 {
            self.running = None;
            ClockTick::Expired { color }
        } else {
            ClockTick::Running {
                color,
                remaining_secs,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_one_clock_runs() {
        let mut clocks = ClockPair::new(TimeControl::minutes(1, 0));
        clocks.start(Color::White);
        assert!(clocks.is_running(Color::White));
        clocks.switch_to(Color::Black);
        assert!(clocks.is_running(Color::Black));
        assert!(!clocks.is_running(Color::White));
    }

    #[test]
    fn counts_down_and_expires_once() {
        let mut clocks = ClockPair::new(TimeControl {
            initial_secs: Some(3),
            increment_secs: 0,
        });
        clocks.start(Color::Black);
        let mut previous = 3;
        let mut expiries = 0;
        for _ in 0..10 {
            match clocks.tick() {
                ClockTick::Running { remaining_secs, .. } => {
                    assert!(remaining_secs < previous);
                    previous = remaining_secs;
                }
                ClockTick::Expired { color } => {
                    assert_eq!(color, Color::Black);
                    expiries += 1;
                }
                ClockTick::Idle => {}
            }
        }
        assert_eq!(expiries, 1);
        assert_eq!(clocks.remaining(Color::Black), Some(0));
        assert_eq!(clocks.remaining(Color::White), Some(3));

        // An expired clock cannot be restarted.
        clocks.start(Color::Black);
        assert_eq!(clocks.tick(), ClockTick::Idle);
    }

    #[test]
    fn increment_goes_to_the_side_that_moved() {
        let mut clocks = ClockPair::new(TimeControl::minutes(1, 2));
        clocks.start(Color::White);
        clocks.tick();
        clocks.switch_to(Color::Black);
        assert_eq!(clocks.remaining(Color::White), Some(61));
        assert_eq!(clocks.remaining(Color::Black), Some(60));
    }

    #[test]
    fn huge_minutes_saturate() {
        let control = TimeControl::minutes(u32::MAX, 0);
        assert_eq!(control.initial_secs, Some(u32::MAX));
    }

    #[test]
    fn increment_without_starting() {
        let mut clocks = ClockPair::new(TimeControl::minutes(1, 5));
        clocks.add_increment(Color::Black);
        assert_eq!(clocks.remaining(Color::Black), Some(65));
        assert_eq!(clocks.running(), None);
    }

    #[test]
    fn unlimited_never_expires() {
        let mut clocks = ClockPair::new(TimeControl::UNLIMITED);
        clocks.start(Color::White);
        for _ in 0..1000 {
            assert_eq!(clocks.tick(), ClockTick::Idle);
        }
        assert_eq!(clocks.remaining(Color::White), None);
    }
}
