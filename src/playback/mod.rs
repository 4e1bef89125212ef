//! Timed year playback.
//!
//! The controller is a two-state machine. [`transition`] is a pure function
//! from the current state and an event to the next state plus a list of
//! [`PlaybackEffect`]s; the caller applies the effects. Selection and
//! recompute effects go to the session, timer effects go to the
//! [`PlaybackTimer`], which owns the only tick source.
//!
//! ```
//! use std::time::Duration;
//! use lifedash::dataset::{YearDomain, YearKey};
//! use lifedash::playback::{transition, PlaybackEffect, PlaybackEvent, PlaybackState};
//!
//! let years = YearDomain::new([2001, 2002]);
//! let period = Duration::from_millis(1200);
//!
//! let started = transition(PlaybackState::Stopped, PlaybackEvent::Start, &years, period).unwrap();
//! assert_eq!(started.next, PlaybackState::Playing { year: 2001 });
//! assert!(started.effects.contains(&PlaybackEffect::ScheduleTick(period)));
//!
//! let ticked = transition(started.next, PlaybackEvent::Tick, &years, period).unwrap();
//! let finished = transition(ticked.next, PlaybackEvent::Tick, &years, period).unwrap();
//! assert_eq!(finished.next, PlaybackState::Stopped);
//! assert!(finished.effects.contains(&PlaybackEffect::SelectYear(YearKey::All)));
//! ```

mod driver;
mod timer;

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use driver::{PlaybackDriver, PlayerCommand, PlayerHandle};
pub use timer::PlaybackTimer;

use crate::dataset::{YearDomain, YearKey};
use crate::error::{Error, Result};

/// Playback state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PlaybackState {
    /// No timer is armed.
    #[default]
    Stopped,
    /// Exactly one timer is armed and `year` is on screen.
    Playing {
        /// Year currently selected by playback.
        year: i32,
    },
}

impl PlaybackState {
    /// Whether playback is running.
    #[must_use]
    pub fn is_playing(self) -> bool {
        matches!(self, Self::Playing { .. })
    }
}

/// Input to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackEvent {
    /// Play button.
    Start,
    /// Timer fired.
    Tick,
    /// Pause button, or any manual filter interaction.
    Stop,
}

/// Side effect requested by a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackEffect {
    /// Change the filter's year selection.
    SelectYear(YearKey),
    /// Run a full recompute pass.
    Recompute,
    /// Arm the repeating tick timer.
    ScheduleTick(Duration),
    /// Cancel the tick timer.
    CancelTick,
}

/// Result of one transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// State after the event.
    pub next: PlaybackState,
    /// Effects to apply, in order.
    pub effects: Vec<PlaybackEffect>,
}

impl Transition {
    fn stay(state: PlaybackState) -> Self {
        Self {
            next: state,
            effects: Vec::new(),
        }
    }
}

/// Apply `event` to `state`.
///
/// `Start` while playing is rejected; the caller must stop first. A tick or
/// stop that arrives while stopped changes nothing, and so does a start over
/// a domain with no years.
pub fn transition(
    state: PlaybackState,
    event: PlaybackEvent,
    years: &YearDomain,
    period: Duration,
) -> Result<Transition> {
    let outcome = match (state, event) {
        (PlaybackState::Stopped, PlaybackEvent::Start) => match years.first() {
            Some(first) => Transition {
                next: PlaybackState::Playing { year: first },
                effects: vec![
                    PlaybackEffect::SelectYear(YearKey::Year(first)),
                    PlaybackEffect::Recompute,
                    PlaybackEffect::ScheduleTick(period),
                ],
            },
            None => Transition::stay(state),
        },
        (PlaybackState::Playing { year }, PlaybackEvent::Start) => {
            return Err(Error::PlaybackAlreadyRunning { year });
        }
        (PlaybackState::Playing { year }, PlaybackEvent::Tick) => match years.next_after(year) {
            Some(next) => Transition {
                next: PlaybackState::Playing { year: next },
                effects: vec![
                    PlaybackEffect::SelectYear(YearKey::Year(next)),
                    PlaybackEffect::Recompute,
                ],
            },
            None => Transition {
                next: PlaybackState::Stopped,
                effects: vec![
                    PlaybackEffect::SelectYear(YearKey::All),
                    PlaybackEffect::Recompute,
                    PlaybackEffect::CancelTick,
                ],
            },
        },
        (PlaybackState::Playing { .. }, PlaybackEvent::Stop) => Transition {
            next: PlaybackState::Stopped,
            effects: vec![PlaybackEffect::CancelTick],
        },
        (PlaybackState::Stopped, PlaybackEvent::Tick | PlaybackEvent::Stop) => {
            Transition::stay(state)
        }
    };
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PERIOD: Duration = Duration::from_millis(1200);

    fn years() -> YearDomain {
        YearDomain::new([2001, 2002, 2003])
    }

    #[test]
    fn test_start_selects_first_year_and_arms_timer() {
        let t = transition(PlaybackState::Stopped, PlaybackEvent::Start, &years(), PERIOD).unwrap();
        assert_eq!(t.next, PlaybackState::Playing { year: 2001 });
        assert_eq!(
            t.effects,
            vec![
                PlaybackEffect::SelectYear(YearKey::Year(2001)),
                PlaybackEffect::Recompute,
                PlaybackEffect::ScheduleTick(PERIOD),
            ]
        );
    }

    #[test]
    fn test_start_while_playing_is_rejected() {
        let result = transition(
            PlaybackState::Playing { year: 2002 },
            PlaybackEvent::Start,
            &years(),
            PERIOD,
        );
        assert!(matches!(result, Err(Error::PlaybackAlreadyRunning { year: 2002 })));
    }

    #[test]
    fn test_ticks_walk_every_year_then_return_to_all() {
        let domain = years();
        let mut state = transition(PlaybackState::Stopped, PlaybackEvent::Start, &domain, PERIOD)
            .unwrap()
            .next;
        let mut seen = vec![2001];

        loop {
            let t = transition(state, PlaybackEvent::Tick, &domain, PERIOD).unwrap();
            state = t.next;
            match state {
                PlaybackState::Playing { year } => seen.push(year),
                PlaybackState::Stopped => {
                    assert_eq!(
                        t.effects,
                        vec![
                            PlaybackEffect::SelectYear(YearKey::All),
                            PlaybackEffect::Recompute,
                            PlaybackEffect::CancelTick,
                        ]
                    );
                    break;
                }
            }
        }
        assert_eq!(seen, vec![2001, 2002, 2003]);
    }

    #[test]
    fn test_stop_cancels_and_keeps_year() {
        let t = transition(
            PlaybackState::Playing { year: 2002 },
            PlaybackEvent::Stop,
            &years(),
            PERIOD,
        )
        .unwrap();
        assert_eq!(t.next, PlaybackState::Stopped);
        assert_eq!(t.effects, vec![PlaybackEffect::CancelTick]);
    }

    #[test]
    fn test_noops_while_stopped() {
        for event in [PlaybackEvent::Tick, PlaybackEvent::Stop] {
            let t = transition(PlaybackState::Stopped, event, &years(), PERIOD).unwrap();
            assert_eq!(t.next, PlaybackState::Stopped);
            assert!(t.effects.is_empty());
        }
        let empty = YearDomain::default();
        let t = transition(PlaybackState::Stopped, PlaybackEvent::Start, &empty, PERIOD).unwrap();
        assert_eq!(t.next, PlaybackState::Stopped);
        assert!(t.effects.is_empty());
    }

    #[test]
    fn test_gapped_years_are_skipped() {
        let domain = YearDomain::new([2000, 2005, 2010]);
        let playing = PlaybackState::Playing { year: 2000 };
        let t = transition(playing, PlaybackEvent::Tick, &domain, PERIOD).unwrap();
        assert_eq!(t.next, PlaybackState::Playing { year: 2005 });
    }
}
