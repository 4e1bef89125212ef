//! Async loop joining the playback timer with user commands.

use tokio::sync::mpsc;
use tracing::warn;

use super::{PlaybackEvent, PlaybackTimer};
use crate::dataset::YearKey;
use crate::session::{DashboardSession, DashboardSnapshot};

/// Commands accepted by a running [`PlaybackDriver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerCommand {
    /// Start playback from the first year.
    Play,
    /// Stop playback, keeping the current year.
    Pause,
    /// Move the year slider; stops playback if it is running.
    SelectYear(YearKey),
    /// Leave the loop.
    Shutdown,
}

/// Sending half of a driver's command channel.
#[derive(Debug, Clone)]
pub struct PlayerHandle {
    tx: mpsc::Sender<PlayerCommand>,
}

impl PlayerHandle {
    /// Queue a command. Returns `false` once the driver has exited.
    pub async fn send(&self, command: PlayerCommand) -> bool {
        self.tx.send(command).await.is_ok()
    }
}

/// Owns a session and its timer and serializes every event through one loop.
#[derive(Debug)]
pub struct PlaybackDriver {
    session: DashboardSession,
    timer: PlaybackTimer,
    commands: mpsc::Receiver<PlayerCommand>,
}

impl PlaybackDriver {
    /// Create a driver and the handle that controls it.
    #[must_use]
    pub fn new(session: DashboardSession) -> (Self, PlayerHandle) {
        let (tx, rx) = mpsc::channel(16);
        let driver = Self {
            session,
            timer: PlaybackTimer::new(),
            commands: rx,
        };
        (driver, PlayerHandle { tx })
    }

    /// Run until [`PlayerCommand::Shutdown`], or until every handle is
    /// dropped and no playback is running. Each new snapshot is passed to
    /// `publish`. Returns the session.
    pub async fn run<F>(mut self, mut publish: F) -> DashboardSession
    where
        F: FnMut(&DashboardSnapshot),
    {
        let mut commands_open = true;
        loop {
            if !commands_open && !self.timer.is_armed() {
                break;
            }

            tokio::select! {
                command = self.commands.recv(), if commands_open => match command {
                    Some(PlayerCommand::Shutdown) => break,
                    Some(command) => self.handle(command, &mut publish),
                    None => commands_open = false,
                },
                () = self.timer.tick() => {
                    self.step(PlaybackEvent::Tick, &mut publish);
                }
            }
        }

        self.timer.cancel();
        self.session
    }

    fn handle<F: FnMut(&DashboardSnapshot)>(&mut self, command: PlayerCommand, publish: &mut F) {
        match command {
            PlayerCommand::Play => self.step(PlaybackEvent::Start, publish),
            PlayerCommand::Pause => self.step(PlaybackEvent::Stop, publish),
            PlayerCommand::SelectYear(year) => {
                let snapshot = self.session.select_year(year);
                publish(snapshot);
                let effects = self.session.take_timer_effects();
                self.timer.apply(&effects);
            }
            PlayerCommand::Shutdown => {}
        }
    }

    fn step<F: FnMut(&DashboardSnapshot)>(&mut self, event: PlaybackEvent, publish: &mut F) {
        let before = self.session.snapshot().token;
        match self.session.playback(event) {
            Ok(effects) => self.timer.apply(&effects),
            Err(err) => {
                warn!(%err, "Ignoring playback command");
                return;
            }
        }
        if self.session.snapshot().token != before {
            publish(self.session.snapshot());
        }
    }

    /// Queue `script` up front, then run until it is exhausted and any
    /// playback it started has finished.
    pub async fn run_script<F>(
        session: DashboardSession,
        script: Vec<PlayerCommand>,
        publish: F,
    ) -> DashboardSession
    where
        F: FnMut(&DashboardSnapshot),
    {
        let (tx, rx) = mpsc::channel(script.len().max(1));
        for command in script {
            // Capacity covers the whole script, so this only fails if that changes.
            if let Err(err) = tx.try_send(command) {
                warn!(?command, %err, "Dropping scripted command");
                debug_assert!(false, "script command did not fit the channel: {err}");
            }
        }
        drop(tx);
        let driver = Self {
            session,
            timer: PlaybackTimer::new(),
            commands: rx,
        };
        driver.run(publish).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::config::DashboardConfig;
    use crate::dataset::fixtures::sample_dataset;
    use crate::playback::PlaybackState;

    fn session() -> DashboardSession {
        let config = DashboardConfig::builder()
            .playback_period(Duration::from_millis(1200))
            .build()
            .unwrap();
        DashboardSession::new(Arc::new(sample_dataset()), config)
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_playback_publishes_each_year() {
        let (driver, handle) = PlaybackDriver::new(session());
        assert!(handle.send(PlayerCommand::Play).await);
        drop(handle);

        let start = tokio::time::Instant::now();
        let mut seen = Vec::new();
        let session = driver.run(|snapshot| seen.push(snapshot.selection)).await;

        assert_eq!(
            seen,
            vec![
                YearKey::Year(2001),
                YearKey::Year(2002),
                YearKey::Year(2003),
                YearKey::All,
            ]
        );
        assert_eq!(start.elapsed().as_millis(), 3600);
        assert_eq!(session.playback_state(), PlaybackState::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slider_interaction_cancels_pending_tick() {
        let (driver, handle) = PlaybackDriver::new(session());
        let task = tokio::spawn(async move {
            let mut seen = Vec::new();
            let session = driver.run(|s| seen.push(s.selection)).await;
            (session, seen)
        });

        handle.send(PlayerCommand::Play).await;
        tokio::time::sleep(Duration::from_millis(1300)).await;
        handle.send(PlayerCommand::SelectYear(YearKey::Year(2001))).await;
        tokio::time::sleep(Duration::from_secs(10)).await;
        handle.send(PlayerCommand::Shutdown).await;

        let (session, seen) = task.await.unwrap();
        assert_eq!(
            seen,
            vec![YearKey::Year(2001), YearKey::Year(2002), YearKey::Year(2001)]
        );
        assert_eq!(session.playback_state(), PlaybackState::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn test_double_play_is_ignored() {
        let script = vec![PlayerCommand::Play, PlayerCommand::Play, PlayerCommand::Pause];
        let mut count = 0;
        let session = PlaybackDriver::run_script(session(), script, |_| count += 1).await;
        assert_eq!(count, 1);
        assert_eq!(session.snapshot().selection, YearKey::Year(2001));
    }

    #[tokio::test(start_paused = true)]
    async fn test_long_script_delivers_every_command() {
        let years = [2001, 2002, 2003];
        let script: Vec<_> = (0..40)
            .map(|i| PlayerCommand::SelectYear(YearKey::Year(years[i % years.len()])))
            .collect();
        let mut seen = Vec::new();
        let session =
            PlaybackDriver::run_script(session(), script, |s| seen.push(s.selection)).await;

        assert_eq!(seen.len(), 40);
        assert_eq!(seen[39], YearKey::Year(2001));
        assert_eq!(session.snapshot().selection, YearKey::Year(2001));
    }
}
