//! Background audio state.
//!
//! [`AudioPlayerController`] is a plain state container: it issues numbered
//! play/pause requests and applies their settlements, keeping only the
//! result of the newest request. [`AudioPlayer`] wires it to an
//! asynchronous [`AudioResource`].

mod player;

use serde::{Deserialize, Serialize};

use crate::{config::is_unit, AudioConfig, Result, TechXError};

pub use player::{AudioPlayer, AudioResource};

/// Action the resource is asked to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackAction {
    Play,
    Pause,
}

/// Who asked for a request. Autoplay does not change the user's intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestOrigin {
    Autoplay,
    User,
}

/// A numbered play/pause request waiting for the resource to settle it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackRequest {
    pub id: u64,
    pub action: PlaybackAction,
    pub origin: RequestOrigin,
}

/// How a settlement was handled.
#[derive(Debug)]
pub enum Settlement {
    /// The resource did what was asked and the state now reflects it.
    Applied,
    /// A newer request was issued meanwhile; the result was discarded.
    Superseded,
    /// Autoplay (or a play attempt) was refused by host policy.
    Blocked,
    /// The resource failed; the error is meant for the user.
    Failed(TechXError),
}

impl Settlement {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }
}

/// Status message the presentation layer may show next to the player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerNotice {
    /// Autoplay was refused; the user has to press play.
    AutoplayBlocked,
    /// The track cannot be played at all.
    Unavailable(String),
}

/// Icon state for the mute button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VolumeIndicator {
    Muted,
    Low,
    High,
}

/// Read-only view of the player for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub is_playing: bool,
    pub is_pending: bool,
    pub volume: f32,
    pub is_muted: bool,
    pub effective_volume: f32,
    pub indicator: VolumeIndicator,
    pub notice: Option<PlayerNotice>,
}

#[derive(Debug, Clone)]
pub struct AudioPlayerController {
    source: String,
    looped: bool,
    levels: Vec<f32>,
    is_playing: bool,
    intends_to_play: bool,
    volume: f32,
    is_muted: bool,
    issued: u64,
    in_flight: Option<u64>,
    autoplay_attempted: bool,
    notice: Option<PlayerNotice>,
}

impl AudioPlayerController {
    pub fn new(config: &AudioConfig) -> Self {
        Self {
            source: config.source.clone(),
            looped: config.looped,
            levels: config.volume_levels.clone(),
            is_playing: false,
            intends_to_play: false,
            volume: config.initial_volume.clamp(0.0, 1.0),
            is_muted: false,
            issued: 0,
            in_flight: None,
            autoplay_attempted: false,
            notice: None,
        }
    }

    /// Issues the startup autoplay request. Only the first call yields one.
    pub fn initialize(&mut self) -> Option<PlaybackRequest> {
        if self.autoplay_attempted {
            return None;
        }
        self.autoplay_attempted = true;
        tracing::debug!(source = %self.source, "attempting autoplay");
        Some(self.issue(PlaybackAction::Play, RequestOrigin::Autoplay))
    }

    /// Inverts the play intent and issues the matching request. The request
    /// supersedes every earlier one still in flight.
    pub fn toggle_play(&mut self) -> PlaybackRequest {
        self.intends_to_play = !self.intends_to_play;
        let action = if self.intends_to_play {
            PlaybackAction::Play
        } else {
            PlaybackAction::Pause
        };
        self.issue(action, RequestOrigin::User)
    }

    /// Applies the resource's answer to `request` if it is still the newest.
    pub fn settle(&mut self, request: &PlaybackRequest, outcome: Result<()>) -> Settlement {
        if self.in_flight != Some(request.id) {
            tracing::debug!(
                id = request.id,
                action = ?request.action,
                "discarding stale playback settlement"
            );
            return Settlement::Superseded;
        }
        self.in_flight = None;

        match outcome {
            Ok(()) => {
                self.is_playing = request.action == PlaybackAction::Play;
                self.intends_to_play = self.is_playing;
                self.notice = None;
                Settlement::Applied
            }
            Err(err) => {
                if request.action == PlaybackAction::Play {
                    self.is_playing = false;
                }
                self.intends_to_play = self.is_playing;

                if err.is_benign() {
                    tracing::info!(origin = ?request.origin, "playback blocked; waiting for user");
                    self.notice = Some(PlayerNotice::AutoplayBlocked);
                    Settlement::Blocked
                } else {
                    tracing::warn!(error = %err, source = %self.source, "playback failed");
                    self.notice = Some(PlayerNotice::Unavailable(err.to_string()));
                    Settlement::Failed(err)
                }
            }
        }
    }

    /// Flips mute and returns the new effective volume.
    pub fn toggle_mute(&mut self) -> f32 {
        self.is_muted = !self.is_muted;
        self.effective_volume()
    }

    /// Sets the volume, clearing mute. Out-of-range levels leave the state
    /// untouched.
    pub fn set_volume(&mut self, level: f32) -> Result<f32> {
        if !is_unit(level) {
            return Err(TechXError::InvalidArgument(format!(
                "volume {level} is outside [0, 1]"
            )));
        }
        self.volume = level;
        self.is_muted = false;
        Ok(self.effective_volume())
    }

    /// Selects one of the configured discrete volume levels.
    pub fn select_level(&mut self, index: usize) -> Result<f32> {
        let level = self.levels.get(index).copied().ok_or_else(|| {
            TechXError::InvalidArgument(format!("no volume level at index {index}"))
        })?;
        self.set_volume(level)
    }

    pub fn effective_volume(&self) -> f32 {
        if self.is_muted {
            0.0
        } else {
            self.volume
        }
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn intends_to_play(&self) -> bool {
        self.intends_to_play
    }

    /// True while a request has been issued but not yet settled.
    pub fn is_pending(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn is_muted(&self) -> bool {
        self.is_muted
    }

    pub fn notice(&self) -> Option<&PlayerNotice> {
        self.notice.as_ref()
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_looped(&self) -> bool {
        self.looped
    }

    pub fn levels(&self) -> &[f32] {
        &self.levels
    }

    pub fn volume_indicator(&self) -> VolumeIndicator {
        if self.is_muted || self.volume == 0.0 {
            VolumeIndicator::Muted
        } else if self.volume < 0.5 {
            VolumeIndicator::Low
        } else {
            VolumeIndicator::High
        }
    }

    /// Levels that are lit in the selector for the current volume.
    pub fn lit_levels(&self) -> Vec<f32> {
        if self.is_muted {
            return Vec::new();
        }
        self.levels
            .iter()
            .copied()
            .filter(|level| self.volume >= *level)
            .collect()
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            is_playing: self.is_playing,
            is_pending: self.is_pending(),
            volume: self.volume,
            is_muted: self.is_muted,
            effective_volume: self.effective_volume(),
            indicator: self.volume_indicator(),
            notice: self.notice.clone(),
        }
    }

    fn issue(&mut self, action: PlaybackAction, origin: RequestOrigin) -> PlaybackRequest {
        self.issued += 1;
        self.in_flight = Some(self.issued);
        PlaybackRequest {
            id: self.issued,
            action,
            origin,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> AudioPlayerController {
        AudioPlayerController::new(&AudioConfig::default())
    }

    #[test]
    fn starts_paused_at_configured_volume() {
        let player = controller();
        assert!(!player.is_playing());
        assert_eq!(player.volume(), 0.3);
        assert!(!player.is_muted());
        assert_eq!(player.volume_indicator(), VolumeIndicator::Low);
    }

    #[test]
    fn autoplay_is_attempted_once() {
        let mut player = controller();
        let request = player.initialize().expect("first call issues autoplay");
        assert_eq!(request.action, PlaybackAction::Play);
        assert_eq!(request.origin, RequestOrigin::Autoplay);
        assert!(player.initialize().is_none());
    }

    #[test]
    fn blocked_autoplay_is_recoverable() {
        let mut player = controller();
        let autoplay = player.initialize().unwrap();

        let settlement = player.settle(&autoplay, Err(TechXError::PlaybackBlocked));
        assert!(matches!(settlement, Settlement::Blocked));
        assert!(!player.is_playing());
        assert_eq!(player.notice(), Some(&PlayerNotice::AutoplayBlocked));

        let manual = player.toggle_play();
        assert_eq!(manual.action, PlaybackAction::Play);
        assert!(player.settle(&manual, Ok(())).is_applied());
        assert!(player.is_playing());
        assert_eq!(player.notice(), None);
    }

    #[test]
    fn successful_autoplay_sets_intent() {
        let mut player = controller();
        let autoplay = player.initialize().unwrap();
        player.settle(&autoplay, Ok(()));

        assert!(player.is_playing());
        assert_eq!(player.toggle_play().action, PlaybackAction::Pause);
    }

    #[test]
    fn unreachable_source_is_surfaced() {
        let mut player = controller();
        let request = player.toggle_play();

        let settlement = player.settle(
            &request,
            Err(TechXError::ResourceUnavailable("404".into())),
        );
        let err = match settlement {
            Settlement::Failed(err) => err,
            other => panic!("expected a visible failure, got {other:?}"),
        };
        assert!(!err.is_benign());
        assert!(!player.is_playing());
        assert!(!player.intends_to_play());
        assert!(matches!(player.notice(), Some(PlayerNotice::Unavailable(_))));
    }

    #[test]
    fn manual_toggle_supersedes_pending_autoplay() {
        let mut player = controller();
        let autoplay = player.initialize().unwrap();
        let manual = player.toggle_play();
        assert_eq!(manual.action, PlaybackAction::Play);

        assert!(matches!(
            player.settle(&autoplay, Err(TechXError::PlaybackBlocked)),
            Settlement::Superseded
        ));
        assert_eq!(player.notice(), None);
        assert!(player.is_pending());

        assert!(player.settle(&manual, Ok(())).is_applied());
        assert!(player.is_playing());
    }

    #[test]
    fn two_rapid_toggles_return_to_initial_state() {
        for initially_playing in [false, true] {
            let mut player = controller();
            if initially_playing {
                let request = player.toggle_play();
                player.settle(&request, Ok(()));
            }
            assert_eq!(player.is_playing(), initially_playing);

            let first = player.toggle_play();
            let second = player.toggle_play();
            assert_ne!(first.action, second.action);
            assert!(second.id > first.id);

            assert!(matches!(player.settle(&first, Ok(())), Settlement::Superseded));
            assert!(player.settle(&second, Ok(())).is_applied());
            assert_eq!(player.is_playing(), initially_playing);
            assert!(!player.is_pending());
        }
    }

    #[test]
    fn settling_twice_is_ignored() {
        let mut player = controller();
        let request = player.toggle_play();
        assert!(player.settle(&request, Ok(())).is_applied());
        assert!(matches!(
            player.settle(&request, Err(TechXError::PlaybackBlocked)),
            Settlement::Superseded
        ));
        assert!(player.is_playing());
    }

    #[test]
    fn volume_change_clears_mute() {
        let mut player = controller();
        player.set_volume(0.42).unwrap();
        assert_eq!(player.toggle_mute(), 0.0);
        assert!(player.is_muted());
        assert_eq!(player.volume(), 0.42);

        assert_eq!(player.set_volume(0.7).unwrap(), 0.7);
        assert!(!player.is_muted());
        assert_eq!(player.volume(), 0.7);
    }

    #[test]
    fn out_of_range_volume_leaves_state_untouched() {
        let mut player = controller();
        player.set_volume(0.6).unwrap();
        player.toggle_mute();

        for level in [1.5, -0.1, f32::NAN] {
            assert!(matches!(
                player.set_volume(level),
                Err(TechXError::InvalidArgument(_))
            ));
            assert_eq!(player.volume(), 0.6);
            assert!(player.is_muted());
        }
    }

    #[test]
    fn effective_volume_follows_mute() {
        let mut player = controller();
        for step in 0..=20 {
            let level = step as f32 / 20.0;
            player.set_volume(level).unwrap();
            assert_eq!(player.effective_volume(), level);

            player.toggle_mute();
            assert_eq!(player.effective_volume(), 0.0);
            assert_eq!(player.volume(), level);
            player.toggle_mute();
        }
    }

    #[test]
    fn discrete_levels_drive_indicator_and_bars() {
        let mut player = controller();
        player.select_level(2).unwrap();
        assert_eq!(player.volume(), 0.75);
        assert_eq!(player.volume_indicator(), VolumeIndicator::High);
        assert_eq!(player.lit_levels(), vec![0.25, 0.5, 0.75]);

        player.toggle_mute();
        assert_eq!(player.volume_indicator(), VolumeIndicator::Muted);
        assert!(player.lit_levels().is_empty());

        assert!(matches!(
            player.select_level(9),
            Err(TechXError::InvalidArgument(_))
        ));
        assert!(player.is_muted());

        player.set_volume(0.0).unwrap();
        assert_eq!(player.volume_indicator(), VolumeIndicator::Muted);
    }

    #[test]
    fn snapshot_reflects_pending_request() {
        let mut player = controller();
        player.toggle_play();
        let snapshot = player.snapshot();

        assert!(snapshot.is_pending);
        assert!(!snapshot.is_playing);
        assert_eq!(snapshot.effective_volume, 0.3);
    }
}
