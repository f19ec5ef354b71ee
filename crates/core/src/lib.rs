//! Core library for the TechXpression festival site.
//!
//! The crate holds the behavior behind the page, kept separate from any
//! rendering: the timed intro sequence, the background audio player and the
//! event registration form. A presentation layer reads their state and
//! feeds user intents back in.

pub mod audio;
pub mod config;
pub mod error;
pub mod intro;
pub mod registration;
pub mod timeline;

pub use audio::{
    AudioPlayer, AudioPlayerController, AudioResource, PlaybackAction, PlaybackRequest,
    PlayerNotice, PlayerSnapshot, RequestOrigin, Settlement, VolumeIndicator,
};
pub use config::{AppConfig, AudioConfig, IntroConfig, PhaseSpec, RegistrationConfig};
pub use error::{Result, TechXError};
pub use intro::{run_intro, IntroEvent, IntroSequencer, IntroStatus};
pub use registration::{RegistrationDesk, RegistrationField, RegistrationForm, RegistrationReceipt};
pub use timeline::{PlaybackClock, TimerSlot};
