use std::cell::RefCell;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{AudioPlayerController, PlaybackAction, PlaybackRequest, PlayerSnapshot, Settlement};
use crate::{AudioConfig, Result};

/// Capability exposed by whatever actually produces sound.
///
/// `play` may fail with [`crate::TechXError::PlaybackBlocked`] when the host
/// refuses to start audio without a user gesture, or with
/// [`crate::TechXError::ResourceUnavailable`] when the track cannot be loaded.
#[async_trait(?Send)]
pub trait AudioResource {
    /// Points the resource at `source`, looping it when `looped` is set.
    fn load(&self, source: &str, looped: bool);
    async fn play(&self) -> Result<()>;
    async fn pause(&self) -> Result<()>;
    fn set_output_volume(&self, volume: f32);
}

/// Couples an [`AudioPlayerController`] with a resource on a single-threaded
/// executor. Resource operations run one at a time in the order they were
/// requested; only the newest request's result reaches the state.
pub struct AudioPlayer<R> {
    resource: R,
    controller: RefCell<AudioPlayerController>,
    operations: Mutex<()>,
}

impl<R: AudioResource> AudioPlayer<R> {
    pub fn new(resource: R, config: &AudioConfig) -> Self {
        let controller = AudioPlayerController::new(config);
        resource.load(controller.source(), controller.is_looped());
        resource.set_output_volume(controller.effective_volume());

        Self {
            resource,
            controller: RefCell::new(controller),
            operations: Mutex::new(()),
        }
    }

    /// Attempts autoplay. Returns `None` if it was already attempted.
    pub async fn initialize(&self) -> Option<Settlement> {
        let request = self.controller.borrow_mut().initialize()?;
        Some(self.perform(request).await)
    }

    pub async fn toggle_play(&self) -> Settlement {
        let request = self.controller.borrow_mut().toggle_play();
        self.perform(request).await
    }

    pub fn toggle_mute(&self) -> f32 {
        let effective = self.controller.borrow_mut().toggle_mute();
        self.resource.set_output_volume(effective);
        effective
    }

    pub fn set_volume(&self, level: f32) -> Result<f32> {
        let effective = self.controller.borrow_mut().set_volume(level)?;
        self.resource.set_output_volume(effective);
        Ok(effective)
    }

    pub fn select_level(&self, index: usize) -> Result<f32> {
        let effective = self.controller.borrow_mut().select_level(index)?;
        self.resource.set_output_volume(effective);
        Ok(effective)
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        self.controller.borrow().snapshot()
    }

    pub fn levels(&self) -> Vec<f32> {
        self.controller.borrow().levels().to_vec()
    }

    pub fn resource(&self) -> &R {
        &self.resource
    }

    async fn perform(&self, request: PlaybackRequest) -> Settlement {
        let _turn = self.operations.lock().await;

        let outcome = match request.action {
            PlaybackAction::Play => self.resource.play().await,
            PlaybackAction::Pause => self.resource.pause().await,
        };

        self.controller.borrow_mut().settle(&request, outcome)
    }
}

impl<R> std::fmt::Debug for AudioPlayer<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioPlayer")
            .field("controller", &self.controller)
            .finish()
    }
}
