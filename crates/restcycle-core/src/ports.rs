//! Output ports the core drives: rendering, notification banners and sound.
//!
//! Implementations live outside the core (the CLI ships terminal versions).
//! They are fire-and-forget: they must not block and must not call back into
//! the engine.

use crate::account::{AccountId, AccountSnapshot};
use crate::error::PortError;

/// Receives fresh display values after every state change.
pub trait Renderer: Send {
    fn render(&self, id: AccountId, snapshot: &AccountSnapshot);
}

/// Shows a user-visible alert message.
pub trait Notifier: Send {
    fn notify(&self, message: &str) -> Result<(), PortError>;
}

/// Audible alerts, with an optional haptic fallback.
pub trait SoundPlayer: Send {
    fn play_sound(&self) -> Result<(), PortError>;

    fn vibrate(&self) -> Result<(), PortError> {
        Err(PortError::Unsupported("vibration"))
    }
}

/// Port that discards everything. Handy for headless runs and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullPort;

impl Renderer for NullPort {
    fn render(&self, _id: AccountId, _snapshot: &AccountSnapshot) {}
}

impl Notifier for NullPort {
    fn notify(&self, _message: &str) -> Result<(), PortError> {
        Ok(())
    }
}

impl SoundPlayer for NullPort {
    fn play_sound(&self) -> Result<(), PortError> {
        Ok(())
    }
}

/// The three ports bundled for the dispatcher.
pub struct Ports {
    pub renderer: Box<dyn Renderer>,
    pub notifier: Box<dyn Notifier>,
    pub sound: Box<dyn SoundPlayer>,
}

impl Ports {
    pub fn new(
        renderer: impl Renderer + 'static,
        notifier: impl Notifier + 'static,
        sound: impl SoundPlayer + 'static,
    ) -> Self {
        Self {
            renderer: Box::new(renderer),
            notifier: Box::new(notifier),
            sound: Box::new(sound),
        }
    }

    pub fn null() -> Self {
        Self::new(NullPort, NullPort, NullPort)
    }
}
