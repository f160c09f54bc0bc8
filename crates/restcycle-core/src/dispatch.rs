//! Maps engine events onto port calls.
//!
//! Port failures end here: they are logged, a fallback is attempted, and
//! nothing is returned to the caller.

use tracing::{debug, warn};

use crate::account::AccountSnapshot;
use crate::events::Event;
use crate::format::format_hms;
use crate::ports::Ports;

/// Alert text for an event, or `None` if the event is silent.
pub fn alert_message(event: &Event) -> Option<String> {
    match event {
        Event::GoalReached { account, goal_ms, .. } => Some(format!(
            "{account} reached its goal of {}!",
            format_hms(*goal_ms)
        )),
        Event::RestStarted { account, rest_ms, .. } => Some(format!(
            "{account}: time to rest for {}",
            format_hms(*rest_ms)
        )),
        Event::RestEnded { account, .. } => Some(format!("{account}: rest is over")),
        _ => None,
    }
}

pub struct EventDispatcher {
    ports: Ports,
    alerts_enabled: bool,
    vibration: bool,
}

impl EventDispatcher {
    pub fn new(ports: Ports) -> Self {
        Self {
            ports,
            alerts_enabled: true,
            vibration: true,
        }
    }

    /// Disabled alerts still render; only banners and sounds are skipped.
    pub fn with_alerts(mut self, enabled: bool) -> Self {
        self.alerts_enabled = enabled;
        self
    }

    pub fn with_vibration(mut self, enabled: bool) -> Self {
        self.vibration = enabled;
        self
    }

    pub fn dispatch(&self, event: &Event) {
        debug!(?event, "dispatching event");
        if let Some(message) = alert_message(event) {
            self.alert(&message);
        }
    }

    pub fn render(&self, snapshot: &AccountSnapshot) {
        self.ports.renderer.render(snapshot.id, snapshot);
    }

    /// Banner plus sound, falling back to vibration and then to a second
    /// banner when sound is unavailable.
    pub fn alert(&self, message: &str) {
        if !self.alerts_enabled {
            debug!(message, "alerts disabled");
            return;
        }
        if let Err(e) = self.ports.notifier.notify(message) {
            warn!(error = %e, "notification failed");
        }
        self.sound_or_fallback(message);
    }

    /// Play the alert sound on request, with the same fallbacks.
    pub fn test_sound(&self) {
        self.sound_or_fallback("Sound check");
    }

    fn sound_or_fallback(&self, message: &str) {
        let Err(e) = self.ports.sound.play_sound() else {
            return;
        };
        warn!(error = %e, "sound playback failed");
        if self.vibration {
            match self.ports.sound.vibrate() {
                Ok(()) => return,
                Err(e) => debug!(error = %e, "vibration fallback failed"),
            }
        }
        if let Err(e) = self.ports.notifier.notify(message) {
            warn!(error = %e, "fallback notification failed");
        }
    }
}
