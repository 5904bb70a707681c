//! Seams to the hosting accessibility runtime.
//!
//! The runtime owns focus tracking and text-to-speech; this crate only needs
//! "pid of the focused application" and "say this". Both are best-effort: a
//! host that cannot answer returns `None` and the reporter degrades to its
//! no-focus message.

/// Resolves the currently focused UI element to its owning process.
pub trait FocusProvider: Send + Sync {
    /// Pid of the application owning input focus, if any.
    fn focused_pid(&self) -> Option<u32>;
}

/// Fire-and-forget speech output.
pub trait Speech: Send + Sync {
    fn speak(&self, text: &str);
}

/// Focus pinned to a fixed pid. Used by the debug binary and tests, where no
/// real focus tracker exists.
pub struct PinnedFocus(pub u32);

impl FocusProvider for PinnedFocus {
    fn focused_pid(&self) -> Option<u32> {
        Some(self.0)
    }
}

/// "Speaks" by printing one line to stdout.
pub struct StdoutSpeech;

impl Speech for StdoutSpeech {
    fn speak(&self, text: &str) {
        println!("{text}");
    }
}
