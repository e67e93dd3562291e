//! Callbacks the window loop raises for side channels living outside the renderer.

/// Implemented by whoever wants to react to window activity (the audio
/// session in the binary). Every method has a no-op default.
pub trait FrameHooks {
    /// A primary pointer button went down inside the window.
    fn on_pointer_press(&mut self) {}

    /// The window became hidden (`false`) or visible again (`true`).
    fn on_visibility_changed(&mut self, _visible: bool) {}

    /// Short text appended to the window title, refreshed after each hook call.
    fn status(&self) -> Option<String> {
        None
    }

    /// The event loop is exiting and GPU resources have been released.
    fn on_exit(&mut self) {}
}

/// Hooks that do nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHooks;

impl FrameHooks for NoopHooks {}

impl<H: FrameHooks + ?Sized> FrameHooks for Box<H> {
    fn on_pointer_press(&mut self) {
        (**self).on_pointer_press();
    }

    fn on_visibility_changed(&mut self, visible: bool) {
        (**self).on_visibility_changed(visible);
    }

    fn status(&self) -> Option<String> {
        (**self).status()
    }

    fn on_exit(&mut self) {
        (**self).on_exit();
    }
}

/// Formats the window title with an optional status suffix.
pub(crate) fn compose_title(base: &str, status: Option<&str>) -> String {
    match status {
        Some(status) if !status.is_empty() => format!("{base} [{status}]"),
        _ => base.to_string(),
    }
}
