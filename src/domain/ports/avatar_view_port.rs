//! Port definition for the view an avatar is rendered into.

use std::sync::Arc;

/// Surface the avatar loader mutates. Only touched from the owning task.
pub trait AvatarViewPort {
    /// Shows `image` inside the circular mask.
    fn set_image(&mut self, image: Arc<image::DynamicImage>);

    /// Redraws the progress ring to sweep `progress` of a full turn.
    fn set_progress(&mut self, progress: f32);

    /// Resets the progress ring to an empty sweep.
    fn reset_progress(&mut self) {
        self.set_progress(0.0);
    }
}
