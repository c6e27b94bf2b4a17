//! Reusable widgets.

mod avatar_view;
mod progress_ring;

pub use avatar_view::{AvatarView, CircleMask};
pub use progress_ring::{DEFAULT_RING_WIDTH, ProgressRing};
