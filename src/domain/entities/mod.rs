//! Domain entity definitions.

mod avatar;

pub use avatar::{AvatarKey, AvatarStatus};
