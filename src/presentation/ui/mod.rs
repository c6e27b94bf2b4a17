//! UI screens.

mod app;
mod avatar_screen;

pub use app::App;
pub use avatar_screen::{AvatarScreen, AvatarScreenState};
