mod avatar_view_port;
mod image_fetch_port;

pub use avatar_view_port::AvatarViewPort;
pub use image_fetch_port::{FetchProgress, ImageFetchPort};
