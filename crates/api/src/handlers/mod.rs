pub mod discover;
pub mod generations;
pub mod media;
pub mod playlists;
pub mod session;
pub mod tracks;
