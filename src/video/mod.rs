pub mod clip;
pub mod compose;
pub mod ffmpeg;
pub mod sink;
