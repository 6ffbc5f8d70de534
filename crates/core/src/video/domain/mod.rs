pub mod frame_display;
pub mod frame_source;
pub mod image_reader;
pub mod image_writer;
pub mod video_writer;
