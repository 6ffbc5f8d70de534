pub mod opencv_background_subtractor;
pub mod opencv_compositor;
