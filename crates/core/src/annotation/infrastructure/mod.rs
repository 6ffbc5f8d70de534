pub mod hershey_text_renderer;
pub mod opencv_rectangle_renderer;
