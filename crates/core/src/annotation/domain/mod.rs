pub mod frame_stamper;
pub mod rectangle_drawer;
pub mod region_renderer;
pub mod text_renderer;
