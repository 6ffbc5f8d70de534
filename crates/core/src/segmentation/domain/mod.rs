pub mod background_subtractor;
pub mod compositor;
pub mod morphology;
