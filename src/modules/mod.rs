pub mod camera;
pub mod grabber;
pub mod module_definitions;
pub mod tracker;
pub mod visualizer;
