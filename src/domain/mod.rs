pub mod decoration;
pub mod entity;
pub mod palette;
pub mod physics;
