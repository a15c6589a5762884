pub mod input;
pub mod mode;
pub mod timeline;
pub mod view;
