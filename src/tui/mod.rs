pub mod app;
pub mod input;
pub mod markdown;
pub mod render;
pub mod theme;
pub mod view;

pub use app::run;
