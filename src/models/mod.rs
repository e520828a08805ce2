pub mod event;
pub mod guest;
pub mod host;
