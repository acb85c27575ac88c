pub mod api;
pub mod calls;
