//! Front-end services kept apart from the editor core

pub mod io;

pub use io::ImageIOService;
