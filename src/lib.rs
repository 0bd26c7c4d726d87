pub mod cli;
pub mod command;
pub mod config;
pub mod controllers;
pub mod dragdrop;
pub mod error;
pub mod node;
pub mod ops;
pub mod playback;
pub mod script;
pub mod selection;
pub mod session;
pub mod store;
pub mod tree;
pub mod view;

pub use error::{Result, ShelfError};
pub use session::FileManagerSession;
