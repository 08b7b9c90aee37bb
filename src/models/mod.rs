// src/models/mod.rs
pub mod message;
pub mod notification;
pub mod provider;
pub mod token;

pub use message::*;
pub use notification::*;
pub use provider::*;
pub use token::*;
