// src/services/mod.rs
pub mod availability_service;
pub mod delivery_service;
pub mod messaging_service;
pub mod notification_service;
pub mod push_manager;
pub mod session;
pub mod token_service;
