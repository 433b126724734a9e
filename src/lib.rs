// StudioScript Library Root
// Copyright (c) 2026 StudioScript

pub mod agent;
pub mod config;
pub mod editor;
pub mod export;
pub mod script;
pub mod server;
pub mod state;
pub mod store;
