// StudioScript Agent Modules
// Copyright (c) 2026 StudioScript

pub mod functions_client;
pub mod image_gen;
pub mod openrouter_bridge;
pub mod prompts;
pub mod scene_prompts;
pub mod writer;

pub mod core; // Shared CLI kernel
