//! Taleforge Engine library.
//!
//! This crate contains all server-side code for the Taleforge game engine.
//!
//! ## Structure
//!
//! - `use_cases/` - character management and turn orchestration
//! - `infrastructure/` - external dependency implementations (ports + adapters)
//! - `api/` - HTTP entry points
//! - `llm_context` / `prompt_templates` - what the game master sees
//! - `app` - application composition

pub mod api;
pub mod app;
pub mod infrastructure;
pub mod llm_context;
pub mod prompt_templates;
pub mod use_cases;

pub use app::App;
