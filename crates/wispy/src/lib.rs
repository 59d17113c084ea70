//! # Wispy - Tag-Based Page Templates
//!
//! Wispy renders HTML pages from `{% ... %}` templates. Pages wrap themselves
//! in layouts or extend parents, include partials with their own props, and
//! register stylesheets, scripts and head elements that the site's root
//! layout emits once, deduplicated and in priority order.
//!
//! This crate re-exports the engine from `wispy-render` and adds the
//! [`cli`] module behind the `wispy` binary.
//!
//! ## Quick Start
//!
//! ```rust
//! use wispy::Engine;
//!
//! let engine = Engine::new();
//! let out = engine.render_str(
//!     "{% if .user %}Hi {% .user.name | upcase %}{% else %}Hi stranger{% end-if %}",
//!     serde_json::json!({"user": {"name": "ada"}}),
//! );
//! assert_eq!(out.output, "Hi ADA");
//! ```
//!
//! ## Command Line
//!
//! ```text
//! wispy render --site ./site pages/index.hstm --query page=2 --header HX-Request=true
//! wispy tags
//! ```

pub mod cli;

pub use wispy_render::*;
