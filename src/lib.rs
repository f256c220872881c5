//! Injection-safe transcript rendering for chat-style coding agents.
//!
//! Message content is untrusted: it comes from users and from model output.
//! Nothing in this crate emits it verbatim. Each message is parsed into
//! [`RenderBlock`]s (prose, code, plan steps, pending/failed replies and
//! checkpoint markers), sanitized of terminal control sequences, and wrapped
//! to the available display width.
//!
//! # Public API Overview
//! - [`render_transcript`] renders a whole conversation log.
//! - [`MessageView`] and [`render_lines`] render a single message.
//! - [`sanitize`], [`display_width`] and [`wrap_text`] are the text helpers
//!   the renderer is built on.

pub mod render;
pub mod sanitize;
pub mod width;
pub mod wrap;

pub use crate::render::{
    build_views, render_lines, render_transcript, MessageView, RenderBlock, ViewOptions,
    MIN_RENDER_WIDTH,
};
pub use crate::sanitize::{sanitize, sanitize_inline};
pub use crate::width::{display_width, truncate_to_width};
pub use crate::wrap::wrap_text;
