//! Zero Hour — session log and incremental text reveal.
//!
//! Owns the append-only narrative log and the renderer that discloses the
//! newest entry one character per tick while the typing cue plays. Each
//! entry carries its own reveal state, so redrawing or reattaching a view
//! never restarts an animation.

pub mod audio;
pub mod intro;
pub mod log;
pub mod renderer;
