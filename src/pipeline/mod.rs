//! Pipeline stages for PDF-to-JPEG conversion.
//!
//! Each submodule implements exactly one step and is tested on its own.
//!
//! ## Data Flow
//!
//! ```text
//! gate ──▶ session ──▶ ┌ render ──▶ composite ──▶ encode ┐ ──▶ report
//! (working  (document   │ (BGRA→RGBA) (flatten)   (JPEG)  │ per page
//!  copy)     handle)    └──────────── one page at a time ─┘
//! ```
//!
//! 1. [`gate`]      — decide which file to open; decrypt or stage it first
//!    under the agent-mediated scheme and delete the copy afterwards
//! 2. [`session`]   — open the document, hand out scoped page handles
//! 3. [`render`]    — size and rasterise one page into an RGBA buffer
//! 4. [`composite`] — flatten transparency onto white
//! 5. [`encode`]    — write `<stem>_<n>.jpg` atomically

pub mod composite;
pub mod encode;
pub mod gate;
pub mod render;
pub mod session;
