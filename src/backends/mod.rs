// SPDX-License-Identifier: GPL-3.0-only

//! Backend abstraction layer for hardware access
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │               Session Layer                 │
//! └────────────────────┬────────────────────────┘
//!                      │
//! ┌────────────────────┴────────────────────────┐
//! │              Backend Layer                  │
//! │  ┌──────────────────┐  ┌─────────────────┐  │
//! │  │  Camera (V4L2)   │  │ Camera (synth)  │  │
//! │  └──────────────────┘  └─────────────────┘  │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! Permission prompts and the photo library live in
//! [`crate::permissions`] and [`crate::media`].

pub mod camera;
