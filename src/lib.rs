//! Cloud Conversion Client
//!
//! This library provides client-side tracking for 2D-to-3D conversion jobs:
//! submit an image to the conversion service, keep a session-local registry
//! of in-flight tasks eventually consistent through periodic status polling,
//! and download finished models once the backend reports them completed.

pub mod config;
pub mod models;
pub mod services;
