//! # smartqr
//!
//! A QR code generator that understands what you type.
//!
//! `smartqr` inspects free-form text, recognises phone numbers, e-mail addresses, URLs, SMS
//! shortcuts, WiFi credentials and map coordinates, and encodes the matching scheme-prefixed
//! payload (`tel:`, `mailto:`, `sms:`, `WIFI:`, `geo:`, `https://`) that phone cameras act on.
//! Anything else is encoded verbatim as text.
//!
//! ## Features
//!
//! - Input classification with a fixed, documented precedence.
//! - QR Code Model 2 encoding: versions 1 to 40, four error correction levels.
//! - Rendering to RGBA images, SVG documents or terminal block art, with custom colours.
//! - PNG/SVG export and clipboard copy.
//! - A small newest-first history with favorites, persisted as JSON.
//!
//! ## Example
//!
//! ```rust
//! use smartqr::{classify, render::{render, RenderOptions}};
//!
//! let result = classify("WiFi:MyNetwork:password123");
//! assert_eq!(result.formatted, "WIFI:T:WPA;S:MyNetwork;P:password123;;");
//!
//! let rendered = render(&result.formatted, &RenderOptions::default()).unwrap();
//! assert!(rendered.raster.width() >= 21);
//! ```
//!
//! ## Modules
//!
//! - [`classify`](mod@classify): Input classification and payload formatting.
//! - [`qrcode`]: Core QR code encoding functionality.
//! - [`render`]: Raster, SVG and terminal rendering.
//! - [`export`]: Saving PNG and SVG files.
//! - [`clipboard`]: Copying images and payloads to the clipboard.
//! - [`history`]: Recently generated payloads and favorites.
//! - [`config`]: TOML configuration.

pub mod classify;
pub mod cli;
pub mod clipboard;
pub mod commands;
pub mod config;
pub mod error;
pub mod export;
pub mod history;
pub mod qrcode;
pub mod render;

pub use classify::{classify, Classification, DataKind};
pub use error::{Error, Result};
