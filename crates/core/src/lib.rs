//! Core crate for the stylova style-transfer engine.

pub mod cache;
pub mod catalog;
pub mod codec;
pub mod config;
pub mod error;
pub mod logging;
pub mod remote;
pub mod session;
pub mod styler;

pub use error::{Error, Result};
