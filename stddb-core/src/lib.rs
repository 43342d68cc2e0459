//! Core of stddb, the statically-typed database access layer.
//! Not intended to be used directly.
#![warn(future_incompatible, rust_2018_idioms)]
#![allow(clippy::module_inception, clippy::len_without_is_empty)]
#![cfg_attr(docsrs, feature(doc_cfg))]
//
// Native buffers are handed to the driver as raw pointers. That unsafe code is
// contained to the binder, the FFI layer and the in-process driver.
#![deny(unsafe_code)]

#[macro_use]
pub mod error;

pub mod column;
pub mod database;
pub mod decode;
mod logger;
pub mod rowset;
pub mod source;
pub mod type_info;
pub mod types;
pub mod value;

pub mod oracle;

pub use logger::LogSettings;
