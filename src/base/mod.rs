//! Base types and error handling.
//!
//! Provides the foundational error type mirroring Chromium's `net/base/`:
//! - [`NetError`](neterror::NetError): Network error codes matching `net_error_list.h`

pub mod neterror;

#[cfg(test)]
mod tests;
