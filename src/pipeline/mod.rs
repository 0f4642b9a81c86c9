//! Pipeline stages that run before a request leaves the process.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ validate ──▶ sign ──▶ transport ──▶ output
//! (seekable)  (roxmltree)  (HMAC-SHA1)  (POST ?sig=)  (AsyncWrite)
//! ```
//!
//! 1. [`validate`] — well-formedness check; rewinds the stream afterwards
//! 2. [`sign`]     — keyed digest over the same bytes; rewinds again so the
//!    transport reads the body from the start
//!
//! Both stages are pure with respect to the network, so each is tested on
//! its own without a transport.

pub mod sign;
pub mod validate;
