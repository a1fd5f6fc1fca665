//! # Architecture Abstraction Layer
//!
//! Everything that needs the real CPU: exception vectors, trap entry and
//! exit, and banked-register access. The portable kernel only sees it
//! through [`crate::context::BankedRegisters`] and the two entry functions
//! the vectors call. Host builds leave this layer out.

#[cfg(target_arch = "arm")]
pub mod armv7a;
