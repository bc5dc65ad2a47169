//! Pipeline stages for one conversion request.
//!
//! ## Data Flow
//!
//! ```text
//! upload ──▶ validate ──▶ stage ──▶ convert ──▶ respond
//!                          │                      │
//!                          └──── cleanup ◀────────┘
//! ```
//!
//! 1. [`validate`]: ordered checks on presence, filename, type and size;
//!    derives the sanitised download name
//! 2. [`stage`]: write the upload to a temp `.pdf`, allocate a temp
//!    `.docx`, both owned by drop guards
//!
//! Conversion and response assembly live in [`crate::handler`], which
//! drives these stages.

pub mod stage;
pub mod validate;
