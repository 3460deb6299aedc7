//! Lesson tracker backend library.
//!
//! All functionality lives under [`backend`]; the binary in `main.rs` wires
//! it into an HTTP server, and the API tests drive the same router through
//! `backend::create_router`.

pub mod backend;
