#![forbid(unsafe_code)]

pub mod delete;
pub mod fetch;
pub mod submit;
