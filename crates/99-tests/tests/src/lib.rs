//! End-to-end tests for the rasterization pipeline.

#[cfg(test)]
mod session_e2e;

#[cfg(test)]
mod file_store_e2e;

#[cfg(test)]
mod matrix_fill;

#[cfg(test)]
pub(crate) mod support;
