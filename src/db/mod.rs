pub mod error;
pub mod postgres;

#[cfg(test)]
pub mod memory;
