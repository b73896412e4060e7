pub mod constants;
pub mod coordinator;
pub mod transport;
pub mod types;

#[cfg(test)]
pub mod testing;
