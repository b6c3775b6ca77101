// Library exports for testing
// The binary (main.rs) imports these as well

pub mod commands;
pub mod error;
pub mod frontend;
pub mod host;
pub mod logger;
pub mod permissions;
pub mod proxy;
pub mod state;
pub mod window;

#[cfg(test)]
mod tests;
