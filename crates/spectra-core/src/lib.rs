pub mod classify;
pub mod credentials;
pub mod domain;
pub mod engine;
pub mod numerics;
pub mod pipeline;
pub mod service;
pub mod units;

#[cfg(test)]
mod test_support;
