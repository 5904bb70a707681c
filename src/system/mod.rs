pub mod cache;
pub mod collector;
pub mod metrics;
pub mod query;

#[cfg(test)]
pub(crate) mod testutil;
