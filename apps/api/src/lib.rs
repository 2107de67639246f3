pub mod auth;
pub mod client;
pub mod config;
pub mod db;
pub mod errors;
pub mod models;
pub mod resume;
pub mod routes;
pub mod state;

#[cfg(test)]
mod test_support;
