pub mod alerts;
pub mod api;
pub mod auth;
pub mod buildings;
pub mod config;
pub mod db;
pub mod error;
pub mod incidents;
pub mod portability;
pub mod readings;
pub mod reports;
pub mod sensors;
pub mod soap;
pub mod social;
pub mod state;
pub mod users;
pub mod weather;

#[cfg(test)]
mod test_support;
