//! SQLite-backed store for fitted models and cluster runs. Consumers other
//! than the fitter and the predictor never read it directly.

mod connection;
mod helpers;
mod migrations;
mod repositories;

pub use connection::Database;
