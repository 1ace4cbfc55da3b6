pub mod db;
pub mod domain;
pub mod middleware;
pub mod reports;
pub mod services;
pub mod state;
pub mod web;
