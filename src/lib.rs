//! Backend del marketplace de alquiler de vehículos
//!
//! Ciclo de vida del booking (máquina de estados), pricing, cupones,
//! política de reembolsos y settlement por webhook de pagos, sobre
//! PostgreSQL.

pub mod config;
pub mod database;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;
