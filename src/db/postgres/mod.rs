pub mod connection;
pub mod models;
pub mod postgres_service;
pub mod repository;
pub mod schema;
