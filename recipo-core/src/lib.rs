pub mod auth;
pub mod comments;
pub mod db;
pub mod error;
pub mod gateway;
pub mod like;
pub mod mail;
pub mod optimistic;
pub mod schema;
pub mod seed;
pub mod types;
