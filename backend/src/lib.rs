//! Gatehouse backend
//!
//! Credential and session lifecycle service: signup with email verification,
//! login issuing RS256 access/refresh tokens backed by Redis sessions,
//! password reset, and role-gated user endpoints.

pub mod auth;
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod mailer;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
