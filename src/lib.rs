//! OurCalendar server library.
//!
//! Calendar-sharing backend: sign-in through Google or LINE, user profiles,
//! groups joined through invite codes, and group-scoped events.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod entity;
pub mod error;
pub mod middleware;
pub mod migration;
pub mod models;
pub mod services;
