//! SeaORM entity definitions.

pub mod event;
pub mod group;
pub mod group_member;
pub mod user;
