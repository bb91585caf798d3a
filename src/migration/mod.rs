//! SeaORM database migrations.
//!
//! Written with the schema builder so the same migrations run on PostgreSQL
//! and on the SQLite databases used by tests.

pub use sea_orm_migration::prelude::*;

mod m20261019_000001_create_users;
mod m20261019_000002_create_groups;
mod m20261019_000003_create_group_members;
mod m20261019_000004_create_events;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20261019_000001_create_users::Migration),
            Box::new(m20261019_000002_create_groups::Migration),
            Box::new(m20261019_000003_create_group_members::Migration),
            Box::new(m20261019_000004_create_events::Migration),
        ]
    }
}
