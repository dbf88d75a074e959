use sea_orm_migration::prelude::*;

mod m20260301_create_accounts;
mod m20260315_add_deactivations;
mod m20260320_add_token_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_create_accounts::Migration),
            Box::new(m20260315_add_deactivations::Migration),
            Box::new(m20260320_add_token_indexes::Migration),
        ]
    }
}
