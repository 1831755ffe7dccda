//! Migrator for the provider directory schema.
//! Indexes are applied after the table they cover.
pub use sea_orm_migration::prelude::*;

mod m20240101_000001_create_providers_index;
mod m20240101_000002_add_provider_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_providers_index::Migration),
            Box::new(m20240101_000002_add_provider_indexes::Migration),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_registered_in_order() {
        let names: Vec<String> = Migrator::migrations().iter().map(|m| m.name().to_string()).collect();
        assert_eq!(
            names,
            vec![
                "m20240101_000001_create_providers_index".to_string(),
                "m20240101_000002_add_provider_indexes".to_string(),
            ]
        );
    }
}
