use sea_orm_migration::prelude::*;

use crate::m20240101_000001_create_providers_index::ProvidersIndex;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Listing: ORDER BY name, id
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_providers_index_name_id")
                    .table(ProvidersIndex::Table)
                    .col(ProvidersIndex::Name)
                    .col(ProvidersIndex::Id)
                    .to_owned(),
            )
            .await?;

        // Search: name ILIKE '%term%' needs a trigram index to avoid seq scans
        let conn = manager.get_connection();
        conn.execute_unprepared("CREATE EXTENSION IF NOT EXISTS pg_trgm").await?;
        conn.execute_unprepared(
            "CREATE INDEX IF NOT EXISTS idx_providers_index_name_trgm \
             ON providers_index USING gin (name gin_trgm_ops)",
        )
        .await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP INDEX IF EXISTS idx_providers_index_name_trgm")
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_providers_index_name_id")
                    .table(ProvidersIndex::Table)
                    .to_owned(),
            )
            .await
    }
}
