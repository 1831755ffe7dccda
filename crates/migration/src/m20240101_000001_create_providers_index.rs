//! Create `providers_index` table.
//! One row per directory listing; `specialties` is a nullable text array.
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ProvidersIndex::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ProvidersIndex::Id).text().not_null().primary_key())
                    .col(ColumnDef::new(ProvidersIndex::Name).text().not_null())
                    .col(ColumnDef::new(ProvidersIndex::City).text().null())
                    .col(ColumnDef::new(ProvidersIndex::State).text().null())
                    .col(ColumnDef::new(ProvidersIndex::Specialties).array(ColumnType::Text).null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(ProvidersIndex::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
pub(crate) enum ProvidersIndex {
    Table,
    Id,
    Name,
    City,
    State,
    Specialties,
}
