//! Миграция: создание таблицы servers.

use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m001_create_servers"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Servers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Servers::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Servers::Name).string().not_null())
                    .col(ColumnDef::new(Servers::Address).string().not_null())
                    .col(ColumnDef::new(Servers::Port).integer().not_null())
                    .col(
                        ColumnDef::new(Servers::Active)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Servers::LastSeen).string().null())
                    .col(ColumnDef::new(Servers::CreatedAt).string().not_null())
                    .to_owned(),
            )
            .await?;

        // Пара address+port однозначно определяет сервер при регистрации без id
        manager
            .create_index(
                Index::create()
                    .table(Servers::Table)
                    .col(Servers::Address)
                    .col(Servers::Port)
                    .unique()
                    .name("idx_servers_endpoint")
                    .to_owned(),
            )
            .await?;

        // Выборка каталога: active = true, сортировка по created_at
        manager
            .create_index(
                Index::create()
                    .table(Servers::Table)
                    .col(Servers::Active)
                    .col(Servers::CreatedAt)
                    .name("idx_servers_active_created")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Servers::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Servers {
    Table,
    Id,
    Name,
    Address,
    Port,
    Active,
    LastSeen,
    CreatedAt,
}
