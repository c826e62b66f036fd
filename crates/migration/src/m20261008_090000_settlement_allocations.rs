//! Records which splits each settlement paid off, so a settlement's covered
//! part is not counted twice against the splits it marked settled.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum SettlementAllocations {
    Table,
    SettlementId,
    SplitId,
    AmountMinor,
}

#[derive(Iden)]
enum Settlements {
    Table,
    Id,
}

#[derive(Iden)]
enum ExpenseSplits {
    Table,
    Id,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SettlementAllocations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SettlementAllocations::SettlementId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SettlementAllocations::SplitId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SettlementAllocations::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(SettlementAllocations::SettlementId)
                            .col(SettlementAllocations::SplitId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-settlement_allocations-settlement_id")
                            .from(
                                SettlementAllocations::Table,
                                SettlementAllocations::SettlementId,
                            )
                            .to(Settlements::Table, Settlements::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-settlement_allocations-split_id")
                            .from(SettlementAllocations::Table, SettlementAllocations::SplitId)
                            .to(ExpenseSplits::Table, ExpenseSplits::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-settlement_allocations-split_id")
                    .table(SettlementAllocations::Table)
                    .col(SettlementAllocations::SplitId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SettlementAllocations::Table).to_owned())
            .await
    }
}
