use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Withdrawals {
    Table,
    ResolvedBy,
    ResolvedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

/// 记录审核人及审核时间，便于对账
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // SQLite 的 ALTER TABLE 一次只能加一列
        if !manager.has_column("withdrawals", "resolved_by").await? {
            manager
                .alter_table(
                    Table::alter()
                        .table(Withdrawals::Table)
                        .add_column(ColumnDef::new(Withdrawals::ResolvedBy).big_integer().null())
                        .to_owned(),
                )
                .await?;
        }
        if !manager.has_column("withdrawals", "resolved_at").await? {
            manager
                .alter_table(
                    Table::alter()
                        .table(Withdrawals::Table)
                        .add_column(
                            ColumnDef::new(Withdrawals::ResolvedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;
        }
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(Withdrawals::Table)
                    .drop_column(Withdrawals::ResolvedAt)
                    .to_owned(),
            )
            .await?;
        manager
            .alter_table(
                Table::alter()
                    .table(Withdrawals::Table)
                    .drop_column(Withdrawals::ResolvedBy)
                    .to_owned(),
            )
            .await?;
        Ok(())
    }
}
