use sea_orm_migration::prelude::*;

/// Users (仅包含联盟返利相关字段，其余资料由身份服务维护)
#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Username,
    Role,
    IsAffiliate,
    AffiliateBalance,
    ReferralCount,
    BankAccountNumber,
    BankName,
    BankAccountName,
    CreatedAt,
    UpdatedAt,
}

/// Referral Batches (推荐活动批次)
#[derive(DeriveIden)]
enum ReferralBatches {
    Table,
    Id,
    Name,
    StartDate,
    EndDate,
    MaxWinners,
    CurrentWinners,
    IsActive,
    DiscountType,
    DiscountValue,
    MaxDiscount,
    CouponValidDays,
    CreatedAt,
    UpdatedAt,
}

/// Coupons (优惠券)
#[derive(DeriveIden)]
enum Coupons {
    Table,
    Id,
    Code,
    DiscountType,
    Value,
    MaxAmount,
    ExpirationDate,
    UsageLimit,
    UsedCount,
    IsActive,
    UserId,
    BatchId,
    IsUsed,
    UsedAt,
    OrderId,
    CreatedAt,
    UpdatedAt,
}

/// Withdrawals (提现申请)
#[derive(DeriveIden)]
enum Withdrawals {
    Table,
    Id,
    UserId,
    Amount,
    Status,
    BankAccountNumber,
    BankName,
    BankAccountName,
    AdminNote,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

/// 金额字段统一使用 bigint 美分；枚举字段使用字符串存储，兼容 Postgres 与 SQLite。
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Users::Username).string_len(64).not_null())
                    .col(
                        ColumnDef::new(Users::Role)
                            .string_len(16)
                            .not_null()
                            .default("user"),
                    )
                    .col(
                        ColumnDef::new(Users::IsAffiliate)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Users::AffiliateBalance)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Users::ReferralCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Users::BankAccountNumber).string_len(64).null())
                    .col(ColumnDef::new(Users::BankName).string_len(128).null())
                    .col(ColumnDef::new(Users::BankAccountName).string_len(128).null())
                    .col(
                        ColumnDef::new(Users::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Users::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ReferralBatches::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ReferralBatches::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ReferralBatches::Name)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReferralBatches::StartDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReferralBatches::EndDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReferralBatches::MaxWinners)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReferralBatches::CurrentWinners)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ReferralBatches::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(ReferralBatches::DiscountType)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReferralBatches::DiscountValue)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReferralBatches::MaxDiscount)
                            .big_integer()
                            .null(), // NULL = 不封顶
                    )
                    .col(
                        ColumnDef::new(ReferralBatches::CouponValidDays)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReferralBatches::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(ReferralBatches::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Coupons::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Coupons::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Coupons::Code).string_len(64).not_null())
                    .col(
                        ColumnDef::new(Coupons::DiscountType)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Coupons::Value).big_integer().not_null())
                    .col(ColumnDef::new(Coupons::MaxAmount).big_integer().null())
                    .col(
                        ColumnDef::new(Coupons::ExpirationDate)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(Coupons::UsageLimit).integer().null()) // NULL = 不限次数
                    .col(
                        ColumnDef::new(Coupons::UsedCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Coupons::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Coupons::UserId).big_integer().null())
                    .col(ColumnDef::new(Coupons::BatchId).big_integer().null())
                    .col(
                        ColumnDef::new(Coupons::IsUsed)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Coupons::UsedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(Coupons::OrderId).string_len(128).null())
                    .col(
                        ColumnDef::new(Coupons::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Coupons::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    // 不加 ON DELETE CASCADE，历史优惠券保留
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_coupons_user")
                            .from(Coupons::Table, Coupons::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_coupons_batch")
                            .from(Coupons::Table, Coupons::BatchId)
                            .to(ReferralBatches::Table, ReferralBatches::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // 优惠码唯一（入库前统一转大写）
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_coupons_code_unique")
                    .table(Coupons::Table)
                    .col(Coupons::Code)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_coupons_user")
                    .table(Coupons::Table)
                    .col(Coupons::UserId)
                    .to_owned(),
            )
            .await?;

        // 每个用户在同一批次最多一张推荐券；非推荐券 batch_id 为 NULL，不受约束
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_coupons_batch_user_unique")
                    .table(Coupons::Table)
                    .col(Coupons::BatchId)
                    .col(Coupons::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Withdrawals::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Withdrawals::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Withdrawals::UserId).big_integer().not_null())
                    .col(ColumnDef::new(Withdrawals::Amount).big_integer().not_null())
                    .col(
                        ColumnDef::new(Withdrawals::Status)
                            .string_len(16)
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(Withdrawals::BankAccountNumber)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Withdrawals::BankName)
                            .string_len(128)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Withdrawals::BankAccountName)
                            .string_len(128)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Withdrawals::AdminNote).text().null())
                    .col(
                        ColumnDef::new(Withdrawals::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Withdrawals::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_withdrawals_user")
                            .from(Withdrawals::Table, Withdrawals::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_withdrawals_user")
                    .table(Withdrawals::Table)
                    .col(Withdrawals::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_withdrawals_status")
                    .table(Withdrawals::Table)
                    .col(Withdrawals::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 删除顺序：提现 -> 优惠券 -> 批次 -> 用户
        manager
            .drop_table(Table::drop().if_exists().table(Withdrawals::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().if_exists().table(Coupons::Table).to_owned())
            .await?;
        manager
            .drop_table(
                Table::drop()
                    .if_exists()
                    .table(ReferralBatches::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().if_exists().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}
