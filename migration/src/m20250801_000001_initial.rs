use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Pools {
    Table,
    City,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Schedules {
    Table,
    City,
    CloseTime,
    DrawTime,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum LotteryResults {
    Table,
    Id,
    City,
    DrawDate,
    FirstPrize,
    SecondPrize,
    ThirdPrize,
    FetchedAt,
}

#[derive(DeriveIden)]
enum Overrides {
    Table,
    Id,
    City,
    DrawDate,
    OldNumbers,
    NewNumbers,
    AdminUsername,
    CreatedAt,
}

#[derive(DeriveIden)]
enum FetchErrors {
    Table,
    Id,
    City,
    Message,
    CreatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Pools::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Pools::City)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Pools::CreatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::cust("NOW()"))
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        // 每个池唯一一份开/封盘时刻表
        manager
            .create_table(
                Table::create()
                    .table(Schedules::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Schedules::City)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Schedules::CloseTime).string().not_null())
                    .col(ColumnDef::new(Schedules::DrawTime).string().not_null())
                    .col(
                        ColumnDef::new(Schedules::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(LotteryResults::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LotteryResults::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(LotteryResults::City).string().not_null())
                    .col(ColumnDef::new(LotteryResults::DrawDate).date().not_null())
                    .col(
                        ColumnDef::new(LotteryResults::FirstPrize)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LotteryResults::SecondPrize)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LotteryResults::ThirdPrize)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LotteryResults::FetchedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        // unique (city, draw_date)
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_lottery_results_city_draw_date")
                    .table(LotteryResults::Table)
                    .col(LotteryResults::City)
                    .col(LotteryResults::DrawDate)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Overrides::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Overrides::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Overrides::City).string().not_null())
                    .col(ColumnDef::new(Overrides::DrawDate).date().not_null())
                    .col(ColumnDef::new(Overrides::OldNumbers).string().null())
                    .col(ColumnDef::new(Overrides::NewNumbers).string().not_null())
                    .col(
                        ColumnDef::new(Overrides::AdminUsername)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Overrides::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("ix_overrides_city_created_at")
                    .table(Overrides::Table)
                    .col(Overrides::City)
                    .col(Overrides::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(FetchErrors::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FetchErrors::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(FetchErrors::City).string().not_null())
                    .col(ColumnDef::new(FetchErrors::Message).string().not_null())
                    .col(
                        ColumnDef::new(FetchErrors::CreatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::cust("NOW()"))
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(FetchErrors::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Overrides::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(LotteryResults::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Schedules::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Pools::Table).to_owned())
            .await?;
        Ok(())
    }
}
