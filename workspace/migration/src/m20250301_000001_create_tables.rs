use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create users table
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(pk_auto(Users::Id))
                    .col(string(Users::Username).unique_key())
                    .col(string(Users::PasswordHash))
                    .col(string(Users::FirstName).default(""))
                    .col(string(Users::LastName).default(""))
                    .col(string(Users::Email).default(""))
                    .col(boolean(Users::IsStaff).default(false))
                    .col(boolean(Users::IsSuperuser).default(false))
                    .to_owned(),
            )
            .await?;

        // Create profiles table (one-to-one with users)
        manager
            .create_table(
                Table::create()
                    .table(Profiles::Table)
                    .if_not_exists()
                    .col(pk_auto(Profiles::Id))
                    .col(integer_uniq(Profiles::UserId))
                    .col(text_null(Profiles::Purok))
                    .col(text_null(Profiles::Address))
                    .col(text(Profiles::FamilyMembers))
                    .col(string_null(Profiles::ProfilePicture))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_profile_user")
                            .from(Profiles::Table, Profiles::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create qr_codes table; the unique resident_id is what keeps
        // concurrent issuance from creating two rows for one user
        manager
            .create_table(
                Table::create()
                    .table(QrCodes::Table)
                    .if_not_exists()
                    .col(pk_auto(QrCodes::Id))
                    .col(integer_uniq(QrCodes::ResidentId))
                    .col(string(QrCodes::Qr))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_qr_code_resident")
                            .from(QrCodes::Table, QrCodes::ResidentId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create relief_goods table
        manager
            .create_table(
                Table::create()
                    .table(ReliefGoods::Table)
                    .if_not_exists()
                    .col(pk_auto(ReliefGoods::Id))
                    .col(string(ReliefGoods::Name))
                    .col(timestamp_with_time_zone(ReliefGoods::DateIssued))
                    .to_owned(),
            )
            .await?;

        // Create relief_goods_claims join table; the composite primary
        // key enforces at-most-one claim per (batch, user) pair
        manager
            .create_table(
                Table::create()
                    .table(ReliefGoodsClaims::Table)
                    .if_not_exists()
                    .col(integer(ReliefGoodsClaims::ReliefGoodsId))
                    .col(integer(ReliefGoodsClaims::UserId))
                    .primary_key(
                        Index::create()
                            .name("pk_relief_goods_claims")
                            .col(ReliefGoodsClaims::ReliefGoodsId)
                            .col(ReliefGoodsClaims::UserId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_relief_goods_claims_batch")
                            .from(ReliefGoodsClaims::Table, ReliefGoodsClaims::ReliefGoodsId)
                            .to(ReliefGoods::Table, ReliefGoods::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_relief_goods_claims_user")
                            .from(ReliefGoodsClaims::Table, ReliefGoodsClaims::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ReliefGoodsClaims::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ReliefGoods::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(QrCodes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Profiles::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Username,
    PasswordHash,
    FirstName,
    LastName,
    Email,
    IsStaff,
    IsSuperuser,
}

#[derive(DeriveIden)]
enum Profiles {
    Table,
    Id,
    UserId,
    Purok,
    Address,
    FamilyMembers,
    ProfilePicture,
}

#[derive(DeriveIden)]
enum QrCodes {
    Table,
    Id,
    ResidentId,
    Qr,
}

#[derive(DeriveIden)]
enum ReliefGoods {
    Table,
    Id,
    Name,
    DateIssued,
}

#[derive(DeriveIden)]
enum ReliefGoodsClaims {
    Table,
    ReliefGoodsId,
    UserId,
}
