use sea_orm::entity::prelude::*;

/// A barangay system account. Residents are the subset with
/// `is_staff = false` and `is_superuser = false`; staff and superusers
/// are administrative accounts that never appear in resident listings.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub username: String,
    /// Argon2 PHC string. Plaintext passwords are never stored.
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub is_staff: bool,
    pub is_superuser: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    // Exactly one profile per user, created at registration.
    #[sea_orm(has_one = "super::profile::Entity")]
    Profile,
    // At most one QR code per user, issued lazily.
    #[sea_orm(has_one = "super::qr_code::Entity")]
    QrCode,
    #[sea_orm(has_many = "super::relief_goods_claim::Entity")]
    ReliefGoodsClaim,
}

impl Related<super::profile::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Profile.def()
    }
}

impl Related<super::qr_code::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::QrCode.def()
    }
}

impl Related<super::relief_goods::Entity> for Entity {
    fn to() -> RelationDef {
        super::relief_goods_claim::Relation::ReliefGoods.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::relief_goods_claim::Relation::User.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
