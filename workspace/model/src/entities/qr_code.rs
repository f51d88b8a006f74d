use sea_orm::entity::prelude::*;

/// Issued QR identifier for a resident. The image encodes the decimal
/// user id only; the row is immutable once created.
///
/// The unique index on `resident_id` makes issuance safe under
/// concurrent requests: the losing insert hits the constraint and the
/// caller re-reads the winner's row instead of creating a duplicate.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "qr_codes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub resident_id: i32,
    /// Media path under `qrCodes/`, e.g. `qrCodes/user_7_qr.png`.
    pub qr: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::ResidentId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
