use sea_orm::entity::prelude::*;

/// Resident profile, one-to-one with its owning user.
/// The unique index on `user_id` enforces the 1:1; the row is created
/// atomically with the user at registration and dropped by cascade when
/// the user is deleted.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "profiles")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub user_id: i32,
    /// Zone/district within the barangay.
    pub purok: Option<String>,
    pub address: Option<String>,
    /// Free-form list of household members. Mandatory at registration.
    pub family_members: String,
    /// Media path under `profile_pictures/`, extension jpg/jpeg/png.
    pub profile_picture: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
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
