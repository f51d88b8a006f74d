use super::{relief_goods, user};
use sea_orm::entity::prelude::*;

/// Join table recording which residents claimed which batch.
/// The composite primary key is what makes a claim at-most-once per
/// `(batch, user)` pair: a duplicate claim fails the insert instead of
/// slipping through between an existence check and an add.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "relief_goods_claims")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub relief_goods_id: i32,
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "relief_goods::Entity",
        from = "Column::ReliefGoodsId",
        to = "relief_goods::Column::Id",
        on_delete = "Cascade"
    )]
    ReliefGoods,
    #[sea_orm(
        belongs_to = "user::Entity",
        from = "Column::UserId",
        to = "user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<relief_goods::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ReliefGoods.def()
    }
}

impl Related<user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
