use sea_orm::entity::prelude::*;

/// A distributable relief-goods batch. `date_issued` is stamped by the
/// server at creation and never client-settable.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "relief_goods")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub date_issued: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::relief_goods_claim::Entity")]
    ReliefGoodsClaim,
}

// claimed_by: many-to-many with users through relief_goods_claims.
impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        super::relief_goods_claim::Relation::User.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::relief_goods_claim::Relation::ReliefGoods.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
