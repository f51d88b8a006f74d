//! This file serves as the root for all SeaORM entity modules.
//! We define the data models for the barangay resident-management
//! application here. The structure mirrors the relational schema the
//! HTTP layer operates on: users with one-to-one profiles and QR
//! records, and relief-goods batches with a claim join table.

pub mod profile;
pub mod qr_code;
pub mod relief_goods;
pub mod relief_goods_claim;
pub mod user;

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::profile::Entity as Profile;
    pub use super::qr_code::Entity as QrCode;
    pub use super::relief_goods::Entity as ReliefGoods;
    pub use super::relief_goods_claim::Entity as ReliefGoodsClaim;
    pub use super::user::Entity as User;
}
