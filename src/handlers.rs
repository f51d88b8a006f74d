pub mod auth;
pub mod health;
pub mod qr;
pub mod relief_goods;
pub mod residents;
pub mod users;
