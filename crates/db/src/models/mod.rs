pub mod brand;
pub mod category;
pub mod compare;
pub mod order;
pub mod product;
pub mod user;
pub mod wishlist;
