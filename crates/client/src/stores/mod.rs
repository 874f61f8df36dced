pub mod cart;
pub mod compare;
pub mod session;
pub mod wishlist;
