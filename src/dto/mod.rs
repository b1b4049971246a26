pub mod cart;
pub mod checkout;
pub mod orders;
pub mod products;
pub mod session;
pub mod wishlist;
