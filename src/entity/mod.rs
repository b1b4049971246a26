pub mod order_items;
pub mod orders;
pub mod products;
pub mod wishlist_entries;

pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use products::Entity as Products;
pub use wishlist_entries::Entity as WishlistEntries;
