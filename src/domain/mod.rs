pub mod cart;
pub mod order;
pub mod product;

pub use cart::{CartLine, CartState, ProductSnapshot};
pub use order::{OrderItem, OrderRecord, OrderStatus, PaymentSession};
pub use product::{PageMeta, Product, ProductPage};
