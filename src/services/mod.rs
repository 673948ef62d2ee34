pub mod cart;
pub mod orders;
pub mod poller;
pub mod products;

pub use cart::CartService;
pub use orders::OrderService;
pub use poller::{
    CallbackStatus, PaymentCallback, PollHandle, PollerConfig, PollerEvent, PollerState,
    StatusPoller,
};
pub use products::{ProductQuery, ProductService};
