//! Domain definitions.

pub mod access;
pub mod fsm;
pub mod invoice;
pub mod order;
pub mod pickup;
pub mod product;
pub mod quotation;
pub mod rental;
pub mod rental_return;
pub mod sequence;
pub mod user;

pub use self::{
    invoice::Invoice, order::Order, pickup::Pickup, product::Product,
    quotation::Quotation, rental_return::Return, user::Actor,
};
