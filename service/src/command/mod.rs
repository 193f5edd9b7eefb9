//! [`Command`] definition.

pub mod add_invoice_payment;
pub mod authorize_session;
pub mod cancel_order;
pub mod cancel_pickup;
pub mod complete_pickup;
pub mod complete_return;
pub mod confirm_quotation;
pub mod create_invoice;
pub mod create_order;
pub mod create_pickup;
pub mod create_quotation;
pub mod create_return;
pub mod delete_quotation;
pub mod update_invoice_status;
pub mod update_order_status;
pub mod update_quotation;
pub mod update_quotation_status;

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    add_invoice_payment::AddInvoicePayment,
    authorize_session::AuthorizeSession, cancel_order::CancelOrder,
    cancel_pickup::CancelPickup, complete_pickup::CompletePickup,
    complete_return::CompleteReturn, confirm_quotation::ConfirmQuotation,
    create_invoice::CreateInvoice, create_order::CreateOrder,
    create_pickup::CreatePickup, create_quotation::CreateQuotation,
    create_return::CreateReturn, delete_quotation::DeleteQuotation,
    update_invoice_status::UpdateInvoiceStatus,
    update_order_status::UpdateOrderStatus,
    update_quotation::UpdateQuotation,
    update_quotation_status::UpdateQuotationStatus,
};
