//! Read entities definitions.

pub mod quotation;
