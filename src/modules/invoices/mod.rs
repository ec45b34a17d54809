// Invoices module

pub mod controllers;
pub mod models;
pub mod repositories;
pub mod services;

pub use models::{Invoice, InvoiceStatus, LineItem, PaymentMethod};
pub use repositories::{InMemoryInvoiceRepository, InvoiceRepository, MySqlInvoiceRepository};
pub use services::{InvoiceEvent, InvoiceLifecycle, InvoiceService, OverdueChecker, TotalsCalculator};
