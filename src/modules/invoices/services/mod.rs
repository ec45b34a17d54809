pub mod invoice_service;
pub mod lifecycle;
pub mod overdue_checker;
pub mod totals_calculator;

pub use invoice_service::InvoiceService;
pub use lifecycle::{InvoiceEvent, InvoiceLifecycle};
pub use overdue_checker::OverdueChecker;
pub use totals_calculator::{Totals, TotalsCalculator};
