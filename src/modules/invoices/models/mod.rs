mod invoice;
mod line_item;

pub use invoice::{
    Invoice, InvoiceDraftRequest, InvoiceResponse, InvoiceStatus, ManualDiscount, PaymentMethod,
    PaymentMethodRequest, PaymentRecord, RecordPaymentRequest, TotalsRequest, TotalsResponse,
    TransitionRequest,
};
pub use line_item::LineItem;
