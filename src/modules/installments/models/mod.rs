mod payment_plan;

pub use payment_plan::{InstallmentPeriod, PaymentPlan, PaymentPlanRequest, PlanProgress};
