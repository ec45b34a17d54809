// Installments module

pub mod controllers;
pub mod models;
pub mod services;

pub use models::{InstallmentPeriod, PaymentPlan, PaymentPlanRequest, PlanProgress};
pub use services::InstallmentPlanner;
