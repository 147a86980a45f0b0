pub mod budgets;
pub mod callbacks;
pub mod catalog;
pub mod design_automation;
pub mod jobs;
pub mod pricebook;
