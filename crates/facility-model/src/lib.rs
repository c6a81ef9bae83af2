//! # Facility model
//!
//! Typed records for every collection the dashboard reads and writes, the
//! closed enumerations behind their role and status fields, and the pure
//! rules built on them: role permissions, task status transitions, derived
//! inventory status, form validation and dashboard summaries.
//!
//! Nothing here performs I/O. Records deserialize from `{id, ...fields}`
//! documents as produced by the live bindings.

pub mod collections;
pub mod dashboard;
pub mod inspection;
pub mod inventory;
pub mod maintenance;
pub mod nursing;
pub mod tasks;
pub mod user;
pub mod validation;

pub use collections::Collection;
pub use dashboard::DashboardSummary;
pub use inspection::{Inspection, InspectionStatus, NewInspection};
pub use inventory::{InventoryItem, NewInventoryItem, StockStatus};
pub use maintenance::{
    MaintenanceIssueType, MaintenancePriority, MaintenanceStatus, MaintenanceWorkOrder,
    NewWorkOrder,
};
pub use nursing::{NewResident, NewShiftReport, Resident, Shift, ShiftReport};
pub use tasks::{DailyTask, DeepCleanStatus, DeepCleanTask, NewDailyTask, TaskStatus};
pub use user::{NewUser, User, UserId, UserRole};
pub use validation::ValidationError;
