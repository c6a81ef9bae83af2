//! Names of the collections held by the hosted store.

use std::fmt;

/// Every collection the dashboard touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Users,
    DailyTasks,
    DeepCleanTasks,
    Inventory,
    MaintenanceWorkOrders,
    Inspections,
    Residents,
    ShiftReports,
}

impl Collection {
    pub const ALL: [Collection; 8] = [
        Self::Users,
        Self::DailyTasks,
        Self::DeepCleanTasks,
        Self::Inventory,
        Self::MaintenanceWorkOrders,
        Self::Inspections,
        Self::Residents,
        Self::ShiftReports,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::DailyTasks => "daily_tasks",
            Self::DeepCleanTasks => "deep_clean_tasks",
            Self::Inventory => "inventory",
            Self::MaintenanceWorkOrders => "maintenance_work_orders",
            Self::Inspections => "inspections",
            Self::Residents => "residents",
            Self::ShiftReports => "shift_reports",
        }
    }

    /// Resolve a collection name, accepting the camelCase spellings some
    /// older views used (`dailyTasks`, `deepCleanTasks`, `maintenance`).
    pub fn from_name(name: &str) -> Option<Self> {
        let found = match name {
            "users" => Self::Users,
            "daily_tasks" | "dailyTasks" => Self::DailyTasks,
            "deep_clean_tasks" | "deepCleanTasks" => Self::DeepCleanTasks,
            "inventory" => Self::Inventory,
            "maintenance_work_orders" | "maintenance" => Self::MaintenanceWorkOrders,
            "inspections" => Self::Inspections,
            "residents" => Self::Residents,
            "shift_reports" | "shiftReports" => Self::ShiftReports,
            _ => return None,
        };
        Some(found)
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
