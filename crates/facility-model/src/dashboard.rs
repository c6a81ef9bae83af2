//! Figures shown on the dashboard landing page.

use crate::inventory::InventoryItem;
use crate::tasks::{DailyTask, TaskStatus};
use crate::user::UserId;

/// How many of a user's open tasks the landing page lists.
pub const PRIORITY_TASK_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSummary {
    pub completed_tasks: usize,
    pub total_tasks: usize,
    /// Rounded to the nearest whole percent; zero when there are no tasks.
    pub completion_percent: u32,
    pub overdue_tasks: usize,
    pub low_stock_items: usize,
    pub priority_tasks: Vec<DailyTask>,
}

impl DashboardSummary {
    pub fn compute(tasks: &[DailyTask], items: &[InventoryItem], user_id: &UserId) -> Self {
        let total_tasks = tasks.len();
        let completed_tasks = tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Completed)
            .count();
        let completion_percent = if total_tasks == 0 {
            0
        } else {
            (completed_tasks as f64 * 100.0 / total_tasks as f64).round() as u32
        };

        Self {
            completed_tasks,
            total_tasks,
            completion_percent,
            overdue_tasks: tasks
                .iter()
                .filter(|t| t.status == TaskStatus::Overdue)
                .count(),
            low_stock_items: items.iter().filter(|i| i.needs_reorder()).count(),
            priority_tasks: tasks
                .iter()
                .filter(|t| &t.assigned_to == user_id && t.status.is_open())
                .take(PRIORITY_TASK_LIMIT)
                .cloned()
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn task(room: &str, who: &str, status: TaskStatus) -> DailyTask {
        DailyTask {
            id: room.to_lowercase(),
            room_number: room.into(),
            room_type: "Daily Clean".into(),
            assigned_to: who.into(),
            status,
            date: NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
            notes: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn item(quantity: u32, reorder_level: u32) -> InventoryItem {
        InventoryItem {
            id: format!("i{quantity}"),
            name: "Item".into(),
            category: "Supplies".into(),
            quantity,
            reorder_level,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn empty_inputs() {
        let summary = DashboardSummary::compute(&[], &[], &"hk1".into());
        assert_eq!(summary.total_tasks, 0);
        assert_eq!(summary.completion_percent, 0);
        assert!(summary.priority_tasks.is_empty());
    }

    #[test]
    fn counts_and_percentages() {
        let tasks = vec![
            task("A1", "hk1", TaskStatus::Completed),
            task("B1", "hk2", TaskStatus::InProgress),
            task("C1", "hk1", TaskStatus::Pending),
            task("B2", "hk2", TaskStatus::Overdue),
            task("A2", "hk1", TaskStatus::Declined),
            task("D1", "hk1", TaskStatus::Pending),
        ];
        let items = vec![item(15, 10), item(5, 15), item(0, 1), item(10, 10)];
        let summary = DashboardSummary::compute(&tasks, &items, &"hk1".into());

        assert_eq!(summary.completed_tasks, 1);
        assert_eq!(summary.total_tasks, 6);
        assert_eq!(summary.completion_percent, 17);
        assert_eq!(summary.overdue_tasks, 1);
        assert_eq!(summary.low_stock_items, 3);
        let rooms: Vec<_> = summary
            .priority_tasks
            .iter()
            .map(|t| t.room_number.as_str())
            .collect();
        assert_eq!(rooms, vec!["C1", "D1"]);
    }

    #[test]
    fn priority_list_is_capped() {
        let tasks: Vec<_> = (0..8)
            .map(|n| task(&format!("R{n}"), "hk1", TaskStatus::Pending))
            .collect();
        let summary = DashboardSummary::compute(&tasks, &[], &"hk1".into());
        assert_eq!(summary.priority_tasks.len(), PRIORITY_TASK_LIMIT);
        assert_eq!(summary.priority_tasks[0].room_number, "R0");
    }
}
