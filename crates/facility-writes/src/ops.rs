//! Typed facility operations.

use document_store::{CollectionRef, DocumentRef};
use facility_model::{
    Collection, DailyTask, InventoryItem, NewDailyTask, NewInspection, NewInventoryItem,
    NewResident, NewShiftReport, NewUser, NewWorkOrder, TaskStatus,
};
use serde::Serialize;
use serde_json::json;
use tracing::info;

use crate::error::WriteError;
use crate::writer::Writer;

/// Profile document written by the add-user form. The id is the client-side
/// document id; no sign-in account is created.
#[derive(Serialize)]
pub(crate) struct UserRecord<'a> {
    #[serde(flatten)]
    pub(crate) user: &'a NewUser,
    pub(crate) id: &'a str,
}

fn collection(collection: Collection) -> CollectionRef {
    CollectionRef::new(collection.as_str())
}

/// Form-level operations of the dashboard. Each validates first and writes
/// nothing when validation fails.
#[derive(Debug, Clone)]
pub struct FacilityWrites {
    writer: Writer,
}

impl FacilityWrites {
    pub fn new(writer: Writer) -> Self {
        Self { writer }
    }

    pub fn writer(&self) -> &Writer {
        &self.writer
    }

    pub async fn add_task(&self, task: &NewDailyTask) -> Result<DocumentRef, WriteError> {
        task.validate()?;
        let doc = self
            .writer
            .create(&collection(Collection::DailyTasks), task)
            .await?;
        info!(room = %task.room_number, assigned_to = %task.assigned_to, "task added");
        Ok(doc)
    }

    /// Move a task along its status machine. Returns the new status.
    pub async fn update_task_status(
        &self,
        task: &DailyTask,
        next: TaskStatus,
    ) -> Result<TaskStatus, WriteError> {
        let status = task.status.transition(next)?;
        self.write_task_status(task, status).await
    }

    /// Flag an open task as overdue, outside the normal transitions.
    pub async fn mark_task_overdue(&self, task: &DailyTask) -> Result<TaskStatus, WriteError> {
        let status = task.status.mark_overdue();
        if status == task.status {
            return Ok(status);
        }
        self.write_task_status(task, status).await
    }

    async fn write_task_status(
        &self,
        task: &DailyTask,
        status: TaskStatus,
    ) -> Result<TaskStatus, WriteError> {
        let doc = collection(Collection::DailyTasks).doc(task.id.as_str());
        self.writer
            .update(&doc, &json!({ "status": status }))
            .await?;
        info!(task = %task.id, status = status.as_str(), "task status updated");
        Ok(status)
    }

    pub async fn add_item(&self, item: &NewInventoryItem) -> Result<DocumentRef, WriteError> {
        item.validate()?;
        self.writer
            .create(&collection(Collection::Inventory), item)
            .await
    }

    /// Take `amount` units out of stock. Returns the remaining quantity.
    pub async fn use_item(&self, item: &InventoryItem, amount: u32) -> Result<u32, WriteError> {
        let quantity = item.consume(amount)?;
        self.write_quantity(item, quantity).await
    }

    pub async fn restock_item(&self, item: &InventoryItem, amount: u32) -> Result<u32, WriteError> {
        let quantity = item.restock(amount)?;
        self.write_quantity(item, quantity).await
    }

    async fn write_quantity(&self, item: &InventoryItem, quantity: u32) -> Result<u32, WriteError> {
        let doc = collection(Collection::Inventory).doc(item.id.as_str());
        self.writer
            .update(&doc, &json!({ "quantity": quantity }))
            .await?;
        info!(item = %item.name, quantity, "stock updated");
        Ok(quantity)
    }

    pub async fn add_user(&self, user: &NewUser) -> Result<DocumentRef, WriteError> {
        user.validate()?;
        let users = collection(Collection::Users);
        let doc = self.writer.store().new_document_ref(&users);
        self.writer
            .set_reporting(&doc, &UserRecord { user, id: doc.id() }, user)
            .await?;
        info!(id = doc.id(), role = %user.role, "user added");
        Ok(doc)
    }

    pub async fn add_work_order(&self, order: &NewWorkOrder) -> Result<DocumentRef, WriteError> {
        order.validate()?;
        self.writer
            .create(&collection(Collection::MaintenanceWorkOrders), order)
            .await
    }

    pub async fn add_inspection(
        &self,
        inspection: &NewInspection,
    ) -> Result<DocumentRef, WriteError> {
        inspection.validate()?;
        self.writer
            .create(&collection(Collection::Inspections), inspection)
            .await
    }

    pub async fn add_resident(&self, resident: &NewResident) -> Result<DocumentRef, WriteError> {
        resident.validate()?;
        self.writer
            .create(&collection(Collection::Residents), resident)
            .await
    }

    pub async fn add_shift_report(
        &self,
        report: &NewShiftReport,
    ) -> Result<DocumentRef, WriteError> {
        report.validate()?;
        self.writer
            .create(&collection(Collection::ShiftReports), report)
            .await
    }
}
