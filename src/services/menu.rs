//! Menu reads.
//!
//! The public listing only shows available items; direct lookups return
//! unavailable items too so staff tooling can still inspect them.

use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::DbPool;
use crate::entities::menu_item::{self, Entity as MenuItems};
use crate::errors::ServiceError;

#[derive(Clone)]
pub struct MenuService {
    db: Arc<DbPool>,
}

impl MenuService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    pub async fn list_available(&self) -> Result<Vec<menu_item::Model>, ServiceError> {
        Ok(MenuItems::find()
            .filter(menu_item::Column::IsAvailable.eq(true))
            .order_by_asc(menu_item::Column::Name)
            .all(&*self.db)
            .await?)
    }

    pub async fn get_item(&self, item_id: Uuid) -> Result<menu_item::Model, ServiceError> {
        MenuItems::find_by_id(item_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Menu item {} not found", item_id)))
    }
}
