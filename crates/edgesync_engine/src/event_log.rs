//! Sync event log.
//!
//! The log owns event durability. Events are ordered by
//! `(created_time, id)` within a tenant and paged with a keyset cursor, so
//! deleting events while paging never skips any.

use crate::error::{SyncError, SyncResult};
use crate::event::{SyncEvent, SyncEventAction, SyncEventType};
use async_trait::async_trait;
use edgesync_core::{now_millis, EntityId, StoreError, StoreResult, TenantId};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, trace};

/// Position after which the next page starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct EventCursor {
    /// Creation time of the last event returned.
    pub created_time: i64,
    /// ID of the last event returned.
    pub id: EntityId,
}

impl EventCursor {
    /// Returns the cursor positioned right after `event`.
    pub fn after(event: &SyncEvent) -> Self {
        Self {
            created_time: event.created_time,
            id: event.id,
        }
    }
}

/// Time window and page position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimePageLink {
    /// Maximum events per page.
    pub page_size: usize,
    /// Inclusive lower bound on creation time.
    pub start_time: Option<i64>,
    /// Exclusive upper bound on creation time.
    pub end_time: Option<i64>,
    /// Continue after this position.
    pub cursor: Option<EventCursor>,
}

impl TimePageLink {
    /// First page of the whole log.
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            start_time: None,
            end_time: None,
            cursor: None,
        }
    }

    /// Restricts the window to `[start, end)`.
    pub fn with_window(mut self, start_time: Option<i64>, end_time: Option<i64>) -> Self {
        self.start_time = start_time;
        self.end_time = end_time;
        self
    }

    /// Continues after `cursor`.
    pub fn with_cursor(mut self, cursor: Option<EventCursor>) -> Self {
        self.cursor = cursor;
        self
    }

    fn accepts(&self, created_time: i64) -> bool {
        self.start_time.map_or(true, |start| created_time >= start)
            && self.end_time.map_or(true, |end| created_time < end)
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq)]
pub struct PageData<T> {
    /// Page items in order.
    pub data: Vec<T>,
    /// Cursor of the following page, if there is one.
    pub next: Option<EventCursor>,
}

impl<T> PageData<T> {
    /// Returns true if another page follows.
    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }
}

/// Optional event filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncEventFilter {
    /// Only events about this entity.
    pub entity_id: Option<EntityId>,
    /// Only events of this kind.
    pub entity_type: Option<SyncEventType>,
    /// Only events with this action.
    pub action: Option<String>,
}

impl SyncEventFilter {
    /// Matches every event.
    pub fn all() -> Self {
        Self::default()
    }

    /// Restricts to one entity.
    pub fn entity(mut self, entity_id: EntityId) -> Self {
        self.entity_id = Some(entity_id);
        self
    }

    /// Restricts to one kind.
    pub fn entity_type(mut self, entity_type: SyncEventType) -> Self {
        self.entity_type = Some(entity_type);
        self
    }

    /// Restricts to one action.
    pub fn action(mut self, action: SyncEventAction) -> Self {
        self.action = Some(action.as_str().to_string());
        self
    }

    /// Returns true if `event` passes the filter.
    pub fn matches(&self, event: &SyncEvent) -> bool {
        self.entity_id.map_or(true, |id| event.entity_id == id)
            && self.entity_type.map_or(true, |ty| event.entity_type == ty)
            && self.action.as_deref().map_or(true, |a| event.action == a)
    }
}

/// Durable storage behind the [`SyncEventLog`].
#[async_trait]
pub trait SyncEventDao: Send + Sync {
    /// Stores an event.
    async fn save(&self, event: SyncEvent) -> StoreResult<()>;

    /// Returns one page of a tenant's events ordered by `(created_time, id)`.
    async fn find_events(
        &self,
        tenant_id: TenantId,
        filter: &SyncEventFilter,
        page_link: &TimePageLink,
    ) -> StoreResult<PageData<SyncEvent>>;

    /// Removes one event. Returns true if it existed.
    async fn remove(&self, tenant_id: TenantId, event_id: EntityId) -> StoreResult<bool>;

    /// Removes every event created before `cutoff`. Returns how many were removed.
    async fn remove_older_than(&self, cutoff: i64) -> StoreResult<usize>;
}

type EventKey = (TenantId, i64, EntityId);

/// An in-memory [`SyncEventDao`].
#[derive(Debug)]
pub struct MemorySyncEventDao {
    events: RwLock<BTreeMap<EventKey, SyncEvent>>,
    created_times: RwLock<HashMap<EntityId, i64>>,
    available: AtomicBool,
}

impl Default for MemorySyncEventDao {
    fn default() -> Self {
        Self {
            events: RwLock::new(BTreeMap::new()),
            created_times: RwLock::new(HashMap::new()),
            available: AtomicBool::new(true),
        }
    }
}

impl MemorySyncEventDao {
    /// Creates an empty log storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggles availability.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Returns the number of stored events across tenants.
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Returns true if no event is stored.
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }

    /// Returns every event of a tenant in order, bypassing availability.
    pub fn events(&self, tenant_id: TenantId) -> Vec<SyncEvent> {
        self.events
            .read()
            .iter()
            .filter(|((tenant, _, _), _)| *tenant == tenant_id)
            .map(|(_, event)| event.clone())
            .collect()
    }

    fn check(&self) -> StoreResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable("sync event storage is offline".into()))
        }
    }
}

#[async_trait]
impl SyncEventDao for MemorySyncEventDao {
    async fn save(&self, event: SyncEvent) -> StoreResult<()> {
        self.check()?;
        self.created_times
            .write()
            .insert(event.id, event.created_time);
        self.events
            .write()
            .insert((event.tenant_id, event.created_time, event.id), event);
        Ok(())
    }

    async fn find_events(
        &self,
        tenant_id: TenantId,
        filter: &SyncEventFilter,
        page_link: &TimePageLink,
    ) -> StoreResult<PageData<SyncEvent>> {
        self.check()?;
        let lower = match page_link.cursor {
            Some(cursor) => Bound::Excluded((tenant_id, cursor.created_time, cursor.id)),
            None => Bound::Included((
                tenant_id,
                page_link.start_time.unwrap_or(i64::MIN),
                EntityId::NIL,
            )),
        };

        let events = self.events.read();
        let mut data: Vec<SyncEvent> = events
            .range((lower, Bound::Unbounded))
            .take_while(|((tenant, created_time, _), _)| {
                *tenant == tenant_id && page_link.end_time.map_or(true, |end| *created_time < end)
            })
            .filter(|((_, created_time, _), event)| {
                page_link.accepts(*created_time) && filter.matches(event)
            })
            .map(|(_, event)| event.clone())
            .take(page_link.page_size + 1)
            .collect();

        let next = if data.len() > page_link.page_size {
            data.truncate(page_link.page_size);
            data.last().map(EventCursor::after)
        } else {
            None
        };
        Ok(PageData { data, next })
    }

    async fn remove(&self, tenant_id: TenantId, event_id: EntityId) -> StoreResult<bool> {
        self.check()?;
        let Some(created_time) = self.created_times.read().get(&event_id).copied() else {
            return Ok(false);
        };
        let removed = self
            .events
            .write()
            .remove(&(tenant_id, created_time, event_id))
            .is_some();
        if removed {
            self.created_times.write().remove(&event_id);
        }
        Ok(removed)
    }

    async fn remove_older_than(&self, cutoff: i64) -> StoreResult<usize> {
        self.check()?;
        let mut events = self.events.write();
        let mut created_times = self.created_times.write();
        let before = events.len();
        events.retain(|(_, created_time, id), _| {
            let keep = *created_time >= cutoff;
            if !keep {
                created_times.remove(id);
            }
            keep
        });
        Ok(before - events.len())
    }
}

/// Validating front of the event storage.
#[derive(Clone)]
pub struct SyncEventLog {
    dao: Arc<dyn SyncEventDao>,
    cleanup_page_size: usize,
}

impl SyncEventLog {
    /// Creates a log over `dao`.
    pub fn new(dao: Arc<dyn SyncEventDao>, cleanup_page_size: usize) -> Self {
        Self {
            dao,
            cleanup_page_size: cleanup_page_size.max(1),
        }
    }

    /// Stores an event after validating it.
    pub async fn append(&self, event: SyncEvent) -> SyncResult<()> {
        if event.action.trim().is_empty() {
            return Err(SyncError::Validation(format!(
                "sync event {} for {} {} has an empty action",
                event.id, event.entity_type, event.entity_id
            )));
        }
        trace!(
            tenant = %event.tenant_id,
            entity_type = %event.entity_type,
            entity_id = %event.entity_id,
            action = %event.action,
            "appending sync event"
        );
        let context = format!("{event:?}");
        self.dao
            .save(event)
            .await
            .map_err(|e| SyncError::from_store(context, e))
    }

    /// Builds and stores an event stamped with the current time.
    pub async fn enqueue(
        &self,
        tenant_id: TenantId,
        entity_type: SyncEventType,
        action: SyncEventAction,
        entity_id: EntityId,
        entity_body: Option<Value>,
    ) -> SyncResult<()> {
        self.append(SyncEvent::new(
            tenant_id,
            entity_type,
            action,
            entity_id,
            entity_body,
        ))
        .await
    }

    /// Returns one page of a tenant's events.
    pub async fn page(
        &self,
        tenant_id: TenantId,
        filter: &SyncEventFilter,
        page_link: &TimePageLink,
    ) -> SyncResult<PageData<SyncEvent>> {
        self.dao
            .find_events(tenant_id, filter, page_link)
            .await
            .map_err(|e| SyncError::from_store(format!("page {page_link:?} of {tenant_id}"), e))
    }

    /// Removes a delivered event.
    pub async fn remove(&self, tenant_id: TenantId, event_id: EntityId) -> SyncResult<bool> {
        self.dao
            .remove(tenant_id, event_id)
            .await
            .map_err(|e| SyncError::from_store(format!("remove event {event_id}"), e))
    }

    /// Removes every event older than `ttl`.
    pub async fn cleanup(&self, ttl: Duration) -> SyncResult<usize> {
        self.cleanup_at(now_millis(), ttl).await
    }

    /// Removes every event created before `now - ttl`.
    pub async fn cleanup_at(&self, now: i64, ttl: Duration) -> SyncResult<usize> {
        let ttl_millis = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        let cutoff = now.saturating_sub(ttl_millis);
        let removed = self
            .dao
            .remove_older_than(cutoff)
            .await
            .map_err(|e| SyncError::from_store(format!("cleanup before {cutoff}"), e))?;
        if removed > 0 {
            info!(removed, cutoff, "expired sync events removed");
        }
        Ok(removed)
    }

    /// Deletes every event of a tenant, one page at a time.
    pub async fn delete_all_for_tenant(&self, tenant_id: TenantId) -> SyncResult<usize> {
        let mut link = TimePageLink::new(self.cleanup_page_size);
        let mut deleted = 0;
        loop {
            let page = self.page(tenant_id, &SyncEventFilter::all(), &link).await?;
            if page.data.is_empty() {
                break;
            }
            for event in &page.data {
                if self.remove(tenant_id, event.id).await? {
                    deleted += 1;
                }
            }
            link = link.with_cursor(page.data.last().map(EventCursor::after));
        }
        debug!(tenant = %tenant_id, deleted, "tenant sync events deleted");
        Ok(deleted)
    }
}

impl std::fmt::Debug for SyncEventLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEventLog")
            .field("cleanup_page_size", &self.cleanup_page_size)
            .finish_non_exhaustive()
    }
}
