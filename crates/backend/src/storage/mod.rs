use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use plotmap_shared::geometry::{geometry_bounds, Bounds};
use plotmap_shared::models::{
    new_id, DatasetImport, OrderData, OrderList, OrderStatus, OrderStatusUpdate, Plot, PlotOrder, PlotStatus,
    SystemStats,
};
use redb::{Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

const PLOTS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("plots");
const ORDERS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("orders");
const IMPORTS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("imports");

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] redb::Error),
    #[error("corrupt record: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error("plot {0} not found")]
    PlotNotFound(String),
    #[error("order {0} not found")]
    OrderNotFound(String),
    #[error("plot is not available for ordering: {0}")]
    PlotUnavailable(PlotStatus),
}

macro_rules! from_redb {
    ($($ty:ty),*) => {
        $(impl From<$ty> for StorageError {
            fn from(e: $ty) -> Self {
                StorageError::Database(e.into())
            }
        })*
    };
}

from_redb!(
    redb::DatabaseError,
    redb::TransactionError,
    redb::TableError,
    redb::StorageError,
    redb::CommitError
);

type Result<T> = std::result::Result<T, StorageError>;

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    Ok(serde_json::from_slice(bytes)?)
}

fn read_all<T, Tbl>(table: &Tbl) -> Result<Vec<T>>
where
    T: DeserializeOwned,
    Tbl: ReadableTable<&'static str, &'static [u8]>,
{
    let mut records = Vec::new();
    for entry in table.iter()? {
        let (_, value) = entry?;
        records.push(decode(value.value())?);
    }
    Ok(records)
}

/// Filters for `/api/plots/search`. Text fields match case-insensitively.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlotQuery {
    pub district: Option<String>,
    pub ward: Option<String>,
    pub village: Option<String>,
    pub status: Option<PlotStatus>,
    pub min_area: Option<f64>,
    pub max_area: Option<f64>,
    pub bbox: Option<Bounds>,
}

fn same_text(filter: &Option<String>, value: &str) -> bool {
    filter.as_ref().is_none_or(|f| f.eq_ignore_ascii_case(value))
}

impl PlotQuery {
    pub fn matches(&self, plot: &Plot) -> bool {
        same_text(&self.district, &plot.district)
            && same_text(&self.ward, &plot.ward)
            && same_text(&self.village, &plot.village)
            && self.status.is_none_or(|s| s == plot.status)
            && self.min_area.is_none_or(|min| plot.area_hectares >= min)
            && self.max_area.is_none_or(|max| plot.area_hectares <= max)
            && self.bbox.is_none_or(|bbox| {
                geometry_bounds(&plot.geometry).is_some_and(|b| b.intersects(&bbox))
            })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderQuery {
    pub status: Option<OrderStatus>,
    pub plot_id: Option<String>,
    pub limit: usize,
    pub offset: usize,
}

impl Default for OrderQuery {
    fn default() -> Self {
        OrderQuery {
            status: None,
            plot_id: None,
            limit: 100,
            offset: 0,
        }
    }
}

pub struct Storage {
    db: Database,
}

impl Storage {
    pub fn open(path: &Path) -> Result<Arc<Self>> {
        let db = Database::create(path)?;

        // Ensure tables exist
        let write_txn = db.begin_write()?;
        {
            write_txn.open_table(PLOTS_TABLE)?;
            write_txn.open_table(ORDERS_TABLE)?;
            write_txn.open_table(IMPORTS_TABLE)?;
        }
        write_txn.commit()?;

        Ok(Arc::new(Storage { db }))
    }

    /// Cheap read used by the health check.
    pub fn ping(&self) -> Result<()> {
        let read_txn = self.db.begin_read()?;
        read_txn.open_table(PLOTS_TABLE)?;
        Ok(())
    }

    /// Every plot, ordered by plot code.
    pub fn list_plots(&self) -> Result<Vec<Plot>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PLOTS_TABLE)?;
        let mut plots: Vec<Plot> = read_all(&table)?;
        plots.sort_by(|a, b| a.plot_code.cmp(&b.plot_code));
        Ok(plots)
    }

    pub fn search_plots(&self, query: &PlotQuery) -> Result<Vec<Plot>> {
        let mut plots = self.list_plots()?;
        plots.retain(|p| query.matches(p));
        Ok(plots)
    }

    pub fn get_plot(&self, id: &str) -> Result<Option<Plot>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PLOTS_TABLE)?;
        let plot = table.get(id)?.map(|v| decode(v.value())).transpose()?;
        Ok(plot)
    }

    pub fn count_plots(&self) -> Result<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PLOTS_TABLE)?;
        Ok(table.len()?)
    }

    /// Insert plots whose code is not stored yet. Returns how many were
    /// inserted.
    pub fn insert_plots(&self, plots: &[Plot]) -> Result<usize> {
        let write_txn = self.db.begin_write()?;
        let inserted = {
            let mut table = write_txn.open_table(PLOTS_TABLE)?;
            let existing: Vec<Plot> = read_all(&table)?;
            let mut codes: HashSet<String> = existing.into_iter().map(|p| p.plot_code).collect();
            let mut inserted = 0;
            for plot in plots {
                if !codes.insert(plot.plot_code.clone()) {
                    tracing::debug!(plot_code = %plot.plot_code, "skipping existing plot code");
                    continue;
                }
                let json = encode(plot)?;
                table.insert(plot.id.as_str(), json.as_slice())?;
                inserted += 1;
            }
            inserted
        };
        write_txn.commit()?;
        Ok(inserted)
    }

    /// Create a pending order and flip the plot to `pending` in one
    /// transaction.
    pub fn create_order(&self, plot_id: &str, data: OrderData, now: DateTime<Utc>) -> Result<PlotOrder> {
        let write_txn = self.db.begin_write()?;
        let order = {
            let mut plots = write_txn.open_table(PLOTS_TABLE)?;
            let mut orders = write_txn.open_table(ORDERS_TABLE)?;

            let mut plot: Plot = plots
                .get(plot_id)?
                .map(|v| decode(v.value()))
                .transpose()?
                .ok_or_else(|| StorageError::PlotNotFound(plot_id.to_string()))?;
            if !plot.is_available() {
                return Err(StorageError::PlotUnavailable(plot.status));
            }

            let order = PlotOrder {
                id: new_id(),
                plot_id: plot.id.clone(),
                plot_code: Some(plot.plot_code.clone()),
                customer_name: data.customer_name,
                customer_phone: data.customer_phone,
                customer_email: data.customer_email,
                customer_id_number: data.customer_id_number,
                intended_use: data.intended_use,
                notes: data.notes,
                status: OrderStatus::Pending,
                admin_notes: None,
                created_at: now,
                updated_at: now,
            };
            plot.status = PlotStatus::Pending;
            plot.updated_at = now;

            let order_json = encode(&order)?;
            orders.insert(order.id.as_str(), order_json.as_slice())?;
            let plot_json = encode(&plot)?;
            plots.insert(plot.id.as_str(), plot_json.as_slice())?;
            order
        };
        write_txn.commit()?;
        tracing::info!(plot_id, order_id = %order.id, "order created");
        Ok(order)
    }

    pub fn get_order(&self, id: &str) -> Result<Option<PlotOrder>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;
        let order = table.get(id)?.map(|v| decode(v.value())).transpose()?;
        Ok(order)
    }

    /// Orders matching the query, newest first, with the unpaged total.
    pub fn list_orders(&self, query: &OrderQuery) -> Result<OrderList> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;
        let mut orders: Vec<PlotOrder> = read_all(&table)?;
        orders.retain(|o| {
            query.status.is_none_or(|s| s == o.status)
                && query.plot_id.as_ref().is_none_or(|id| *id == o.plot_id)
        });
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = orders.len();
        let orders = orders
            .into_iter()
            .skip(query.offset)
            .take(query.limit)
            .collect();
        Ok(OrderList {
            orders,
            total,
            limit: query.limit,
            offset: query.offset,
        })
    }

    /// Change an order's status and carry the change over to its plot:
    /// approval takes the plot, rejection frees it unless another order for
    /// it is still pending.
    pub fn update_order_status(
        &self,
        order_id: &str,
        update: OrderStatusUpdate,
        now: DateTime<Utc>,
    ) -> Result<PlotOrder> {
        let write_txn = self.db.begin_write()?;
        let (order, previous) = {
            let mut orders = write_txn.open_table(ORDERS_TABLE)?;
            let mut plots = write_txn.open_table(PLOTS_TABLE)?;

            let mut order: PlotOrder = orders
                .get(order_id)?
                .map(|v| decode(v.value()))
                .transpose()?
                .ok_or_else(|| StorageError::OrderNotFound(order_id.to_string()))?;
            let previous = order.status;
            order.status = update.status;
            order.admin_notes = update.notes;
            order.updated_at = now;

            let plot: Option<Plot> = plots.get(order.plot_id.as_str())?.map(|v| decode(v.value())).transpose()?;
            if let Some(mut plot) = plot {
                let next = match update.status {
                    OrderStatus::Approved => Some(PlotStatus::Taken),
                    OrderStatus::Rejected => {
                        let all: Vec<PlotOrder> = read_all(&orders)?;
                        let other_pending = all.iter().any(|o| {
                            o.plot_id == order.plot_id
                                && o.id != order.id
                                && o.status == OrderStatus::Pending
                        });
                        (!other_pending).then_some(PlotStatus::Available)
                    }
                    OrderStatus::Pending => None,
                };
                if let Some(status) = next {
                    plot.status = status;
                    plot.updated_at = now;
                    let plot_json = encode(&plot)?;
                    plots.insert(plot.id.as_str(), plot_json.as_slice())?;
                }
            } else {
                tracing::warn!(order_id, plot_id = %order.plot_id, "order refers to a missing plot");
            }

            let order_json = encode(&order)?;
            orders.insert(order.id.as_str(), order_json.as_slice())?;
            (order, previous)
        };
        write_txn.commit()?;
        tracing::info!(order_id, from = %previous, to = %order.status, "order status updated");
        Ok(order)
    }

    /// Store import metadata, replacing any earlier record for the dataset.
    pub fn record_import(&self, record: &DatasetImport) -> Result<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(IMPORTS_TABLE)?;
            let json = encode(record)?;
            table.insert(record.dataset_name.as_str(), json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Every recorded import, most recent first.
    pub fn list_imports(&self) -> Result<Vec<DatasetImport>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(IMPORTS_TABLE)?;
        let mut imports: Vec<DatasetImport> = read_all(&table)?;
        imports.sort_by(|a, b| b.imported_at.cmp(&a.imported_at));
        Ok(imports)
    }

    pub fn get_import(&self, dataset_name: &str) -> Result<Option<DatasetImport>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(IMPORTS_TABLE)?;
        let record = table.get(dataset_name)?.map(|v| decode(v.value())).transpose()?;
        Ok(record)
    }

    pub fn stats(&self) -> Result<SystemStats> {
        let read_txn = self.db.begin_read()?;
        let plots: Vec<Plot> = read_all(&read_txn.open_table(PLOTS_TABLE)?)?;
        let orders: Vec<PlotOrder> = read_all(&read_txn.open_table(ORDERS_TABLE)?)?;

        let count_plots = |s: PlotStatus| plots.iter().filter(|p| p.status == s).count() as u64;
        let count_orders = |s: OrderStatus| orders.iter().filter(|o| o.status == s).count() as u64;
        let distinct = |field: fn(&Plot) -> &str| {
            plots.iter().map(field).collect::<HashSet<_>>().len() as u64
        };

        Ok(SystemStats {
            total_plots: plots.len() as u64,
            available_plots: count_plots(PlotStatus::Available),
            taken_plots: count_plots(PlotStatus::Taken),
            pending_plots: count_plots(PlotStatus::Pending),
            total_orders: orders.len() as u64,
            pending_orders: count_orders(OrderStatus::Pending),
            approved_orders: count_orders(OrderStatus::Approved),
            rejected_orders: count_orders(OrderStatus::Rejected),
            districts: distinct(|p| p.district.as_str()),
            wards: distinct(|p| p.ward.as_str()),
            villages: distinct(|p| p.village.as_str()),
            total_area_hectares: plots.iter().map(|p| p.area_hectares).sum(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plotmap_shared::models::IntendedUse;
    use plotmap_shared::sample::sample_plots;

    fn open() -> (tempfile::TempDir, Arc<Storage>) {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::open(&dir.path().join("test.redb")).unwrap();
        storage.insert_plots(&sample_plots()).unwrap();
        (dir, storage)
    }

    fn order_data() -> OrderData {
        OrderData {
            customer_name: "Amina Juma".into(),
            customer_phone: "0712345678".into(),
            customer_email: None,
            customer_id_number: "19900101-12345".into(),
            intended_use: IntendedUse::Residential,
            notes: None,
        }
    }

    #[test]
    fn test_plots_listed_by_code() {
        let (_dir, storage) = open();
        let plots = storage.list_plots().unwrap();
        let codes: Vec<_> = plots.iter().map(|p| p.plot_code.as_str()).collect();
        assert_eq!(codes, ["MBY-001", "MBY-002", "MBY-003", "MBY-004", "MBY-005"]);
        assert_eq!(storage.count_plots().unwrap(), 5);
    }

    #[test]
    fn test_existing_codes_are_skipped() {
        let (_dir, storage) = open();
        assert_eq!(storage.insert_plots(&sample_plots()).unwrap(), 0);
        assert_eq!(storage.count_plots().unwrap(), 5);
    }

    #[test]
    fn test_order_flips_plot_to_pending() {
        let (_dir, storage) = open();
        let order = storage.create_order("1", order_data(), Utc::now()).unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.plot_code.as_deref(), Some("MBY-001"));
        assert_eq!(storage.get_plot("1").unwrap().unwrap().status, PlotStatus::Pending);
        assert_eq!(storage.get_order(&order.id).unwrap(), Some(order));
    }

    #[test]
    fn test_order_on_unavailable_plot_is_refused() {
        let (_dir, storage) = open();
        let err = storage.create_order("2", order_data(), Utc::now()).unwrap_err();
        assert!(matches!(err, StorageError::PlotUnavailable(PlotStatus::Taken)));
        let err = storage.create_order("nope", order_data(), Utc::now()).unwrap_err();
        assert!(matches!(err, StorageError::PlotNotFound(_)));
        assert_eq!(storage.list_orders(&OrderQuery::default()).unwrap().total, 0);
    }

    #[test]
    fn test_approval_takes_plot() {
        let (_dir, storage) = open();
        let order = storage.create_order("3", order_data(), Utc::now()).unwrap();
        let update = OrderStatusUpdate {
            status: OrderStatus::Approved,
            notes: Some("Paid".into()),
        };
        let updated = storage.update_order_status(&order.id, update, Utc::now()).unwrap();
        assert_eq!(updated.status, OrderStatus::Approved);
        assert_eq!(updated.admin_notes.as_deref(), Some("Paid"));
        assert_eq!(storage.get_plot("3").unwrap().unwrap().status, PlotStatus::Taken);
    }

    #[test]
    fn test_rejection_frees_plot() {
        let (_dir, storage) = open();
        let order = storage.create_order("5", order_data(), Utc::now()).unwrap();
        let update = OrderStatusUpdate {
            status: OrderStatus::Rejected,
            notes: None,
        };
        storage.update_order_status(&order.id, update, Utc::now()).unwrap();
        assert_eq!(storage.get_plot("5").unwrap().unwrap().status, PlotStatus::Available);
    }

    #[test]
    fn test_unknown_order_update() {
        let (_dir, storage) = open();
        let update = OrderStatusUpdate {
            status: OrderStatus::Approved,
            notes: None,
        };
        let err = storage.update_order_status("missing", update, Utc::now()).unwrap_err();
        assert!(matches!(err, StorageError::OrderNotFound(_)));
    }

    #[test]
    fn test_orders_newest_first_and_paged() {
        let (_dir, storage) = open();
        let t0 = Utc::now();
        let first = storage.create_order("1", order_data(), t0).unwrap();
        let second = storage
            .create_order("3", order_data(), t0 + chrono::Duration::seconds(5))
            .unwrap();

        let all = storage.list_orders(&OrderQuery::default()).unwrap();
        assert_eq!(all.total, 2);
        assert_eq!(all.orders[0].id, second.id);
        assert_eq!(all.orders[1].id, first.id);

        let paged = storage
            .list_orders(&OrderQuery {
                limit: 1,
                offset: 1,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(paged.total, 2);
        assert_eq!(paged.orders.len(), 1);
        assert_eq!(paged.orders[0].id, first.id);

        let for_plot = storage
            .list_orders(&OrderQuery {
                plot_id: Some("1".into()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(for_plot.total, 1);
    }

    #[test]
    fn test_search_filters() {
        let (_dir, storage) = open();
        let query = PlotQuery {
            district: Some("KILOSA".into()),
            status: Some(PlotStatus::Available),
            min_area: Some(4.8),
            ..Default::default()
        };
        let codes: Vec<_> = storage
            .search_plots(&query)
            .unwrap()
            .into_iter()
            .map(|p| p.plot_code)
            .collect();
        assert_eq!(codes, ["MBY-001", "MBY-005"]);

        let far_away = PlotQuery {
            bbox: Some(Bounds {
                min_lng: 30.0,
                min_lat: -3.0,
                max_lng: 31.0,
                max_lat: -2.0,
            }),
            ..Default::default()
        };
        assert!(storage.search_plots(&far_away).unwrap().is_empty());
    }

    fn import_record(name: &str, count: u64, at: DateTime<Utc>) -> DatasetImport {
        DatasetImport {
            dataset_name: name.into(),
            source_file: Some(format!("{name}.geojson")),
            attribute_schema: Default::default(),
            feature_count: count,
            imported_at: at,
            bbox: None,
        }
    }

    #[test]
    fn test_imports_replace_by_name_and_list_newest_first() {
        let (_dir, storage) = open();
        let t0 = Utc::now();
        storage.record_import(&import_record("mbuyuni", 10, t0)).unwrap();
        storage
            .record_import(&import_record("ihombwe", 4, t0 + chrono::Duration::seconds(5)))
            .unwrap();
        storage
            .record_import(&import_record("mbuyuni", 12, t0 + chrono::Duration::seconds(10)))
            .unwrap();

        let imports = storage.list_imports().unwrap();
        let names: Vec<_> = imports.iter().map(|i| i.dataset_name.as_str()).collect();
        assert_eq!(names, ["mbuyuni", "ihombwe"]);
        assert_eq!(storage.get_import("mbuyuni").unwrap().unwrap().feature_count, 12);
        assert_eq!(storage.get_import("missing").unwrap(), None);
    }

    #[test]
    fn test_stats() {
        let (_dir, storage) = open();
        storage.create_order("1", order_data(), Utc::now()).unwrap();
        let stats = storage.stats().unwrap();
        assert_eq!(stats.total_plots, 5);
        assert_eq!(stats.available_plots, 2);
        assert_eq!(stats.taken_plots, 1);
        assert_eq!(stats.pending_plots, 2);
        assert_eq!(stats.total_orders, 1);
        assert_eq!(stats.pending_orders, 1);
        assert_eq!(stats.districts, 1);
        assert!((stats.total_area_hectares - 24.6).abs() < 1e-9);
    }
}
