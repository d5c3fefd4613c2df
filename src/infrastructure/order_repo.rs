use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::result::DatabaseErrorKind;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::order::{Order, User};
use crate::domain::ports::{OrderRepository, OrderStore, UnitOfWork, UserDirectory};
use crate::domain::status::OrderStatus;
use crate::schema::{order_items, orders, users};

use super::models::{NewOrderItemRow, NewUserRow, OrderChangeset, OrderItemRow, OrderRow, UserRow};

// ── Error conversions (infrastructure concern only) ──────────────────────────

impl From<diesel::result::Error> for DomainError {
    fn from(e: diesel::result::Error) -> Self {
        match e {
            diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                DomainError::Conflict(info.message().to_string())
            }
            other => DomainError::Internal(other.to_string()),
        }
    }
}

impl From<r2d2::Error> for DomainError {
    fn from(e: r2d2::Error) -> Self {
        DomainError::Internal(e.to_string())
    }
}

// ── Unit of work ─────────────────────────────────────────────────────────────

/// PostgreSQL-backed store. Each unit of work is one database transaction.
#[derive(Clone)]
pub struct DieselOrderRepository {
    pool: DbPool,
}

impl DieselOrderRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Inserts a user row so the name can act as a principal.
    pub fn register_user(&self, username: &str) -> Result<User, DomainError> {
        self.atomically(|store| store.create_user(username))
    }
}

impl UnitOfWork for DieselOrderRepository {
    fn atomically<T, F>(&self, work: F) -> Result<T, DomainError>
    where
        F: FnOnce(&mut dyn OrderStore) -> Result<T, DomainError>,
    {
        let mut conn = self.pool.get()?;
        conn.transaction::<_, DomainError, _>(|conn| {
            let mut store = PgOrderStore { conn: &mut **conn };
            work(&mut store)
        })
    }
}

// ── Transaction-scoped store ─────────────────────────────────────────────────

struct PgOrderStore<'c> {
    conn: &'c mut PgConnection,
}

impl PgOrderStore<'_> {
    /// Attaches owners and items to already loaded order rows, keeping row order.
    fn hydrate(&mut self, rows: Vec<(OrderRow, UserRow)>) -> Result<Vec<Order>, DomainError> {
        let (order_rows, user_rows): (Vec<OrderRow>, Vec<UserRow>) = rows.into_iter().unzip();

        let item_rows = OrderItemRow::belonging_to(&order_rows)
            .select(OrderItemRow::as_select())
            .order(order_items::position.asc())
            .load(self.conn)?;
        let grouped = item_rows.grouped_by(&order_rows);

        order_rows
            .into_iter()
            .zip(user_rows)
            .zip(grouped)
            .map(|((order, user), items)| {
                let status = order.status.parse::<OrderStatus>().map_err(|_| {
                    DomainError::Internal(format!(
                        "Order {} has unknown status '{}'",
                        order.order_number, order.status
                    ))
                })?;
                Ok(Order {
                    id: order.id,
                    order_number: order.order_number,
                    owner: user.into(),
                    items: items.into_iter().map(Into::into).collect(),
                    status,
                    total_amount: order.total_amount,
                    shipping_address: order.shipping_address,
                    billing_address: order.billing_address,
                    payment_method: order.payment_method,
                    notes: order.notes,
                    created_at: order.created_at,
                    updated_at: order.updated_at,
                    cancelled_at: order.cancelled_at,
                })
            })
            .collect()
    }

    fn first(&mut self, rows: Vec<(OrderRow, UserRow)>) -> Result<Option<Order>, DomainError> {
        Ok(self.hydrate(rows)?.into_iter().next())
    }
}

impl UserDirectory for PgOrderStore<'_> {
    fn find_user_by_username(&mut self, username: &str) -> Result<Option<User>, DomainError> {
        let row = users::table
            .filter(users::username.eq(username))
            .select(UserRow::as_select())
            .first(self.conn)
            .optional()?;
        Ok(row.map(User::from))
    }

    fn create_user(&mut self, username: &str) -> Result<User, DomainError> {
        let row = diesel::insert_into(users::table)
            .values(&NewUserRow {
                id: Uuid::new_v4(),
                username,
            })
            .returning(UserRow::as_returning())
            .get_result(self.conn)
            .map_err(|e| match DomainError::from(e) {
                DomainError::Conflict(_) => {
                    DomainError::Conflict(format!("Username '{}' is already taken", username))
                }
                other => other,
            })?;
        Ok(row.into())
    }
}

impl OrderRepository for PgOrderStore<'_> {
    fn save(&mut self, order: &Order) -> Result<(), DomainError> {
        let row = OrderChangeset::from(order);
        diesel::insert_into(orders::table)
            .values(&row)
            .on_conflict(orders::id)
            .do_update()
            .set(&row)
            .execute(self.conn)?;

        // Items have no life of their own: drop the old set, write the current one.
        diesel::delete(order_items::table.filter(order_items::order_id.eq(order.id)))
            .execute(self.conn)?;
        let items: Vec<NewOrderItemRow> = order
            .items
            .iter()
            .enumerate()
            .map(|(position, item)| NewOrderItemRow::new(order.id, position as i32, item))
            .collect();
        if !items.is_empty() {
            diesel::insert_into(order_items::table)
                .values(&items)
                .execute(self.conn)?;
        }
        Ok(())
    }

    fn find_by_id(&mut self, id: Uuid) -> Result<Option<Order>, DomainError> {
        let rows = orders::table
            .inner_join(users::table)
            .filter(orders::id.eq(id))
            .select((OrderRow::as_select(), UserRow::as_select()))
            .load(self.conn)?;
        self.first(rows)
    }

    fn find_by_id_for_update(&mut self, id: Uuid) -> Result<Option<Order>, DomainError> {
        // Row lock on the order only; the owning user row stays unlocked.
        let locked: Vec<Uuid> = orders::table
            .filter(orders::id.eq(id))
            .select(orders::id)
            .for_update()
            .load(self.conn)?;
        if locked.is_empty() {
            return Ok(None);
        }
        self.find_by_id(id)
    }

    fn find_by_user(&mut self, user_id: Uuid) -> Result<Vec<Order>, DomainError> {
        let rows = orders::table
            .inner_join(users::table)
            .filter(orders::user_id.eq(user_id))
            .order(orders::created_at.desc())
            .select((OrderRow::as_select(), UserRow::as_select()))
            .load(self.conn)?;
        self.hydrate(rows)
    }

    fn find_by_user_and_status(
        &mut self,
        user_id: Uuid,
        status: OrderStatus,
    ) -> Result<Vec<Order>, DomainError> {
        let rows = orders::table
            .inner_join(users::table)
            .filter(orders::user_id.eq(user_id))
            .filter(orders::status.eq(status.as_str()))
            .order(orders::created_at.desc())
            .select((OrderRow::as_select(), UserRow::as_select()))
            .load(self.conn)?;
        self.hydrate(rows)
    }

    fn find_by_order_number(&mut self, order_number: &str) -> Result<Option<Order>, DomainError> {
        let rows = orders::table
            .inner_join(users::table)
            .filter(orders::order_number.eq(order_number))
            .select((OrderRow::as_select(), UserRow::as_select()))
            .load(self.conn)?;
        self.first(rows)
    }

    fn exists_by_order_number(&mut self, order_number: &str) -> Result<bool, DomainError> {
        let exists = diesel::select(diesel::dsl::exists(
            orders::table.filter(orders::order_number.eq(order_number)),
        ))
        .get_result(self.conn)?;
        Ok(exists)
    }

    fn count_by_user(&mut self, user_id: Uuid) -> Result<i64, DomainError> {
        let count = orders::table
            .filter(orders::user_id.eq(user_id))
            .count()
            .get_result(self.conn)?;
        Ok(count)
    }
}
