//! PostgreSQL store.
//!
//! Every trait method runs inside one database transaction. Rows that get
//! mutated are locked with `SELECT ... FOR UPDATE` first, and wallet counters
//! are written as increments (`x = x + $1`) so the row never goes through a
//! read-modify-write gap.
//!
//! Enum columns are plain `TEXT` and nested documents are `JSONB`; the private
//! `*Row` structs below convert between the table layout and the models.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, types::Json};
use uuid::Uuid;

use crate::{
    db::DbPool,
    error::AppError,
    models::{
        api_key::ApiKey,
        order::{LineItem, Order, OrderStatus, SellerGroup, ShippingAddress, StatusHistory},
        seller::{BankDetails, SellerProfile},
        seller_order::SellerOrder,
        wallet::{LedgerPosting, NewWalletTransaction, Wallet, WalletTransaction},
        withdrawal::{CommissionBreakdown, SellerSnapshot, WithdrawalFilter, WithdrawalRequest},
    },
    store::{
        ActorStore, LedgerMutator, Mutator, OrderStore, SellerStore, WalletStore,
        WithdrawalStore,
    },
};

pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: String,
    buyer_id: String,
    items: Json<Vec<LineItem>>,
    shipping_address: Json<ShippingAddress>,
    total: Decimal,
    payment_mode: String,
    payment_status: String,
    status: String,
    is_multi_seller: bool,
    seller_id: Option<String>,
    seller_ids: Vec<String>,
    seller_groups: Json<BTreeMap<String, SellerGroup>>,
    status_history: Json<StatusHistory>,
    cancellation_reason: Option<String>,
    note: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = AppError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        Ok(Order {
            id: row.id,
            buyer_id: row.buyer_id,
            items: row.items.0,
            shipping_address: row.shipping_address.0,
            total: row.total,
            payment_mode: row.payment_mode.parse()?,
            payment_status: row.payment_status.parse()?,
            status: row.status.parse()?,
            is_multi_seller: row.is_multi_seller,
            seller_id: row.seller_id,
            seller_ids: row.seller_ids,
            seller_groups: row.seller_groups.0,
            status_history: row.status_history.0,
            cancellation_reason: row.cancellation_reason,
            note: row.note,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct SellerOrderRow {
    seller_id: String,
    order_id: String,
    buyer_id: String,
    items: Json<Vec<LineItem>>,
    seller_total: Option<Decimal>,
    payment_mode: String,
    payment_status: String,
    status: String,
    status_history: Json<StatusHistory>,
    cancellation_reason: Option<String>,
    note: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SellerOrderRow> for SellerOrder {
    type Error = AppError;

    fn try_from(row: SellerOrderRow) -> Result<Self, Self::Error> {
        Ok(SellerOrder {
            order_id: row.order_id,
            seller_id: row.seller_id,
            buyer_id: row.buyer_id,
            items: row.items.0,
            seller_total: row.seller_total,
            payment_mode: row.payment_mode.parse()?,
            payment_status: row.payment_status.parse()?,
            status: row.status.parse()?,
            status_history: row.status_history.0,
            cancellation_reason: row.cancellation_reason,
            note: row.note,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct WalletTransactionRow {
    id: Uuid,
    seller_id: String,
    transaction_type: String,
    amount: Decimal,
    net_amount: Option<Decimal>,
    reference_id: Option<String>,
    description: Option<String>,
    idempotency_key: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<WalletTransactionRow> for WalletTransaction {
    type Error = AppError;

    fn try_from(row: WalletTransactionRow) -> Result<Self, Self::Error> {
        Ok(WalletTransaction {
            id: row.id,
            seller_id: row.seller_id,
            transaction_type: row.transaction_type.parse()?,
            amount: row.amount,
            net_amount: row.net_amount,
            reference_id: row.reference_id,
            description: row.description,
            idempotency_key: row.idempotency_key,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct WithdrawalRow {
    id: Uuid,
    seller_id: String,
    breakdown: Json<CommissionBreakdown>,
    bank_details: Json<BankDetails>,
    seller_snapshot: Json<SellerSnapshot>,
    status: String,
    wallet_debited: bool,
    rejection_reason: Option<String>,
    admin_note: Option<String>,
    payout_reference: Option<String>,
    processed_by: Option<String>,
    processed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<WithdrawalRow> for WithdrawalRequest {
    type Error = AppError;

    fn try_from(row: WithdrawalRow) -> Result<Self, Self::Error> {
        Ok(WithdrawalRequest {
            id: row.id,
            seller_id: row.seller_id,
            breakdown: row.breakdown.0,
            bank_details: row.bank_details.0,
            seller: row.seller_snapshot.0,
            status: row.status.parse()?,
            wallet_debited: row.wallet_debited,
            rejection_reason: row.rejection_reason,
            admin_note: row.admin_note,
            payout_reference: row.payout_reference,
            processed_by: row.processed_by,
            processed_at: row.processed_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct SellerRow {
    id: String,
    display_name: String,
    email: Option<String>,
    phone: Option<String>,
    store_name: Option<String>,
    commission: Option<Decimal>,
    bank_details: Option<Json<BankDetails>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<SellerRow> for SellerProfile {
    fn from(row: SellerRow) -> Self {
        SellerProfile {
            id: row.id,
            display_name: row.display_name,
            email: row.email,
            phone: row.phone,
            store_name: row.store_name,
            commission: row.commission,
            bank_details: row.bank_details.map(|json| json.0),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ApiKeyRow {
    key_hash: String,
    actor_id: String,
    role: String,
    seller_id: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<ApiKeyRow> for ApiKey {
    type Error = AppError;

    fn try_from(row: ApiKeyRow) -> Result<Self, Self::Error> {
        Ok(ApiKey {
            key_hash: row.key_hash,
            actor_id: row.actor_id,
            role: row.role.parse()?,
            seller_id: row.seller_id,
            is_active: row.is_active,
            created_at: row.created_at,
        })
    }
}

/// Rewrites every mutable column of an order row.
async fn write_order(conn: &mut PgConnection, order: &Order) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE orders
        SET items = $1,
            total = $2,
            payment_status = $3,
            status = $4,
            seller_groups = $5,
            status_history = $6,
            cancellation_reason = $7,
            note = $8,
            updated_at = $9
        WHERE id = $10
        "#,
    )
    .bind(Json(&order.items))
    .bind(order.total)
    .bind(order.payment_status.as_str())
    .bind(order.status.as_str())
    .bind(Json(&order.seller_groups))
    .bind(Json(&order.status_history))
    .bind(&order.cancellation_reason)
    .bind(&order.note)
    .bind(order.updated_at)
    .bind(&order.id)
    .execute(conn)
    .await?;
    Ok(())
}

async fn write_seller_order(conn: &mut PgConnection, copy: &SellerOrder) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE seller_orders
        SET items = $1,
            seller_total = $2,
            payment_status = $3,
            status = $4,
            status_history = $5,
            cancellation_reason = $6,
            note = $7,
            updated_at = $8
        WHERE seller_id = $9 AND order_id = $10
        "#,
    )
    .bind(Json(&copy.items))
    .bind(copy.seller_total)
    .bind(copy.payment_status.as_str())
    .bind(copy.status.as_str())
    .bind(Json(&copy.status_history))
    .bind(&copy.cancellation_reason)
    .bind(&copy.note)
    .bind(copy.updated_at)
    .bind(&copy.seller_id)
    .bind(&copy.order_id)
    .execute(conn)
    .await?;
    Ok(())
}

async fn write_withdrawal(
    conn: &mut PgConnection,
    request: &WithdrawalRequest,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE withdrawal_requests
        SET status = $1,
            wallet_debited = $2,
            rejection_reason = $3,
            admin_note = $4,
            payout_reference = $5,
            processed_by = $6,
            processed_at = $7,
            updated_at = $8
        WHERE id = $9
        "#,
    )
    .bind(request.status.as_str())
    .bind(request.wallet_debited)
    .bind(&request.rejection_reason)
    .bind(&request.admin_note)
    .bind(&request.payout_reference)
    .bind(&request.processed_by)
    .bind(request.processed_at)
    .bind(request.updated_at)
    .bind(request.id)
    .execute(conn)
    .await?;
    Ok(())
}

/// Posts `entry` on the caller's transaction. A duplicate idempotency key
/// writes nothing beyond the lazily created wallet row.
async fn post_entry(
    conn: &mut PgConnection,
    entry: NewWalletTransaction,
) -> Result<LedgerPosting, AppError> {
    // Lazily create the all-zero wallet, then lock it.
    sqlx::query(
        r#"
        INSERT INTO seller_wallets (seller_id, updated_at)
        VALUES ($1, $2)
        ON CONFLICT (seller_id) DO NOTHING
        "#,
    )
    .bind(&entry.seller_id)
    .bind(entry.created_at)
    .execute(&mut *conn)
    .await?;

    let wallet = sqlx::query_as::<_, Wallet>(
        "SELECT * FROM seller_wallets WHERE seller_id = $1 FOR UPDATE",
    )
    .bind(&entry.seller_id)
    .fetch_one(&mut *conn)
    .await?;

    if let Some(key) = &entry.idempotency_key {
        let existing = sqlx::query_as::<_, WalletTransactionRow>(
            "SELECT * FROM wallet_transactions WHERE seller_id = $1 AND idempotency_key = $2",
        )
        .bind(&entry.seller_id)
        .bind(key)
        .fetch_optional(&mut *conn)
        .await?;

        if let Some(row) = existing {
            return Ok(LedgerPosting {
                wallet,
                transaction: row.try_into()?,
                duplicate: true,
            });
        }
    }

    // Validates the balance against the locked row before touching it.
    wallet.clone().apply(&entry)?;

    let delta = entry.delta();
    let wallet = sqlx::query_as::<_, Wallet>(
        r#"
        UPDATE seller_wallets
        SET total_earnings = total_earnings + $1,
            total_withdrawn = total_withdrawn + $2,
            available_balance = available_balance + $3,
            lifetime_revenue = lifetime_revenue + $4,
            updated_at = $5
        WHERE seller_id = $6
        RETURNING *
        "#,
    )
    .bind(delta.total_earnings)
    .bind(delta.total_withdrawn)
    .bind(delta.available_balance)
    .bind(delta.lifetime_revenue)
    .bind(entry.created_at)
    .bind(&entry.seller_id)
    .fetch_one(&mut *conn)
    .await?;

    let transaction = sqlx::query_as::<_, WalletTransactionRow>(
        r#"
        INSERT INTO wallet_transactions (
            id, seller_id, transaction_type, amount, net_amount,
            reference_id, description, idempotency_key, created_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&entry.seller_id)
    .bind(entry.transaction_type.as_str())
    .bind(entry.amount)
    .bind(entry.net_amount)
    .bind(&entry.reference_id)
    .bind(&entry.description)
    .bind(&entry.idempotency_key)
    .bind(entry.created_at)
    .fetch_one(&mut *conn)
    .await?;

    Ok(LedgerPosting {
        wallet,
        transaction: transaction.try_into()?,
        duplicate: false,
    })
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[async_trait]
impl OrderStore for PgStore {
    async fn insert_order(
        &self,
        order: &Order,
        seller_orders: &[SellerOrder],
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO orders (
                id, buyer_id, items, shipping_address, total,
                payment_mode, payment_status, status,
                is_multi_seller, seller_id, seller_ids, seller_groups, status_history,
                cancellation_reason, note, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            "#,
        )
        .bind(&order.id)
        .bind(&order.buyer_id)
        .bind(Json(&order.items))
        .bind(Json(&order.shipping_address))
        .bind(order.total)
        .bind(order.payment_mode.as_str())
        .bind(order.payment_status.as_str())
        .bind(order.status.as_str())
        .bind(order.is_multi_seller)
        .bind(&order.seller_id)
        .bind(&order.seller_ids)
        .bind(Json(&order.seller_groups))
        .bind(Json(&order.status_history))
        .bind(&order.cancellation_reason)
        .bind(&order.note)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await;

        if let Err(err) = inserted {
            if is_unique_violation(&err) {
                return Err(AppError::invalid_state(format!(
                    "Order {} already exists",
                    order.id
                )));
            }
            return Err(err.into());
        }

        for copy in seller_orders {
            sqlx::query(
                r#"
                INSERT INTO seller_orders (
                    seller_id, order_id, buyer_id, items, seller_total,
                    payment_mode, payment_status, status, status_history,
                    cancellation_reason, note, created_at, updated_at
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
                "#,
            )
            .bind(&copy.seller_id)
            .bind(&copy.order_id)
            .bind(&copy.buyer_id)
            .bind(Json(&copy.items))
            .bind(copy.seller_total)
            .bind(copy.payment_mode.as_str())
            .bind(copy.payment_status.as_str())
            .bind(copy.status.as_str())
            .bind(Json(&copy.status_history))
            .bind(&copy.cancellation_reason)
            .bind(&copy.note)
            .bind(copy.created_at)
            .bind(copy.updated_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn fetch_order(&self, order_id: &str) -> Result<Option<Order>, AppError> {
        sqlx::query_as::<_, OrderRow>("SELECT * FROM orders WHERE id = $1")
            .bind(order_id)
            .fetch_optional(&self.pool)
            .await?
            .map(Order::try_from)
            .transpose()
    }

    async fn modify_order(
        &self,
        order_id: &str,
        mutate: &mut Mutator<'_, Order>,
    ) -> Result<Option<Order>, AppError> {
        let mut tx = self.pool.begin().await?;

        let Some(row) =
            sqlx::query_as::<_, OrderRow>("SELECT * FROM orders WHERE id = $1 FOR UPDATE")
                .bind(order_id)
                .fetch_optional(&mut *tx)
                .await?
        else {
            return Ok(None);
        };

        let mut order = Order::try_from(row)?;
        mutate(&mut order)?;
        write_order(&mut *tx, &order).await?;

        tx.commit().await?;
        Ok(Some(order))
    }

    async fn fetch_seller_order(
        &self,
        seller_id: &str,
        order_id: &str,
    ) -> Result<Option<SellerOrder>, AppError> {
        sqlx::query_as::<_, SellerOrderRow>(
            "SELECT * FROM seller_orders WHERE seller_id = $1 AND order_id = $2",
        )
        .bind(seller_id)
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?
        .map(SellerOrder::try_from)
        .transpose()
    }

    async fn modify_seller_order(
        &self,
        seller_id: &str,
        order_id: &str,
        mutate: &mut Mutator<'_, SellerOrder>,
    ) -> Result<Option<SellerOrder>, AppError> {
        let mut tx = self.pool.begin().await?;

        let Some(row) = sqlx::query_as::<_, SellerOrderRow>(
            "SELECT * FROM seller_orders WHERE seller_id = $1 AND order_id = $2 FOR UPDATE",
        )
        .bind(seller_id)
        .bind(order_id)
        .fetch_optional(&mut *tx)
        .await?
        else {
            return Ok(None);
        };

        let mut copy = SellerOrder::try_from(row)?;
        mutate(&mut copy)?;
        write_seller_order(&mut *tx, &copy).await?;

        tx.commit().await?;
        Ok(Some(copy))
    }

    async fn list_seller_orders(
        &self,
        seller_id: &str,
        status: Option<OrderStatus>,
    ) -> Result<Vec<SellerOrder>, AppError> {
        sqlx::query_as::<_, SellerOrderRow>(
            r#"
            SELECT * FROM seller_orders
            WHERE seller_id = $1
              AND ($2::text IS NULL OR status = $2)
            ORDER BY created_at DESC
            "#,
        )
        .bind(seller_id)
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(SellerOrder::try_from)
        .collect()
    }
}

#[async_trait]
impl WalletStore for PgStore {
    async fn fetch_wallet(&self, seller_id: &str) -> Result<Option<Wallet>, AppError> {
        let wallet = sqlx::query_as::<_, Wallet>("SELECT * FROM seller_wallets WHERE seller_id = $1")
            .bind(seller_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(wallet)
    }

    async fn post_ledger_entry(
        &self,
        entry: NewWalletTransaction,
    ) -> Result<LedgerPosting, AppError> {
        let mut tx = self.pool.begin().await?;
        let posting = post_entry(&mut *tx, entry).await?;
        tx.commit().await?;
        Ok(posting)
    }

    async fn list_wallet_transactions(
        &self,
        seller_id: &str,
    ) -> Result<Vec<WalletTransaction>, AppError> {
        sqlx::query_as::<_, WalletTransactionRow>(
            "SELECT * FROM wallet_transactions WHERE seller_id = $1 ORDER BY created_at DESC",
        )
        .bind(seller_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(WalletTransaction::try_from)
        .collect()
    }
}

#[async_trait]
impl WithdrawalStore for PgStore {
    async fn insert_withdrawal(&self, request: &WithdrawalRequest) -> Result<(), AppError> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO withdrawal_requests (
                id, seller_id, amount, breakdown, bank_details, seller_snapshot,
                status, wallet_debited, rejection_reason, admin_note, payout_reference,
                processed_by, processed_at, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(request.id)
        .bind(&request.seller_id)
        .bind(request.amount())
        .bind(Json(&request.breakdown))
        .bind(Json(&request.bank_details))
        .bind(Json(&request.seller))
        .bind(request.status.as_str())
        .bind(request.wallet_debited)
        .bind(&request.rejection_reason)
        .bind(&request.admin_note)
        .bind(&request.payout_reference)
        .bind(&request.processed_by)
        .bind(request.processed_at)
        .bind(request.created_at)
        .bind(request.updated_at)
        .execute(&self.pool)
        .await;

        match inserted {
            Ok(_) => Ok(()),
            // uniq_withdrawal_pending_per_seller
            Err(err) if is_unique_violation(&err) => Err(AppError::invalid_state(
                "Seller already has a pending withdrawal request",
            )),
            Err(err) => Err(err.into()),
        }
    }

    async fn fetch_withdrawal(&self, id: Uuid) -> Result<Option<WithdrawalRequest>, AppError> {
        sqlx::query_as::<_, WithdrawalRow>("SELECT * FROM withdrawal_requests WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(WithdrawalRequest::try_from)
            .transpose()
    }

    async fn find_pending_withdrawal(
        &self,
        seller_id: &str,
    ) -> Result<Option<WithdrawalRequest>, AppError> {
        sqlx::query_as::<_, WithdrawalRow>(
            "SELECT * FROM withdrawal_requests WHERE seller_id = $1 AND status = 'pending'",
        )
        .bind(seller_id)
        .fetch_optional(&self.pool)
        .await?
        .map(WithdrawalRequest::try_from)
        .transpose()
    }

    async fn list_withdrawals(
        &self,
        filter: &WithdrawalFilter,
    ) -> Result<Vec<WithdrawalRequest>, AppError> {
        sqlx::query_as::<_, WithdrawalRow>(
            r#"
            SELECT * FROM withdrawal_requests
            WHERE ($1::text IS NULL OR seller_id = $1)
              AND ($2::text IS NULL OR status = $2)
            ORDER BY created_at DESC
            "#,
        )
        .bind(filter.seller_id.as_deref())
        .bind(filter.status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(WithdrawalRequest::try_from)
        .collect()
    }

    async fn modify_withdrawal(
        &self,
        id: Uuid,
        mutate: &mut Mutator<'_, WithdrawalRequest>,
    ) -> Result<Option<WithdrawalRequest>, AppError> {
        let mut tx = self.pool.begin().await?;

        let Some(row) = sqlx::query_as::<_, WithdrawalRow>(
            "SELECT * FROM withdrawal_requests WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        else {
            return Ok(None);
        };

        let mut request = WithdrawalRequest::try_from(row)?;
        mutate(&mut request)?;
        write_withdrawal(&mut *tx, &request).await?;

        tx.commit().await?;
        Ok(Some(request))
    }

    async fn modify_withdrawal_with_ledger(
        &self,
        id: Uuid,
        mutate: &mut LedgerMutator<'_, WithdrawalRequest>,
    ) -> Result<Option<(WithdrawalRequest, Option<LedgerPosting>)>, AppError> {
        let mut tx = self.pool.begin().await?;

        // Request row first, then the wallet row inside post_entry.
        let Some(row) = sqlx::query_as::<_, WithdrawalRow>(
            "SELECT * FROM withdrawal_requests WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        else {
            return Ok(None);
        };

        let mut request = WithdrawalRequest::try_from(row)?;
        let posting = match mutate(&mut request)? {
            Some(entry) => Some(post_entry(&mut *tx, entry).await?),
            None => None,
        };
        write_withdrawal(&mut *tx, &request).await?;

        tx.commit().await?;
        Ok(Some((request, posting)))
    }
}

#[async_trait]
impl SellerStore for PgStore {
    async fn fetch_seller(&self, seller_id: &str) -> Result<Option<SellerProfile>, AppError> {
        let row = sqlx::query_as::<_, SellerRow>("SELECT * FROM sellers WHERE id = $1")
            .bind(seller_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(SellerProfile::from))
    }

    async fn upsert_seller(&self, profile: &SellerProfile) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO sellers (
                id, display_name, email, phone, store_name,
                commission, bank_details, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (id) DO UPDATE
            SET display_name = EXCLUDED.display_name,
                email = EXCLUDED.email,
                phone = EXCLUDED.phone,
                store_name = EXCLUDED.store_name,
                commission = EXCLUDED.commission,
                bank_details = EXCLUDED.bank_details,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(&profile.id)
        .bind(&profile.display_name)
        .bind(&profile.email)
        .bind(&profile.phone)
        .bind(&profile.store_name)
        .bind(profile.commission)
        .bind(profile.bank_details.as_ref().map(Json))
        .bind(profile.created_at)
        .bind(profile.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl ActorStore for PgStore {
    async fn find_api_key(&self, key_hash: &str) -> Result<Option<ApiKey>, AppError> {
        sqlx::query_as::<_, ApiKeyRow>(
            r#"
            SELECT key_hash, actor_id, role, seller_id, is_active, created_at
            FROM api_keys
            WHERE key_hash = $1 AND is_active = true
            "#,
        )
        .bind(key_hash)
        .fetch_optional(&self.pool)
        .await?
        .map(ApiKey::try_from)
        .transpose()
    }

    async fn insert_api_key(&self, key: &ApiKey) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO api_keys (key_hash, actor_id, role, seller_id, is_active, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (key_hash) DO UPDATE
            SET actor_id = EXCLUDED.actor_id,
                role = EXCLUDED.role,
                seller_id = EXCLUDED.seller_id,
                is_active = EXCLUDED.is_active
            "#,
        )
        .bind(&key.key_hash)
        .bind(&key.actor_id)
        .bind(key.role.as_str())
        .bind(&key.seller_id)
        .bind(key.is_active)
        .bind(key.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
