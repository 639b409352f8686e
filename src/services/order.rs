use crate::{
    error::{AppError, Result},
    models::{marketplace::*, notification::*},
    services::{database::offset_for, Database, NotificationService, PaginatedResult, VendorService},
};
use sqlx::{Postgres, Transaction};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;
use validator::Validate;

#[derive(Clone)]
pub struct OrderService {
    db: Arc<Database>,
    vendor_service: VendorService,
    notification_service: NotificationService,
}

impl OrderService {
    pub async fn new(
        db: Arc<Database>,
        vendor_service: VendorService,
        notification_service: NotificationService,
    ) -> Result<Self> {
        Ok(Self {
            db,
            vendor_service,
            notification_service,
        })
    }

    /// 下单：锁定商品行、校验库存、扣减库存并写入订单，全部在一个事务内完成
    pub async fn create_order(&self, buyer_id: Uuid, request: CreateOrderRequest) -> Result<OrderWithItems> {
        request.validate()?;
        for item in &request.items {
            item.validate()?;
        }

        let lines = merge_order_lines(&request.items);
        let mut article_ids: Vec<Uuid> = lines.iter().map(|(id, _)| *id).collect();
        article_ids.sort();

        debug!("User {} ordering {} distinct articles", buyer_id, lines.len());

        let mut tx = self.db.begin().await?;

        // 按 id 顺序加锁，避免并发下单互相死锁
        let articles = sqlx::query_as::<_, Article>(
            "SELECT * FROM articles WHERE id = ANY($1) ORDER BY id FOR UPDATE",
        )
        .bind(&article_ids)
        .fetch_all(&mut *tx)
        .await?;

        let mut priced: Vec<(&Article, i32)> = Vec::with_capacity(lines.len());
        for (article_id, quantity) in &lines {
            let article = articles
                .iter()
                .find(|a| a.id == *article_id)
                .ok_or_else(|| AppError::NotFound(format!("Article {} not found", article_id)))?;

            if !article.is_active {
                return Err(AppError::BadRequest(format!(
                    "Article {} is no longer available",
                    article.name
                )));
            }
            if article.stock < *quantity {
                return Err(AppError::BadRequest(format!(
                    "Only {} of {} left in stock",
                    article.stock, article.name
                )));
            }
            priced.push((article, *quantity));
        }

        let total_cents = order_total(
            &priced
                .iter()
                .map(|(a, q)| (a.price_cents, *q))
                .collect::<Vec<_>>(),
        )?;

        let order = sqlx::query_as::<_, Order>(
            r#"
            INSERT INTO orders (id, buyer_id, status, total_cents)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(buyer_id)
        .bind(OrderStatus::Pending)
        .bind(total_cents)
        .fetch_one(&mut *tx)
        .await?;

        let mut items = Vec::with_capacity(priced.len());
        for (article, quantity) in &priced {
            let item = sqlx::query_as::<_, OrderItem>(
                r#"
                INSERT INTO order_items (id, order_id, article_id, vendor_id, quantity, unit_price_cents)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING *
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(order.id)
            .bind(article.id)
            .bind(article.vendor_id)
            .bind(*quantity)
            .bind(article.price_cents)
            .fetch_one(&mut *tx)
            .await?;

            sqlx::query("UPDATE articles SET stock = stock - $2, updated_at = NOW() WHERE id = $1")
                .bind(article.id)
                .bind(*quantity)
                .execute(&mut *tx)
                .await?;

            items.push(item);
        }

        tx.commit().await?;

        let vendor_ids: Vec<Uuid> = items.iter().map(|i| i.vendor_id).collect();
        self.notify_vendors(&vendor_ids, buyer_id, order.id, "placed a new order").await;

        info!("Order {} created by {} ({} cents)", order.id, buyer_id, order.total_cents);
        Ok(OrderWithItems { order, items })
    }

    pub(crate) async fn notify_vendors(&self, vendor_ids: &[Uuid], actor_id: Uuid, order_id: Uuid, message: &str) {
        let owners: Vec<Uuid> = match sqlx::query_scalar(
            "SELECT DISTINCT user_id FROM vendors WHERE id = ANY($1)",
        )
        .bind(vendor_ids)
        .fetch_all(self.db.pool())
        .await
        {
            Ok(owners) => owners,
            Err(e) => {
                warn!("Failed to resolve vendor owners for order {}: {}", order_id, e);
                return;
            }
        };

        for owner in owners {
            self.notification_service
                .notify(CreateNotificationRequest {
                    recipient_id: owner,
                    actor_id: Some(actor_id),
                    notification_type: NotificationType::Order,
                    order_id: Some(order_id),
                    message: message.to_string(),
                    ..Default::default()
                })
                .await;
        }
    }

    async fn load_items(&self, order_id: Uuid) -> Result<Vec<OrderItem>> {
        let items = sqlx::query_as::<_, OrderItem>(
            "SELECT * FROM order_items WHERE order_id = $1 ORDER BY id",
        )
        .bind(order_id)
        .fetch_all(self.db.pool())
        .await?;

        Ok(items)
    }

    pub async fn list_my_orders(&self, buyer_id: Uuid, page: i64, limit: i64) -> Result<PaginatedResult<Order>> {
        let orders = sqlx::query_as::<_, Order>(
            r#"
            SELECT * FROM orders WHERE buyer_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(buyer_id)
        .bind(limit)
        .bind(offset_for(page, limit))
        .fetch_all(self.db.pool())
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE buyer_id = $1")
            .bind(buyer_id)
            .fetch_one(self.db.pool())
            .await?;

        Ok(PaginatedResult::new(orders, total, page, limit))
    }

    pub async fn list_vendor_orders(&self, user_id: Uuid, page: i64, limit: i64) -> Result<PaginatedResult<Order>> {
        let vendor = self.vendor_service.require_vendor(user_id).await?;

        let orders = sqlx::query_as::<_, Order>(
            r#"
            SELECT o.* FROM orders o
            WHERE EXISTS (SELECT 1 FROM order_items i WHERE i.order_id = o.id AND i.vendor_id = $1)
            ORDER BY o.created_at DESC, o.id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(vendor.id)
        .bind(limit)
        .bind(offset_for(page, limit))
        .fetch_all(self.db.pool())
        .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(DISTINCT order_id) FROM order_items WHERE vendor_id = $1",
        )
        .bind(vendor.id)
        .fetch_one(self.db.pool())
        .await?;

        Ok(PaginatedResult::new(orders, total, page, limit))
    }

    /// 用户在订单中的身份：买家、商家，或两者皆是
    async fn actors_for(&self, order: &Order, items: &[OrderItem], user_id: Uuid) -> Result<Vec<OrderActor>> {
        let mut actors = Vec::new();
        if order.buyer_id == user_id {
            actors.push(OrderActor::Buyer);
        }
        if let Some(vendor) = self.vendor_service.find_by_user(user_id).await? {
            if items.iter().any(|i| i.vendor_id == vendor.id) {
                actors.push(OrderActor::Vendor);
            }
        }
        Ok(actors)
    }

    pub async fn get_order(&self, order_id: Uuid, user_id: Uuid) -> Result<OrderWithItems> {
        let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1")
            .bind(order_id)
            .fetch_optional(self.db.pool())
            .await?
            .ok_or_else(|| AppError::not_found("Order"))?;
        let items = self.load_items(order_id).await?;

        if self.actors_for(&order, &items, user_id).await?.is_empty() {
            return Err(AppError::forbidden("Not a participant of this order"));
        }

        Ok(OrderWithItems { order, items })
    }

    pub async fn update_order_status(
        &self,
        order_id: Uuid,
        user_id: Uuid,
        request: UpdateOrderStatusRequest,
    ) -> Result<Order> {
        let mut tx = self.db.begin().await?;

        let current = Self::lock_order(&mut tx, order_id).await?;
        let items = sqlx::query_as::<_, OrderItem>("SELECT * FROM order_items WHERE order_id = $1")
            .bind(order_id)
            .fetch_all(&mut *tx)
            .await?;

        let actors = self.actors_for(&current, &items, user_id).await?;
        if actors.is_empty() {
            return Err(AppError::forbidden("Not a participant of this order"));
        }

        let target = request.status;
        let actor = actors
            .iter()
            .copied()
            .find(|actor| current.status.can_transition(target, *actor))
            .ok_or_else(|| {
                AppError::BadRequest(format!(
                    "Cannot change order from {} to {}",
                    current.status, target
                ))
            })?;

        if target == OrderStatus::Cancelled {
            // 取消订单归还库存
            sqlx::query(
                r#"
                UPDATE articles a SET stock = a.stock + i.quantity, updated_at = NOW()
                FROM order_items i
                WHERE i.order_id = $1 AND a.id = i.article_id
                "#,
            )
            .bind(order_id)
            .execute(&mut *tx)
            .await?;
        }

        let order = sqlx::query_as::<_, Order>(
            "UPDATE orders SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(order_id)
        .bind(target)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        let message = format!("order is now {}", target);
        match actor {
            OrderActor::Buyer => {
                let vendor_ids: Vec<Uuid> = items.iter().map(|i| i.vendor_id).collect();
                self.notify_vendors(&vendor_ids, user_id, order_id, &message).await;
            }
            _ => {
                self.notification_service
                    .notify(CreateNotificationRequest {
                        recipient_id: order.buyer_id,
                        actor_id: Some(user_id),
                        notification_type: NotificationType::Order,
                        order_id: Some(order_id),
                        message,
                        ..Default::default()
                    })
                    .await;
            }
        }

        info!("Order {} moved {} -> {} by {:?}", order_id, current.status, target, actor);
        Ok(order)
    }

    pub(crate) async fn lock_order(tx: &mut Transaction<'static, Postgres>, order_id: Uuid) -> Result<Order> {
        sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1 FOR UPDATE")
            .bind(order_id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or_else(|| AppError::not_found("Order"))
    }
}
