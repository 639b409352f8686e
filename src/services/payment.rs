use crate::{
    error::{AppError, Result},
    models::marketplace::*,
    services::{Database, OrderService},
};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;
use validator::Validate;

/// 支付服务：支付成功与订单转为已支付在同一事务内提交
#[derive(Clone)]
pub struct PaymentService {
    db: Arc<Database>,
    order_service: OrderService,
}

impl PaymentService {
    pub async fn new(db: Arc<Database>, order_service: OrderService) -> Result<Self> {
        Ok(Self { db, order_service })
    }

    pub async fn create_payment(&self, payer_id: Uuid, request: CreatePaymentRequest) -> Result<Payment> {
        debug!("User {} starting payment for order {}", payer_id, request.order_id);

        let mut tx = self.db.begin().await?;

        let order = OrderService::lock_order(&mut tx, request.order_id).await?;
        if order.buyer_id != payer_id {
            return Err(AppError::forbidden("Only the buyer can pay for this order"));
        }
        if order.status != OrderStatus::Pending {
            return Err(AppError::BadRequest(format!(
                "Order is {} and cannot be paid",
                order.status
            )));
        }

        let payment = sqlx::query_as::<_, Payment>(
            r#"
            INSERT INTO payments (id, order_id, payer_id, amount_cents, method, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(order.id)
        .bind(payer_id)
        .bind(order.total_cents)
        .bind(request.method)
        .bind(PaymentStatus::Pending)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        info!("Payment {} created for order {}", payment.id, order.id);
        Ok(payment)
    }

    async fn lock_pending_payment(
        tx: &mut sqlx::Transaction<'static, sqlx::Postgres>,
        payment_id: Uuid,
        payer_id: Uuid,
    ) -> Result<Payment> {
        let payment = sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE id = $1 FOR UPDATE")
            .bind(payment_id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or_else(|| AppError::not_found("Payment"))?;

        if payment.payer_id != payer_id {
            return Err(AppError::forbidden("Payment belongs to another user"));
        }
        if payment.status != PaymentStatus::Pending {
            return Err(AppError::Conflict(format!("Payment already {}", payment.status)));
        }

        Ok(payment)
    }

    pub async fn confirm_payment(
        &self,
        payer_id: Uuid,
        payment_id: Uuid,
        request: ConfirmPaymentRequest,
    ) -> Result<Payment> {
        request.validate()?;

        let mut tx = self.db.begin().await?;

        let payment = Self::lock_pending_payment(&mut tx, payment_id, payer_id).await?;
        let order = OrderService::lock_order(&mut tx, payment.order_id).await?;

        if !order.status.can_transition(OrderStatus::Paid, OrderActor::Payment) {
            return Err(AppError::BadRequest(format!(
                "Order is {} and cannot be paid",
                order.status
            )));
        }

        let payment = sqlx::query_as::<_, Payment>(
            r#"
            UPDATE payments SET status = $2, provider_reference = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(payment_id)
        .bind(PaymentStatus::Succeeded)
        .bind(request.provider_reference.trim())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::conflict_on_unique(e, "Order already paid"))?;

        sqlx::query("UPDATE orders SET status = $2, updated_at = NOW() WHERE id = $1")
            .bind(order.id)
            .bind(OrderStatus::Paid)
            .execute(&mut *tx)
            .await?;

        let vendor_ids: Vec<Uuid> =
            sqlx::query_scalar("SELECT vendor_id FROM order_items WHERE order_id = $1")
                .bind(order.id)
                .fetch_all(&mut *tx)
                .await?;

        tx.commit().await?;

        self.order_service
            .notify_vendors(&vendor_ids, payer_id, order.id, "order has been paid")
            .await;

        info!("Payment {} succeeded, order {} is paid", payment_id, order.id);
        Ok(payment)
    }

    pub async fn fail_payment(&self, payer_id: Uuid, payment_id: Uuid) -> Result<Payment> {
        let mut tx = self.db.begin().await?;

        Self::lock_pending_payment(&mut tx, payment_id, payer_id).await?;

        let payment = sqlx::query_as::<_, Payment>(
            "UPDATE payments SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(payment_id)
        .bind(PaymentStatus::Failed)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        info!("Payment {} marked failed", payment_id);
        Ok(payment)
    }

    pub async fn get_payment(&self, payer_id: Uuid, payment_id: Uuid) -> Result<Payment> {
        let payment = sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE id = $1")
            .bind(payment_id)
            .fetch_optional(self.db.pool())
            .await?
            .ok_or_else(|| AppError::not_found("Payment"))?;

        if payment.payer_id != payer_id {
            return Err(AppError::forbidden("Payment belongs to another user"));
        }

        Ok(payment)
    }
}
