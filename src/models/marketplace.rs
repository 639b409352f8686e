use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, Result};

// ---------- 商家 ----------

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Vendor {
    pub id: Uuid,
    pub user_id: Uuid,
    pub shop_name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterVendorRequest {
    #[validate(length(min = 2, max = 80))]
    pub shop_name: String,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
}

// ---------- 商品 ----------

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Article {
    pub id: Uuid,
    pub vendor_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub stock: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateArticleRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    #[validate(range(min = 0))]
    pub price_cents: i64,
    #[validate(range(min = 0))]
    pub stock: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateArticleRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: Option<String>,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    #[validate(range(min = 0))]
    pub price_cents: Option<i64>,
    #[validate(range(min = 0))]
    pub stock: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArticleQuery {
    pub vendor_id: Option<Uuid>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

// ---------- 订单 ----------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Paid,
    Shipped,
    Delivered,
    Cancelled,
}

text_enum!(OrderStatus, "order status", {
    Pending => "pending",
    Paid => "paid",
    Shipped => "shipped",
    Delivered => "delivered",
    Cancelled => "cancelled",
});

/// 订单状态变更的发起方
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderActor {
    Buyer,
    Vendor,
    Payment,
}

impl OrderStatus {
    pub fn can_transition(self, to: OrderStatus, actor: OrderActor) -> bool {
        use OrderActor::*;
        use OrderStatus::*;

        matches!(
            (self, to, actor),
            (Pending, Cancelled, Buyer)
                | (Pending, Paid, Payment)
                | (Paid, Shipped, Vendor)
                | (Shipped, Delivered, Buyer)
                | (Shipped, Delivered, Vendor)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Order {
    pub id: Uuid,
    pub buyer_id: Uuid,
    pub status: OrderStatus,
    pub total_cents: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub article_id: Uuid,
    pub vendor_id: Uuid,
    pub quantity: i32,
    pub unit_price_cents: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct OrderItemRequest {
    pub article_id: Uuid,
    #[validate(range(min = 1, max = 1000))]
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateOrderRequest {
    #[validate(length(min = 1, max = 50))]
    pub items: Vec<OrderItemRequest>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

/// 合并同一商品的多行下单数量，保持首次出现的顺序
pub fn merge_order_lines(items: &[OrderItemRequest]) -> Vec<(Uuid, i32)> {
    let mut merged: Vec<(Uuid, i32)> = Vec::new();
    for item in items {
        match merged.iter_mut().find(|(id, _)| *id == item.article_id) {
            Some((_, quantity)) => *quantity += item.quantity,
            None => merged.push((item.article_id, item.quantity)),
        }
    }
    merged
}

/// 计算订单总额（分），溢出时报错
pub fn order_total(lines: &[(i64, i32)]) -> Result<i64> {
    lines.iter().try_fold(0i64, |total, (unit_price, quantity)| {
        unit_price
            .checked_mul(i64::from(*quantity))
            .and_then(|line| total.checked_add(line))
            .ok_or_else(|| AppError::validation("Order total is too large"))
    })
}

// ---------- 支付 ----------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Card,
    Wallet,
    CashOnDelivery,
}

text_enum!(PaymentMethod, "payment method", {
    Card => "card",
    Wallet => "wallet",
    CashOnDelivery => "cash_on_delivery",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Succeeded,
    Failed,
}

text_enum!(PaymentStatus, "payment status", {
    Pending => "pending",
    Succeeded => "succeeded",
    Failed => "failed",
});

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Payment {
    pub id: Uuid,
    pub order_id: Uuid,
    pub payer_id: Uuid,
    pub amount_cents: i64,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub provider_reference: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePaymentRequest {
    pub order_id: Uuid,
    pub method: PaymentMethod,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ConfirmPaymentRequest {
    #[validate(length(min = 1, max = 200))]
    pub provider_reference: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_transitions() {
        use OrderActor::*;
        use OrderStatus::*;

        assert!(Pending.can_transition(Cancelled, Buyer));
        assert!(!Pending.can_transition(Cancelled, Vendor));
        assert!(Pending.can_transition(Paid, Payment));
        assert!(!Pending.can_transition(Paid, Buyer));
        assert!(Paid.can_transition(Shipped, Vendor));
        assert!(!Paid.can_transition(Shipped, Buyer));
        assert!(Shipped.can_transition(Delivered, Buyer));
        assert!(!Delivered.can_transition(Cancelled, Buyer));
        assert!(!Paid.can_transition(Cancelled, Buyer));
    }

    #[test]
    fn test_status_text_parsing() {
        assert_eq!("shipped".parse::<OrderStatus>().unwrap(), OrderStatus::Shipped);
        assert_eq!(OrderStatus::Cancelled.to_string(), "cancelled");
        assert_eq!(
            "cash_on_delivery".parse::<PaymentMethod>().unwrap(),
            PaymentMethod::CashOnDelivery
        );

        let err = "refunded".parse::<PaymentStatus>().unwrap_err();
        assert_eq!(err.to_string(), "unknown payment status: refunded");
    }

    #[test]
    fn test_terminal_states() {
        assert!(OrderStatus::Delivered.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(!OrderStatus::Shipped.is_terminal());
    }

    #[test]
    fn test_merge_order_lines() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let items = vec![
            OrderItemRequest { article_id: a, quantity: 1 },
            OrderItemRequest { article_id: b, quantity: 2 },
            OrderItemRequest { article_id: a, quantity: 3 },
        ];

        assert_eq!(merge_order_lines(&items), vec![(a, 4), (b, 2)]);
    }

    #[test]
    fn test_order_total() {
        assert_eq!(order_total(&[(1250, 2), (99, 3)]).unwrap(), 2797);
        assert_eq!(order_total(&[]).unwrap(), 0);
        assert!(order_total(&[(i64::MAX, 2)]).is_err());
    }

    #[test]
    fn test_payment_method_text() {
        assert_eq!(PaymentMethod::CashOnDelivery.as_str(), "cash_on_delivery");
        assert_eq!("wallet".parse::<PaymentMethod>().unwrap(), PaymentMethod::Wallet);
    }
}
