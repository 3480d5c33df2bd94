use tracing::{info, warn};

use super::{
    lifecycle::{NewOrder, OrderError, OrderStatus},
    repo::OrderRepo,
    repo_types::Order,
};
use crate::{auth::claims::Identity, error::AppError};

async fn load(orders: &dyn OrderRepo, id: i64) -> Result<Order, AppError> {
    orders
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {id}")))
}

fn ensure_can_access(caller: &Identity, order: &Order) -> Result<(), AppError> {
    if caller.is_admin() || order.user_id == caller.user_id {
        Ok(())
    } else {
        warn!(user_id = caller.user_id, order_id = order.id, "order access denied");
        Err(AppError::Forbidden("order belongs to another user".into()))
    }
}

/// Writes `next` if the order is still in `current`. Losing a race to another
/// writer surfaces as an invalid transition from whatever state won.
async fn transition(
    orders: &dyn OrderRepo,
    order: Order,
    next: OrderStatus,
    event: &'static str,
) -> Result<Order, AppError> {
    match orders.update_status(order.id, order.status, next).await? {
        Some(updated) => {
            info!(order_id = updated.id, from = %order.status, to = %next, event, "order transitioned");
            Ok(updated)
        }
        None => {
            let from = load(orders, order.id).await?.status;
            warn!(order_id = order.id, %from, event, "concurrent order update lost");
            Err(OrderError::InvalidTransition { from, event }.into())
        }
    }
}

/// The owner is always the caller; nothing in the payload can override it.
pub async fn place_order(
    orders: &dyn OrderRepo,
    caller: &Identity,
    product_id: i64,
    quantity: i32,
) -> Result<Order, AppError> {
    let new = NewOrder::validate(caller.user_id, product_id, quantity)?;
    let order = orders.create(&new).await?;
    info!(order_id = order.id, user_id = order.user_id, product_id, quantity, "order placed");
    Ok(order)
}

pub async fn list_orders(orders: &dyn OrderRepo, caller: &Identity) -> Result<Vec<Order>, AppError> {
    Ok(orders.find_by_owner(caller.user_id).await?)
}

pub async fn list_all_orders(orders: &dyn OrderRepo) -> Result<Vec<Order>, AppError> {
    Ok(orders.list_all().await?)
}

pub async fn get_order(
    orders: &dyn OrderRepo,
    caller: &Identity,
    id: i64,
) -> Result<Order, AppError> {
    let order = load(orders, id).await?;
    ensure_can_access(caller, &order)?;
    Ok(order)
}

pub async fn cancel_order(
    orders: &dyn OrderRepo,
    caller: &Identity,
    id: i64,
) -> Result<Order, AppError> {
    let order = load(orders, id).await?;
    ensure_can_access(caller, &order)?;
    let next = order.status.cancel()?;
    transition(orders, order, next, "cancel").await
}

/// `status` is the raw literal from the request; it is parsed before the
/// order is even loaded so a bad literal never touches storage.
pub async fn update_order_status(
    orders: &dyn OrderRepo,
    id: i64,
    status: &str,
) -> Result<Order, AppError> {
    let target: OrderStatus = status.parse()?;
    let order = load(orders, id).await?;
    let next = order.status.set_status(target)?;
    transition(orders, order, next, "set-status").await
}

/// Administrative removal, outside the state machine.
pub async fn delete_order(orders: &dyn OrderRepo, id: i64) -> Result<(), AppError> {
    if !orders.delete(id).await? {
        return Err(AppError::NotFound(format!("order {id}")));
    }
    info!(order_id = id, "order deleted");
    Ok(())
}
