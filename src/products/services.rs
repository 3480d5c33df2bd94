use tracing::info;

use super::{
    repo::ProductRepo,
    repo_types::{NewProduct, Product, ProductChanges},
};
use crate::error::AppError;

fn check_name(name: &str) -> Result<(), AppError> {
    if name.trim().is_empty() {
        return Err(AppError::Validation("product name is required".into()));
    }
    Ok(())
}

fn check_price(price: f64) -> Result<(), AppError> {
    // NaN fails this too
    if !(price > 0.0) || !price.is_finite() {
        return Err(AppError::Validation(
            "product price must be greater than zero".into(),
        ));
    }
    Ok(())
}

fn check_stock(stock: i32) -> Result<(), AppError> {
    if stock < 0 {
        return Err(AppError::Validation("product stock cannot be negative".into()));
    }
    Ok(())
}

pub async fn create_product(
    products: &dyn ProductRepo,
    new: NewProduct,
) -> Result<Product, AppError> {
    check_name(&new.name)?;
    check_price(new.price)?;
    check_stock(new.stock)?;
    let product = products.create(new).await?;
    info!(product_id = product.id, "product created");
    Ok(product)
}

pub async fn list_products(products: &dyn ProductRepo) -> Result<Vec<Product>, AppError> {
    Ok(products.list().await?)
}

pub async fn get_product(products: &dyn ProductRepo, id: i64) -> Result<Product, AppError> {
    products
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))
}

/// Only the fields that are present get validated and written.
pub async fn update_product(
    products: &dyn ProductRepo,
    id: i64,
    changes: ProductChanges,
) -> Result<Product, AppError> {
    if let Some(name) = &changes.name {
        check_name(name)?;
    }
    if let Some(price) = changes.price {
        check_price(price)?;
    }
    if let Some(stock) = changes.stock {
        check_stock(stock)?;
    }
    let product = products
        .update(id, changes)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;
    info!(product_id = id, "product updated");
    Ok(product)
}

pub async fn delete_product(products: &dyn ProductRepo, id: i64) -> Result<(), AppError> {
    if !products.delete(id).await? {
        return Err(AppError::NotFound(format!("product {id}")));
    }
    info!(product_id = id, "product deleted");
    Ok(())
}
