use std::collections::HashMap;

use uuid::Uuid;

use crate::{
    error::AppError,
    models::{Coupon, NewOrder, OrderItem, OrderLineRequest, Product},
};

/// price_order
///
/// Turns checkout lines into a priced order. `products` must contain every product
/// referenced by `lines`; anything missing or archived is rejected, as is a line asking
/// for more than the stock on hand. The coupon discount is `subtotal * percent / 100`,
/// rounded down. Quantities or amounts that overflow are rejected as a bad request.
pub fn price_order(
    user_id: Uuid,
    lines: &[OrderLineRequest],
    products: &[Product],
    coupon: Option<&Coupon>,
) -> Result<NewOrder, AppError> {
    let catalog: HashMap<Uuid, &Product> = products.iter().map(|p| (p.id, p)).collect();

    // Repeated lines for one product are merged before the stock check.
    let mut quantities: Vec<(Uuid, i32)> = Vec::with_capacity(lines.len());
    for line in lines {
        match quantities.iter_mut().find(|(id, _)| *id == line.product_id) {
            Some((_, qty)) => {
                *qty = qty.checked_add(line.quantity).ok_or_else(too_large)?;
            }
            None => quantities.push((line.product_id, line.quantity)),
        }
    }

    let mut items = Vec::with_capacity(quantities.len());
    for (product_id, quantity) in quantities {
        let product = catalog
            .get(&product_id)
            .filter(|p| !p.is_archived)
            .ok_or_else(|| {
                AppError::bad_request(format!("product {product_id} is not available"))
            })?;

        if product.stock < quantity {
            return Err(AppError::bad_request(format!(
                "insufficient stock for {}",
                product.name
            )));
        }

        items.push(OrderItem {
            product_id,
            name: product.name.clone(),
            unit_price_cents: product.price_cents,
            quantity,
        });
    }

    let subtotal_cents = items.iter().try_fold(0i64, |total, item| {
        item.unit_price_cents
            .checked_mul(i64::from(item.quantity))
            .and_then(|line_total| total.checked_add(line_total))
            .ok_or_else(too_large)
    })?;

    let coupon = match coupon {
        Some(c) if !c.is_active => {
            return Err(AppError::bad_request(format!("coupon {} is not active", c.code)));
        }
        other => other,
    };

    let discount_cents = match coupon {
        Some(c) => {
            subtotal_cents
                .checked_mul(i64::from(c.discount_percent))
                .ok_or_else(too_large)?
                / 100
        }
        None => 0,
    };

    Ok(NewOrder {
        user_id,
        items,
        subtotal_cents,
        discount_cents,
        total_cents: subtotal_cents - discount_cents,
        coupon_code: coupon.map(|c| c.code.clone()),
    })
}

fn too_large() -> AppError {
    AppError::bad_request("order quantity too large")
}
