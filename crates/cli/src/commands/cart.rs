//! Cart commands.

use std::io::Write;

use pocket_store::services::cart::CartError;
use pocket_store::{AppError, Storefront};
use pocket_store_core::ProductId;

use super::{CliError, write_line_item};

/// Print the cart with totals.
///
/// # Errors
///
/// Returns an error if output cannot be written.
pub fn show(storefront: &Storefront, out: &mut impl Write) -> Result<(), CliError> {
    let cart = storefront.cart();
    if cart.is_empty() {
        writeln!(out, "Your cart is empty.")?;
        return Ok(());
    }

    for item in cart.items() {
        write_line_item(out, item)?;
    }

    let summary = storefront.checkout_summary();
    writeln!(out)?;
    writeln!(out, "Items:    {}", cart.total_quantity())?;
    writeln!(out, "Subtotal: {}", summary.subtotal)?;
    writeln!(out, "Shipping: Free")?;
    writeln!(out, "Tax (7%): {}", summary.tax)?;
    writeln!(out, "Total:    {}", summary.total)?;
    Ok(())
}

/// Add one unit of a product.
///
/// # Errors
///
/// Returns an error if nobody is signed in or the product does not exist.
pub async fn add(
    storefront: &mut Storefront,
    id: ProductId,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let product = storefront.add_to_cart(id).await?;
    let quantity = storefront
        .cart()
        .cart()
        .line(id)
        .map_or(0, |line| line.quantity);
    writeln!(out, "Added {} (x{quantity} in cart).", product.title)?;
    Ok(())
}

/// Remove a product's line.
///
/// # Errors
///
/// Returns an error if nobody is signed in.
pub async fn remove(
    storefront: &mut Storefront,
    id: ProductId,
    out: &mut impl Write,
) -> Result<(), CliError> {
    require_owner(storefront)?;
    let Some(title) = storefront.cart().cart().line(id).map(|line| line.title.clone()) else {
        writeln!(out, "Product {id} is not in your cart.")?;
        return Ok(());
    };
    storefront.cart_mut().remove_item(id).await;
    writeln!(out, "Removed {title}.")?;
    Ok(())
}

/// Increase a line's quantity.
///
/// # Errors
///
/// Returns an error if nobody is signed in.
pub async fn increase(
    storefront: &mut Storefront,
    id: ProductId,
    out: &mut impl Write,
) -> Result<(), CliError> {
    require_owner(storefront)?;
    storefront.cart_mut().increase_quantity(id).await;
    write_quantity(storefront, id, out)
}

/// Decrease a line's quantity, removing it at zero.
///
/// # Errors
///
/// Returns an error if nobody is signed in.
pub async fn decrease(
    storefront: &mut Storefront,
    id: ProductId,
    out: &mut impl Write,
) -> Result<(), CliError> {
    require_owner(storefront)?;
    storefront.cart_mut().decrease_quantity(id).await;
    write_quantity(storefront, id, out)
}

/// Empty the cart.
///
/// # Errors
///
/// Returns an error if nobody is signed in.
pub async fn clear(storefront: &mut Storefront, out: &mut impl Write) -> Result<(), CliError> {
    require_owner(storefront)?;
    storefront.cart_mut().clear().await;
    writeln!(out, "Cart cleared.")?;
    Ok(())
}

fn require_owner(storefront: &Storefront) -> Result<(), CliError> {
    if storefront.cart().owner().is_none() {
        return Err(AppError::from(CartError::NoOwner).into());
    }
    Ok(())
}

fn write_quantity(
    storefront: &Storefront,
    id: ProductId,
    out: &mut impl Write,
) -> Result<(), CliError> {
    match storefront.cart().cart().line(id) {
        Some(line) => writeln!(out, "{}: quantity {}.", line.title, line.quantity)?,
        None => writeln!(out, "Product {id} is not in your cart.")?,
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::commands::test_support::{catalog, output, signed_in};

    #[tokio::test]
    async fn test_add_then_decrease_to_removal() {
        let catalog = catalog().await;
        let mut sf = signed_in(&catalog).await;

        let mut buf = Vec::new();
        add(&mut sf, ProductId::new(1), &mut buf).await.unwrap();
        add(&mut sf, ProductId::new(1), &mut buf).await.unwrap();
        decrease(&mut sf, ProductId::new(1), &mut buf).await.unwrap();
        decrease(&mut sf, ProductId::new(1), &mut buf).await.unwrap();

        assert_eq!(
            output(buf),
            "Added Backpack (x1 in cart).\n\
             Added Backpack (x2 in cart).\n\
             Backpack: quantity 1.\n\
             Product 1 is not in your cart.\n"
        );
        assert!(sf.cart().is_empty());
    }

    #[tokio::test]
    async fn test_show_lists_lines_and_totals() {
        let catalog = catalog().await;
        let mut sf = signed_in(&catalog).await;
        let mut buf = Vec::new();
        add(&mut sf, ProductId::new(1), &mut buf).await.unwrap();
        increase(&mut sf, ProductId::new(1), &mut buf).await.unwrap();

        let mut buf = Vec::new();
        show(&sf, &mut buf).unwrap();
        let text = output(buf);
        assert!(text.contains("Backpack"));
        assert!(text.contains("Items:    2\n"));
        assert!(text.contains("Subtotal: $219.90\n"));
        assert!(text.contains("Shipping: Free\n"));
    }

    #[tokio::test]
    async fn test_add_unknown_product_fails_without_changing_cart() {
        let catalog = catalog().await;
        let mut sf = signed_in(&catalog).await;

        let mut buf = Vec::new();
        let err = add(&mut sf, ProductId::new(404), &mut buf)
            .await
            .unwrap_err();
        assert!(matches!(err, CliError::App(AppError::Catalog(_))));
        assert!(buf.is_empty());
        assert!(sf.cart().is_empty());
    }
}
