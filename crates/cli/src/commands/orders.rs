//! Checkout and order commands.

use std::io::Write;

use clap::Args;

use pocket_store::models::ShippingAddress;
use pocket_store::{AppError, Storefront};
use pocket_store_core::{OrderId, OrderStatus};

use super::{CliError, write_line_item, write_order};

/// Shipping details collected at checkout.
#[derive(Debug, Args)]
pub struct CheckoutArgs {
    /// Recipient's full name
    #[arg(long)]
    pub full_name: String,

    /// Street address
    #[arg(long)]
    pub address_line1: String,

    /// Apartment, suite, etc.
    #[arg(long)]
    pub address_line2: Option<String>,

    /// City
    #[arg(long)]
    pub city: String,

    /// State or province
    #[arg(long)]
    pub state: String,

    /// ZIP or postal code
    #[arg(long)]
    pub zip_code: String,

    /// Country
    #[arg(long)]
    pub country: String,

    /// Contact phone number
    #[arg(long)]
    pub phone_number: String,
}

impl From<CheckoutArgs> for ShippingAddress {
    fn from(args: CheckoutArgs) -> Self {
        Self {
            full_name: args.full_name,
            address_line1: args.address_line1,
            address_line2: args.address_line2.filter(|line| !line.trim().is_empty()),
            city: args.city,
            state: args.state,
            zip_code: args.zip_code,
            country: args.country,
            phone_number: args.phone_number,
        }
    }
}

/// Place an order for the cart.
///
/// # Errors
///
/// Returns an error if nobody is signed in, the cart is empty or the address
/// is incomplete.
pub async fn checkout(
    storefront: &mut Storefront,
    args: CheckoutArgs,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let summary = storefront.checkout_summary();
    let order = storefront.checkout(args.into()).await?;

    writeln!(out, "Order placed: {}", order.id)?;
    for item in &order.items {
        write_line_item(out, item)?;
    }
    writeln!(out)?;
    writeln!(out, "Subtotal: {}", summary.subtotal)?;
    writeln!(out, "Shipping: Free")?;
    writeln!(out, "Tax (7%): {}", summary.tax)?;
    writeln!(out, "Total:    {}", summary.total)?;
    Ok(())
}

/// List orders grouped by status, newest first within each group.
///
/// # Errors
///
/// Returns an error if output cannot be written.
pub fn list(
    storefront: &Storefront,
    status: Option<OrderStatus>,
    out: &mut impl Write,
) -> Result<(), CliError> {
    if storefront.session().is_none() {
        writeln!(out, "Sign in to see your orders.")?;
        return Ok(());
    }

    let orders = storefront.orders();
    let statuses: Vec<OrderStatus> = status.map_or_else(|| OrderStatus::ALL.to_vec(), |s| vec![s]);

    let mut any = false;
    for status in statuses {
        let mut group = orders.by_status(status).peekable();
        if group.peek().is_none() {
            continue;
        }
        any = true;
        writeln!(out, "== {status} ==")?;
        for order in group {
            write_order(out, order)?;
        }
    }

    if !any {
        writeln!(out, "No orders yet.")?;
    }
    Ok(())
}

/// Mark an order as paid.
///
/// # Errors
///
/// Returns an error if the order does not exist or is not new.
pub async fn pay(
    storefront: &mut Storefront,
    id: &OrderId,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let order = storefront
        .orders_mut()
        .mark_paid(id)
        .await
        .map_err(AppError::from)?;
    writeln!(out, "Order {} is now {}.", order.id, order.status)?;
    Ok(())
}

/// Mark an order as delivered.
///
/// # Errors
///
/// Returns an error if the order does not exist or is not paid.
pub async fn deliver(
    storefront: &mut Storefront,
    id: &OrderId,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let order = storefront
        .orders_mut()
        .mark_delivered(id)
        .await
        .map_err(AppError::from)?;
    writeln!(out, "Order {} is now {}.", order.id, order.status)?;
    Ok(())
}
