//! Catalog browsing commands.

use std::io::Write;

use pocket_store::{AppError, Storefront};
use pocket_store_core::ProductId;

use super::{CliError, write_product};

/// Print every category name.
///
/// # Errors
///
/// Returns an error if the catalog cannot be reached.
pub async fn categories(storefront: &Storefront, out: &mut impl Write) -> Result<(), CliError> {
    let categories = storefront
        .catalog()
        .categories()
        .await
        .map_err(AppError::from)?;

    for category in &categories {
        writeln!(out, "{category}")?;
    }
    Ok(())
}

/// Print all products, or those in one category.
///
/// # Errors
///
/// Returns an error if the catalog cannot be reached.
pub async fn products(
    storefront: &Storefront,
    category: Option<&str>,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let catalog = storefront.catalog();
    let products = match category {
        Some(category) => catalog.products_in_category(category).await,
        None => catalog.products().await,
    }
    .map_err(AppError::from)?;

    if products.is_empty() {
        writeln!(out, "No products found.")?;
    }
    for product in &products {
        write_product(out, product)?;
    }
    Ok(())
}

/// Print one product in full.
///
/// # Errors
///
/// Returns an error if the product does not exist or the catalog cannot be
/// reached.
pub async fn product(
    storefront: &Storefront,
    id: ProductId,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let product = storefront
        .catalog()
        .product(id)
        .await
        .map_err(AppError::from)?;

    writeln!(out, "{}", product.title)?;
    writeln!(out, "Price:    {}", product.price)?;
    writeln!(out, "Category: {}", product.category)?;
    writeln!(
        out,
        "Rating:   {:.1} ({} reviews)",
        product.rating.rate, product.rating.count
    )?;
    writeln!(out, "Image:    {}", product.image)?;
    writeln!(out)?;
    writeln!(out, "{}", product.description)?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::commands::test_support::{catalog, output, storefront};

    #[tokio::test]
    async fn test_categories_one_per_line() {
        let catalog = catalog().await;
        let sf = storefront(&catalog.base_url());

        let mut buf = Vec::new();
        categories(&sf, &mut buf).await.unwrap();
        assert_eq!(output(buf), "jewelery\nmen's clothing\n");
    }

    #[tokio::test]
    async fn test_product_details() {
        let catalog = catalog().await;
        let sf = storefront(&catalog.base_url());

        let mut buf = Vec::new();
        product(&sf, ProductId::new(1), &mut buf).await.unwrap();
        let text = output(buf);
        assert!(text.starts_with("Backpack\nPrice:    $109.95\n"));
        assert!(text.contains("Rating:   3.9 (120 reviews)\n"));
        assert!(text.ends_with("Fits a laptop\n"));
    }

    #[tokio::test]
    async fn test_empty_category() {
        let catalog = catalog().await;
        let sf = storefront(&catalog.base_url());

        let mut buf = Vec::new();
        products(&sf, Some("electronics"), &mut buf).await.unwrap();
        assert_eq!(output(buf), "No products found.\n");
    }
}
