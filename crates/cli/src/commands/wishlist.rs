use carpet_core::ProductId;
use carpet_storefront::Storefront;
use clap::Subcommand;

use super::CliError;
use crate::output;

#[derive(Subcommand)]
pub enum WishlistAction {
    /// Show the wishlist
    Show,
    /// Save a product
    Add { product_id: String },
    /// Unsave a product
    Remove { product_id: String },
    /// Save or unsave a product
    Toggle { product_id: String },
}

pub async fn run(storefront: &Storefront, action: WishlistAction) -> Result<(), CliError> {
    let wishlist = storefront.wishlist();
    match action {
        WishlistAction::Show => {}
        WishlistAction::Add { product_id } => {
            let product = storefront
                .products()
                .get(&ProductId::new(product_id))
                .await?;
            wishlist.add_product(&product).await?;
        }
        WishlistAction::Remove { product_id } => {
            wishlist.remove(&ProductId::new(product_id)).await?;
        }
        WishlistAction::Toggle { product_id } => {
            let product = storefront
                .products()
                .get(&ProductId::new(product_id))
                .await?;
            let saved = wishlist.toggle(product.to_wishlist_item()).await?;
            output::line(if saved {
                "Saved to wishlist."
            } else {
                "Removed from wishlist."
            })?;
        }
    }
    output::wishlist(&wishlist.items(), storefront.config().currency)?;
    Ok(())
}
