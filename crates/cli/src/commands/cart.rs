use carpet_core::ProductId;
use carpet_storefront::Storefront;
use clap::Subcommand;

use super::CliError;
use crate::output;

#[derive(Subcommand)]
pub enum CartAction {
    /// Show the cart
    Show,
    /// Add a product
    Add {
        product_id: String,
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Set a line's quantity (0 removes it)
    Update {
        product_id: String,
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Remove a line
    Remove { product_id: String },
    /// Empty the cart
    Clear,
}

pub async fn run(storefront: &Storefront, action: CartAction) -> Result<(), CliError> {
    let cart = storefront.cart();
    match action {
        CartAction::Show => {}
        CartAction::Add {
            product_id,
            quantity,
        } => {
            let product = storefront
                .products()
                .get(&ProductId::new(product_id))
                .await?;
            cart.add_product(&product, quantity).await?;
        }
        CartAction::Update {
            product_id,
            quantity,
        } => {
            cart.update_quantity(&ProductId::new(product_id), quantity)
                .await?;
        }
        CartAction::Remove { product_id } => cart.remove(&ProductId::new(product_id)).await?,
        CartAction::Clear => cart.clear().await?,
    }
    output::line(format_args!("[{} cart]", cart.mode().await))?;
    output::cart(&cart.items(), storefront.config().currency)?;
    Ok(())
}
