use carpet_core::ProductId;
use carpet_storefront::Storefront;
use carpet_storefront::services::product::ProductQuery;
use clap::Subcommand;
use rust_decimal::Decimal;

use super::CliError;
use crate::output;

#[derive(Subcommand)]
pub enum ProductsAction {
    /// List products
    List {
        #[arg(long)]
        page: Option<u32>,
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        material: Option<String>,
        #[arg(long)]
        color: Option<String>,
        #[arg(long)]
        size: Option<String>,
        #[arg(long)]
        min_price: Option<Decimal>,
        #[arg(long)]
        max_price: Option<Decimal>,
        /// Free-text search
        #[arg(short, long)]
        search: Option<String>,
        /// Sort key understood by the server, e.g. `price_asc`
        #[arg(long)]
        sort: Option<String>,
    },
    /// Show one product
    Show { id: String },
}

pub async fn run(storefront: &Storefront, action: ProductsAction) -> Result<(), CliError> {
    let currency = storefront.config().currency;
    match action {
        ProductsAction::List {
            page,
            limit,
            category,
            material,
            color,
            size,
            min_price,
            max_price,
            search,
            sort,
        } => {
            let query = ProductQuery {
                page,
                limit,
                category,
                material,
                color,
                size,
                min_price,
                max_price,
                search,
                sort,
            };
            let page = storefront.products().list(&query).await?;
            output::products(&page.products, currency)?;
            if let Some(pagination) = page.pagination {
                output::line(format_args!(
                    "page {} of {} ({} products)",
                    pagination.page, pagination.pages, pagination.total
                ))?;
            }
        }
        ProductsAction::Show { id } => {
            let product = storefront.view_product(&ProductId::new(id)).await?;
            output::product(&product, currency)?;
        }
    }
    Ok(())
}

/// Print recently viewed product ids, newest first.
pub fn recent(storefront: &Storefront) -> Result<(), CliError> {
    let ids = storefront.recently_viewed().list();
    if ids.is_empty() {
        output::line("Nothing viewed yet.")?;
    }
    for id in ids {
        output::line(id)?;
    }
    Ok(())
}
