use carpet_core::{AddressId, ContactDetails, ShippingDetails};
use carpet_storefront::Storefront;
use clap::Args;

use super::{CliError, address_book};
use crate::output;

#[derive(Args)]
pub struct CheckoutArgs {
    /// Contact email (defaults to the signed-in user's)
    #[arg(long)]
    email: Option<String>,
    #[arg(long, default_value = "")]
    phone: String,
    /// Full name for delivery
    #[arg(long)]
    name: String,
    /// Ship to a saved address
    #[arg(long, conflicts_with = "address")]
    address_id: Option<String>,
    #[arg(long)]
    address: Option<String>,
    #[arg(long, default_value = "")]
    address2: String,
    #[arg(long, default_value = "")]
    city: String,
    #[arg(long, default_value = "")]
    state: String,
    #[arg(long, default_value = "")]
    zip: String,
    #[arg(long)]
    country: Option<String>,
}

pub async fn run(storefront: &Storefront, args: CheckoutArgs) -> Result<(), CliError> {
    let email = args
        .email
        .or_else(|| storefront.user().and_then(|u| u.email))
        .unwrap_or_default();
    let contact = ContactDetails {
        email,
        phone: args.phone,
    };

    let shipping = match args.address_id {
        Some(id) => {
            let id = AddressId::new(id);
            let saved = address_book(storefront)?
                .list()?
                .into_iter()
                .find(|a| a.id == id)
                .ok_or_else(|| CliError::NotFound(format!("No saved address {id}")))?;
            ShippingDetails::from_saved(args.name, &saved)
        }
        None => {
            let defaults = ShippingDetails::default();
            ShippingDetails {
                full_name: args.name,
                address: args.address.unwrap_or_default(),
                address2: args.address2,
                city: args.city,
                state: args.state,
                zip: args.zip,
                country: args.country.unwrap_or(defaults.country),
            }
        }
    };

    let order = storefront.place_order(&contact, &shipping).await?;
    output::line(format_args!(
        "Order {} placed: {} item(s), {}",
        order.id,
        order.item_count(),
        output::money(order.subtotal, storefront.config().currency)
    ))?;
    if storefront.user().is_none() {
        output::line("Sign in to keep a record of future orders.")?;
    }
    Ok(())
}
