use carpet_core::{AddressId, AddressLabel, Coordinates, NewAddress};
use carpet_storefront::Storefront;
use clap::{Args, Subcommand};

use super::{CliError, address_book};
use crate::output;

#[derive(Subcommand)]
pub enum AddressesAction {
    /// List saved addresses
    List,
    /// Save an address
    Add(AddressArgs),
    /// Delete a saved address
    Remove { id: String },
}

#[derive(Args)]
pub struct AddressArgs {
    /// Home, Work, Other, or any custom label
    #[arg(long, default_value = "Home")]
    label: AddressLabel,
    #[arg(long)]
    address: String,
    #[arg(long, default_value = "")]
    address2: String,
    #[arg(long, default_value = "")]
    city: String,
    #[arg(long, default_value = "")]
    state: String,
    /// Postal code
    #[arg(long, default_value = "")]
    zip: String,
    #[arg(long, default_value = "")]
    country: String,
    #[arg(long, requires = "longitude", allow_negative_numbers = true)]
    latitude: Option<f64>,
    #[arg(long, requires = "latitude", allow_negative_numbers = true)]
    longitude: Option<f64>,
}

pub fn run(storefront: &Storefront, action: AddressesAction) -> Result<(), CliError> {
    let book = address_book(storefront)?;
    match action {
        AddressesAction::List => {}
        AddressesAction::Add(args) => {
            let coordinates = args
                .latitude
                .zip(args.longitude)
                .and_then(|(lat, lng)| Coordinates::new(lat, lng));
            let saved = book.add(NewAddress {
                label: args.label,
                address: args.address,
                address2: args.address2,
                city: args.city,
                state: args.state,
                zip: args.zip,
                country: args.country,
                coordinates,
            })?;
            output::line(format_args!("Saved address {}", saved.id))?;
        }
        AddressesAction::Remove { id } => book.remove(&AddressId::new(id))?,
    }
    output::addresses(&book.list()?)?;
    Ok(())
}
