use carpet_core::PaymentMethodId;
use carpet_storefront::Storefront;
use clap::Subcommand;

use super::CliError;
use crate::output;

#[derive(Subcommand)]
pub enum CardsAction {
    /// List saved cards
    List,
    /// Save a card reference (only the last four digits are kept)
    Add {
        #[arg(long)]
        brand: String,
        /// Card number or its last four digits
        #[arg(long)]
        number: String,
        #[arg(long, default_value = "")]
        label: String,
    },
    /// Forget a saved card
    Remove { id: String },
}

pub fn run(storefront: &Storefront, action: CardsAction) -> Result<(), CliError> {
    let methods = storefront.payment_methods();
    match action {
        CardsAction::List => {}
        CardsAction::Add {
            brand,
            number,
            label,
        } => {
            methods.add(&label, &brand, &number)?;
        }
        CardsAction::Remove { id } => methods.remove(&PaymentMethodId::new(id))?,
    }
    let cards = methods.list();
    if cards.is_empty() {
        output::line("No saved cards.")?;
    }
    for card in cards {
        output::line(format_args!("{}  {}  {}", card.id, card.masked(), card.label))?;
    }
    Ok(())
}
