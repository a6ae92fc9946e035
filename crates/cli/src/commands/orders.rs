use carpet_storefront::Storefront;
use clap::Subcommand;

use super::{CliError, order_history};
use crate::output;

#[derive(Subcommand)]
pub enum OrdersAction {
    /// List orders placed from this device, newest first
    List,
}

pub fn run(storefront: &Storefront, action: OrdersAction) -> Result<(), CliError> {
    match action {
        OrdersAction::List => {
            let orders = order_history(storefront)?.list();
            output::orders(&orders, storefront.config().currency)?;
        }
    }
    Ok(())
}
