use carpet_storefront::Storefront;
use clap::Subcommand;

use super::CliError;
use crate::output;

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Show preferences
    Show,
    /// Change preferences
    Set {
        #[arg(long)]
        notify_orders: Option<bool>,
        #[arg(long)]
        notify_marketing: Option<bool>,
        #[arg(long)]
        region: Option<String>,
    },
}

pub fn run(storefront: &Storefront, action: SettingsAction) -> Result<(), CliError> {
    let store = storefront.settings();
    let mut settings = store.load();
    if let SettingsAction::Set {
        notify_orders,
        notify_marketing,
        region,
    } = action
    {
        if let Some(value) = notify_orders {
            settings.notify_orders = value;
        }
        if let Some(value) = notify_marketing {
            settings.notify_marketing = value;
        }
        if let Some(value) = region {
            settings.region = value;
        }
        store.save(&settings)?;
    }
    output::line(format_args!("order updates: {}", settings.notify_orders))?;
    output::line(format_args!("marketing:     {}", settings.notify_marketing))?;
    output::line(format_args!("region:        {}", settings.region))?;
    Ok(())
}
