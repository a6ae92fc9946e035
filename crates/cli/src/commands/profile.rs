use carpet_core::AddressId;
use carpet_storefront::Storefront;
use carpet_storefront::api::types::ProfileUpdate;
use carpet_storefront::profile::to_api_address;
use clap::Subcommand;

use super::{CliError, address_book};
use crate::output;

#[derive(Subcommand)]
pub enum ProfileAction {
    /// Show the server profile
    Show,
    /// Update the server profile
    Update {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        /// Copy a saved address to the profile
        #[arg(long)]
        address_id: Option<String>,
    },
}

pub async fn run(storefront: &Storefront, action: ProfileAction) -> Result<(), CliError> {
    if storefront.auth().backend_session().is_none() {
        return Err(CliError::NotSignedIn);
    }
    let profile = match action {
        ProfileAction::Show => storefront
            .auth()
            .get_user_profile()
            .await
            .map_err(carpet_storefront::StorefrontError::from)?,
        ProfileAction::Update {
            name,
            phone,
            address_id,
        } => {
            let address = match address_id {
                Some(id) => {
                    let id = AddressId::new(id);
                    let saved = address_book(storefront)?
                        .list()?
                        .into_iter()
                        .find(|a| a.id == id)
                        .ok_or_else(|| CliError::NotFound(format!("No saved address {id}")))?;
                    Some(to_api_address(&saved))
                }
                None => None,
            };
            let update = ProfileUpdate {
                name,
                phone_number: phone,
                address,
            };
            if update.is_empty() {
                output::line("Nothing to update.")?;
                return Ok(());
            }
            storefront
                .auth()
                .update_user_profile(&update)
                .await
                .map_err(carpet_storefront::StorefrontError::from)?
        }
    };

    let Some(profile) = profile else {
        output::line("No profile returned.")?;
        return Ok(());
    };
    output::line(format_args!("email:    {}", profile.email))?;
    output::line(format_args!(
        "name:     {}",
        profile.name.as_deref().unwrap_or("-")
    ))?;
    output::line(format_args!(
        "phone:    {}",
        profile.phone_number.as_deref().unwrap_or("-")
    ))?;
    output::line(format_args!(
        "verified: {}",
        if profile.is_verified { "yes" } else { "no" }
    ))?;
    if let Some(address) = profile.address {
        let parts: Vec<&str> = [
            &address.address_line,
            &address.city,
            &address.state,
            &address.pincode,
            &address.country,
        ]
        .into_iter()
        .filter_map(|part| part.as_deref())
        .collect();
        output::line(format_args!("address:  {}", parts.join(", ")))?;
    }
    Ok(())
}
