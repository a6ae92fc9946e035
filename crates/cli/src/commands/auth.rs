use carpet_storefront::Storefront;
use carpet_storefront::session::Session;
use clap::Subcommand;

use super::CliError;
use crate::output;

#[derive(Subcommand)]
pub enum AuthAction {
    /// Email a one-time login code
    SendOtp { email: String },
    /// Verify the emailed code and sign in
    Verify { email: String, otp: String },
    /// Show who is signed in
    Whoami,
    /// Sign out
    Logout,
}

pub async fn run(storefront: &Storefront, action: AuthAction) -> Result<(), CliError> {
    match action {
        AuthAction::SendOtp { email } => {
            storefront.send_email_otp(&email).await?;
            output::line(format_args!(
                "Code sent to {email}. Run: carpet auth verify {email} <code>"
            ))?;
        }
        AuthAction::Verify { email, otp } => {
            storefront.verify_email_otp(&email, &otp).await?;
            output::line(format_args!("Signed in as {email}."))?;
        }
        AuthAction::Whoami => match storefront.session().current() {
            Session::Anonymous => output::line("Not signed in.")?,
            Session::Federated(user) => output::line(format_args!(
                "{} (identity provider)",
                user.email.as_deref().unwrap_or(&user.uid)
            ))?,
            Session::Backend(session) => {
                let email = if session.email.is_empty() {
                    "email login"
                } else {
                    session.email.as_str()
                };
                output::line(format_args!("{email} (one-time code)"))?;
            }
        },
        AuthAction::Logout => {
            storefront.sign_out().await?;
            output::line("Signed out.")?;
        }
    }
    Ok(())
}
