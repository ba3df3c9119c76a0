//! Account commands.

use std::io::Write;

use pocket_store::Storefront;

use super::CliError;

/// Create an account and sign in.
///
/// # Errors
///
/// Returns an error if the email is taken or the input is invalid.
pub async fn sign_up(
    storefront: &mut Storefront,
    email: &str,
    password: &str,
    name: Option<&str>,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let session = storefront.sign_up(email, password, name).await?;
    writeln!(
        out,
        "Welcome, {}! Signed in as {}.",
        session.user.display_name(),
        session.user.email
    )?;
    Ok(())
}

/// Sign in to an existing account.
///
/// # Errors
///
/// Returns an error on a wrong email or password.
pub async fn sign_in(
    storefront: &mut Storefront,
    email: &str,
    password: &str,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let session = storefront.sign_in(email, password).await?;
    writeln!(out, "Welcome back, {}!", session.user.display_name())?;

    let items = storefront.cart().total_quantity();
    if items > 0 {
        writeln!(out, "You have {items} item(s) in your cart.")?;
    }
    Ok(())
}

/// Sign out, saving the cart.
///
/// # Errors
///
/// Returns an error if the session cannot be removed.
pub async fn sign_out(storefront: &mut Storefront, out: &mut impl Write) -> Result<(), CliError> {
    if storefront.session().is_none() {
        writeln!(out, "Not signed in.")?;
        return Ok(());
    }
    storefront.sign_out().await?;
    writeln!(out, "Signed out.")?;
    Ok(())
}

/// Show the signed-in user and a summary of their orders.
///
/// # Errors
///
/// Returns an error if output cannot be written.
pub fn whoami(storefront: &Storefront, out: &mut impl Write) -> Result<(), CliError> {
    let Some(session) = storefront.session() else {
        writeln!(out, "Not signed in.")?;
        return Ok(());
    };

    let counts = storefront.orders().counts();
    writeln!(out, "{} <{}>", session.user.display_name(), session.user.email)?;
    writeln!(out, "User ID:         {}", session.user.id)?;
    writeln!(
        out,
        "Session expires: {}",
        session.expires_at.format("%Y-%m-%d %H:%M UTC")
    )?;
    writeln!(
        out,
        "Orders:          {} new, {} paid, {} delivered",
        counts.new, counts.paid, counts.delivered
    )?;
    Ok(())
}
