//! Sign-in, registration and session inspection.
//!
//! # Usage
//!
//! ```bash
//! dewdrop register -u glowgetter -e glow@example.com --allergy fragrance,nuts
//! dewdrop login -u glowgetter
//! dewdrop whoami
//! dewdrop logout
//! ```

use std::io::BufRead;

use dewdrop_client::{ApiClient, Registration};
use dewdrop_core::Email;
use secrecy::SecretString;

use super::CommandError;
use crate::output;

/// Use the given password or read one line from stdin.
fn password_or_stdin(password: Option<String>) -> Result<SecretString, CommandError> {
    if let Some(password) = password {
        return Ok(SecretString::from(password));
    }

    output::prompt("Password: ");
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    let password = line.trim_end_matches(['\r', '\n']);
    if password.is_empty() {
        return Err(CommandError::InvalidArgument("empty password".to_string()));
    }
    Ok(SecretString::from(password))
}

/// Sign in.
pub async fn login(
    client: &ApiClient,
    username: &str,
    password: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let password = password_or_stdin(password)?;
    let session = client.auth().login(username, &password).await?;
    output::signed_in(&session);
    Ok(())
}

/// Create an account and sign in.
pub async fn register(
    client: &ApiClient,
    username: &str,
    email: &str,
    password: Option<String>,
    allergies: Vec<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let email = Email::parse(email)?;
    let registration = Registration {
        username: username.to_owned(),
        email,
        password: password_or_stdin(password)?,
        allergies,
    };

    let session = client.auth().register(&registration).await?;
    output::signed_in(&session);
    Ok(())
}

/// Sign out.
pub async fn logout(client: &ApiClient) -> Result<(), Box<dyn std::error::Error>> {
    if !client.is_authenticated() {
        tracing::info!("Already signed out");
        return Ok(());
    }
    client.auth().logout().await?;
    tracing::info!("Signed out");
    Ok(())
}

/// Show the stored session.
pub fn whoami(client: &ApiClient) -> Result<(), Box<dyn std::error::Error>> {
    let session = client.session()?.ok_or(CommandError::NotSignedIn)?;
    output::whoami(&session);
    Ok(())
}
