//! Session CLI commands
//!
//! Signing in selects whose rows every other command sees. Signing out
//! also discards the session key, so secrets stored during the session can
//! no longer be decrypted.

use clap::Subcommand;

use crate::crypto::SessionStore;
use crate::error::VaultResult;
use crate::models::UserId;
use crate::services::Vault;
use crate::storage::{Authenticator, Backend};

/// Session subcommands
#[derive(Subcommand)]
pub enum SessionCommands {
    /// Start a session as a user
    SignIn {
        /// User id
        user: String,
    },
    /// End the session and discard the session key
    SignOut,
    /// Show who is signed in
    Status,
}

/// Handle session commands
pub async fn handle_session_command<B, S>(vault: &Vault<B, S>, cmd: SessionCommands) -> VaultResult<()>
where
    B: Backend + Authenticator,
    S: SessionStore,
{
    match cmd {
        SessionCommands::SignIn { user } => {
            let user = UserId::new(user.trim());
            vault.sign_in(&user)?;
            println!("Signed in as {}", user);
        }
        SessionCommands::SignOut => {
            vault.sign_out()?;
            println!("Signed out. Session key discarded.");
        }
        SessionCommands::Status => match vault.backend().current_user().await? {
            Some(user) => {
                let key = if vault.crypto().has_session_key()? {
                    "active"
                } else {
                    "not yet created"
                };
                println!("Signed in as {}", user);
                println!("Session key: {}", key);
            }
            None => println!("Not signed in. Use 'vault session sign-in <user>'."),
        },
    }

    Ok(())
}
