//! Infrastructure credential orchestration.
//!
//! `build` needs live infrastructure credentials. They are cached encrypted
//! on disk under the session's local directory; this module decides whether
//! to decrypt the cache or to re-acquire fresh credentials from the
//! infrastructure implementation, and keeps the cache up to date.

use tracing::debug;

use stagehand_core::infra::{Infra, InfraContext};
use stagehand_ui::InputOpts;

use crate::error::CoreError;
use crate::layout::Layout;

const PASS_EXISTS_DESC: &str = "\
Infrastructure credentials are required for this operation. Stagehand found
saved credentials that are password protected. Please enter the password to
decrypt these credentials. You may also just hit <enter> and leave the
password blank to force Stagehand to ask for the credentials again.";

const PASS_NEW_DESC: &str = "\
This password will be used to encrypt and save the credentials so they
don't need to be repeated multiple times.";

/// Fill `ctx.creds`, decrypting the cached credentials or querying the
/// infrastructure implementation for fresh ones. An empty password at the
/// decryption prompt forces re-acquisition.
pub(crate) async fn ensure(
    layout: &Layout,
    infra: &dyn Infra,
    ctx: &mut InfraContext,
) -> Result<(), CoreError> {
    let ui = ctx.shared.ui.clone();
    ui.header("Detecting infrastructure credentials...");

    let path = layout.creds_path();
    let exists = tokio::fs::try_exists(&path).await.unwrap_or(false);
    if !exists {
        layout.ensure_local_dir().await.map_err(|err| {
            CoreError::CredentialsWriteFailed(stagehand_creds::CredsError::Write(err))
        })?;
    }

    if exists {
        ui.message(
            "Cached and encrypted infrastructure credentials found.\n\
             Stagehand will now ask you for the password to decrypt these\n\
             credentials.\n",
        );

        let password = ui
            .input(
                &InputOpts::new("creds_password", "Encrypted Credentials Password")
                    .with_description(PASS_EXISTS_DESC)
                    .secret(),
            )
            .await?;

        if !password.is_empty() {
            let creds = stagehand_creds::load(&path, &password)
                .await
                .map_err(|source| CoreError::BadCredentialsPassword { source })?;
            ctx.creds = creds;
            return Ok(());
        }

        debug!("empty credentials password entered, forcing re-acquisition");
    }

    ui.message(
        "Existing infrastructure credentials were not found! Stagehand will\n\
         now ask you for infrastructure credentials. These will be encrypted\n\
         and saved on disk so this doesn't need to be repeated.\n\n\
         IMPORTANT: If you're re-entering new credentials, make sure the\n\
         credentials are for the same account, otherwise you may lose access\n\
         to your existing infrastructure Stagehand set up.\n",
    );

    let creds = infra.creds(ctx).await?;

    let mut password = String::new();
    while password.is_empty() {
        password = ui
            .input(
                &InputOpts::new("creds_password", "Password for Encrypting Credentials")
                    .with_description(PASS_NEW_DESC)
                    .secret(),
            )
            .await?;
    }

    stagehand_creds::save(&path, &password, &creds)
        .await
        .map_err(CoreError::CredentialsWriteFailed)?;

    ctx.creds = creds;
    Ok(())
}
