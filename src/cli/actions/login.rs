use crate::cli::actions::Action;
use crate::device::login::Login;
use crate::device::trust::MemoryTrustStore;
use crate::device::DeviceClient;
use crate::scram::Credentials;
use anyhow::Result;
use tracing::info;

/// Handle the login action
pub async fn handle(action: Action) -> Result<()> {
    let Action::Login {
        url,
        username,
        password,
    } = action;

    let device = DeviceClient::new(&url)?;
    let trust = MemoryTrustStore::new();
    let credentials = Credentials::new(username, password);

    let outcome = Login::new(&device, &trust, &credentials).run().await?;

    info!(
        modulus = %outcome.device_key.modulus,
        exponent = %outcome.device_key.exponent,
        "device identity verified"
    );

    // The session token is the result: scripts consume it from stdout.
    println!("{}", outcome.session_token);

    Ok(())
}
