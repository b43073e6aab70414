// src/security/privilege.rs

use tracing::{error, info};

/// Confirm the invoking user may run privileged tooling.
///
/// Already-root users pass immediately. Otherwise `sudo -v` is run so the
/// user can authenticate interactively. Any failure returns `false` and the
/// caller must abort the command.
///
/// Only reachable when `[security] allow_privileged = true`.
#[cfg(unix)]
pub async fn authenticated_user() -> bool {
    if nix::unistd::geteuid().is_root() {
        info!("user is already root, no authentication needed");
        return true;
    }

    info!("this command requires admin rights; please authenticate");

    match tokio::process::Command::new("sudo").arg("-v").status().await {
        Ok(status) if status.success() => {
            info!("user authenticated successfully");
            true
        }
        Ok(status) => {
            error!(exit_code = status.code().unwrap_or(-1), "authentication failed");
            false
        }
        Err(e) => {
            error!(error = %e, "could not run sudo for authentication");
            false
        }
    }
}

#[cfg(not(unix))]
pub async fn authenticated_user() -> bool {
    error!("privileged command authentication is not supported on this platform");
    false
}
