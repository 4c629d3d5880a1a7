//! Ctrl-C handling.

use std::thread;

use stagehand_sync::CancelToken;

/// Flip `token` on the first Ctrl-C.
///
/// The listener runs on a detached helper thread with its own runtime; the
/// sync itself stays synchronous.
pub fn cancel_on_ctrl_c(token: CancelToken) {
    let spawned = thread::Builder::new()
        .name("ctrl-c".to_string())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(err) => {
                    tracing::warn!(error = %err, "ctrl-c listener unavailable");
                    return;
                }
            };
            match runtime.block_on(tokio::signal::ctrl_c()) {
                Ok(()) => {
                    tracing::warn!("cancel requested; stopping after the current unit");
                    token.cancel();
                }
                Err(err) => tracing::warn!(error = %err, "ctrl-c listener failed"),
            }
        });
    if let Err(err) = spawned {
        tracing::warn!(error = %err, "could not spawn ctrl-c listener");
    }
}
