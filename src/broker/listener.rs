use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::ChangeBroker;
use crate::RemoteReceiver;
use crate::RemoteSignal;

/// Spawns a task delivering host signals to `broker` as they arrive.
///
/// Each delivery runs inside the broker's render cycle. The task ends when
/// `token` is cancelled or the host closes the channel.
pub fn spawn_remote_listener(
    broker: ChangeBroker,
    mut receiver: RemoteReceiver,
    token: CancellationToken,
) -> JoinHandle<()> {
    let deliver = broker.scheduler().schedule({
        let broker = broker.clone();
        move |signal: RemoteSignal| {
            broker.dispatch_remote(signal);
        }
    });

    tokio::spawn(async move {
        debug!("remote listener started");

        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    debug!("remote listener received shutdown signal");
                    break;
                }
                signal = receiver.recv() => {
                    match signal {
                        Some(signal) => deliver(signal),
                        None => {
                            debug!("remote signal channel closed");
                            break;
                        }
                    }
                }
            }
        }

        debug!("remote listener stopped");
    })
}
