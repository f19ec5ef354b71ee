use tokio::{
    sync::watch,
    time::{sleep_until, Instant},
};

use super::{IntroEvent, IntroSequencer, IntroStatus};
use crate::Result;

/// Plays `sequencer` against the tokio clock, forwarding every event to
/// `on_event`.
///
/// Sending `true` on `cancel`, or dropping its sender, cancels the sequence
/// at once; nothing is emitted afterwards and the completion callback is
/// never run.
pub async fn run_intro<F>(
    sequencer: &mut IntroSequencer,
    mut cancel: watch::Receiver<bool>,
    mut on_event: F,
) -> Result<IntroStatus>
where
    F: FnMut(&IntroEvent),
{
    if *cancel.borrow_and_update() {
        sequencer.cancel();
        return Ok(sequencer.status());
    }

    let origin = Instant::now();
    for event in sequencer.start()? {
        on_event(&event);
    }

    while let Some(wait) = sequencer.next_deadline() {
        let deadline = origin + sequencer.elapsed() + wait;

        tokio::select! {
            biased;
            changed = cancel.changed() => {
                if changed.is_err() || *cancel.borrow_and_update() {
                    sequencer.cancel();
                    break;
                }
            }
            _ = sleep_until(deadline) => {
                for event in sequencer.advance(wait) {
                    on_event(&event);
                }
            }
        }
    }

    Ok(sequencer.status())
}
