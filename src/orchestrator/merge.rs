//! The bounded fan-in channel every scheduled searcher's blocking task
//! writes into (spec.md §4.4, §5). Capacity `B` is the backpressure knob:
//! once it fills, `Sender::blocking_send` parks the searcher's worker
//! thread until the ranking stage drains it.

use crate::match_types::Match;
use tokio::sync::mpsc;

pub fn channel(capacity: usize) -> (mpsc::Sender<Match>, mpsc::Receiver<Match>) {
    mpsc::channel(capacity.max(1))
}
