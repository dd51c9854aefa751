//! Four-way region fan-out with an exactly-once gather.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, ScopedJoinHandle};

use photomosaic_core::{Quadrant, Region};

use crate::{MosaicError, RequestContext};

type Delivery<T> = (Quadrant, Result<T, MosaicError>);

/// Sends exactly one delivery for its quadrant.
///
/// Dropping the handle without sending (a panicking task) delivers
/// [`MosaicError::RegionTaskPanicked`], so the gather learns about the panic
/// as soon as the thread unwinds.
struct DeliveryHandle<T> {
    quadrant: Quadrant,
    sender: Option<Sender<Delivery<T>>>,
}

impl<T> DeliveryHandle<T> {
    fn deliver(mut self, result: Result<T, MosaicError>) {
        if let Some(sender) = self.sender.take() {
            // A closed channel only happens after the gather gave up on the
            // request; the value is no longer wanted.
            let _ = sender.send((self.quadrant, result));
        }
    }
}

impl<T> Drop for DeliveryHandle<T> {
    fn drop(&mut self) {
        if let Some(sender) = self.sender.take() {
            let _ = sender.send((
                self.quadrant,
                Err(MosaicError::RegionTaskPanicked(self.quadrant)),
            ));
        }
    }
}

/// Runs `work` once per quadrant on its own thread and gathers the results.
///
/// Every task shares one channel and delivers exactly one value tagged with
/// its quadrant, success or failure. The gather takes deliveries in
/// completion order, so the first failure cancels the siblings immediately.
/// Results are returned in [`Quadrant::ALL`] order regardless of arrival
/// order. Every spawned task is joined before this function returns, on
/// success and on failure alike.
///
/// # Errors
/// Returns the first region failure, [`MosaicError::DeadlineExceeded`] when
/// the context deadline passes while waiting,
/// [`MosaicError::RegionTaskPanicked`] when a task panics,
/// [`MosaicError::RegionTaskLost`] / [`MosaicError::DuplicateRegion`] when the
/// deliveries are not one per quadrant, or [`MosaicError::Spawn`] when a
/// thread cannot be started.
pub(crate) fn run_region_tasks<T, F>(
    regions: [Region; 4],
    ctx: &RequestContext,
    work: &F,
) -> Result<Vec<(Quadrant, T)>, MosaicError>
where
    T: Send + 'static,
    F: Fn(Quadrant, Region) -> Result<T, MosaicError> + Sync,
{
    thread::scope(|scope| {
        let (sender, receiver) = mpsc::channel();
        let mut handles = Vec::with_capacity(Quadrant::ALL.len());
        let mut spawn_error = None;

        for quadrant in Quadrant::ALL {
            let region = regions[quadrant.index()];
            let delivery = DeliveryHandle {
                quadrant,
                sender: Some(sender.clone()),
            };
            let spawned = thread::Builder::new()
                .name(format!("photomosaic-{quadrant}"))
                .spawn_scoped(scope, move || delivery.deliver(work(quadrant, region)));

            match spawned {
                Ok(handle) => handles.push((quadrant, handle)),
                Err(error) => {
                    spawn_error = Some(MosaicError::Spawn(error));
                    break;
                }
            }
        }
        // Only the tasks hold senders now; a disconnect means none is left.
        drop(sender);

        let gathered = match spawn_error {
            Some(error) => Err(error),
            None => gather(&receiver, ctx),
        };
        if gathered.is_err() {
            ctx.cancel();
        }

        let joined = join_all(handles);
        let gathered = gathered?;
        joined?;
        Ok(gathered)
    })
}

fn gather<T>(
    receiver: &Receiver<Delivery<T>>,
    ctx: &RequestContext,
) -> Result<Vec<(Quadrant, T)>, MosaicError> {
    let mut slots: [Option<T>; 4] = [None, None, None, None];

    for _ in Quadrant::ALL {
        let (quadrant, delivery) = match ctx.remaining() {
            Some(remaining) => receiver
                .recv_timeout(remaining)
                .map_err(|error| match error {
                    RecvTimeoutError::Timeout => MosaicError::DeadlineExceeded,
                    RecvTimeoutError::Disconnected => first_undelivered(&slots),
                })?,
            None => receiver.recv().map_err(|_| first_undelivered(&slots))?,
        };

        let value = delivery?;
        let slot = &mut slots[quadrant.index()];
        if slot.is_some() {
            return Err(MosaicError::DuplicateRegion(quadrant));
        }
        *slot = Some(value);
        tracing::debug!(quadrant = %quadrant, "region delivered");
    }

    Quadrant::ALL
        .into_iter()
        .zip(slots)
        .map(|(quadrant, slot)| {
            slot.map(|value| (quadrant, value))
                .ok_or(MosaicError::RegionTaskLost(quadrant))
        })
        .collect()
}

fn first_undelivered<T>(slots: &[Option<T>; 4]) -> MosaicError {
    let quadrant = Quadrant::ALL
        .into_iter()
        .find(|quadrant| slots[quadrant.index()].is_none())
        .unwrap_or(Quadrant::BottomRight);
    MosaicError::RegionTaskLost(quadrant)
}

fn join_all(handles: Vec<(Quadrant, ScopedJoinHandle<'_, ()>)>) -> Result<(), MosaicError> {
    let mut outcome = Ok(());
    for (quadrant, handle) in handles {
        if handle.join().is_err() && outcome.is_ok() {
            outcome = Err(MosaicError::RegionTaskPanicked(quadrant));
        }
    }
    outcome
}
