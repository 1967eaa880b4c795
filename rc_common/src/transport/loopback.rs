//! In-memory packet radio for simulation and tests.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::Mutex;

use super::{RadioConfig, RadioFrame, RadioLink, TransportError, radio_frame};
use crate::consts::RADIO_MAX_PAYLOAD;

/// Frames buffered per direction before the oldest is dropped.
const FRAME_QUEUE_CAP: usize = 32;

type FrameQueue = Arc<Mutex<VecDeque<RadioFrame>>>;

#[derive(Debug)]
struct LinkControl {
    link_up: AtomicBool,
    lost_frames: AtomicU64,
}

/// Radio that delivers frames through shared memory queues.
///
/// A self-loop hears its own transmissions. A connected pair behaves like two
/// transceivers on the same channel. Link loss is simulated through
/// [`LoopbackHandle::set_link_up`]: frames sent while the link is down are
/// lost and reported as unacknowledged.
pub struct LoopbackRadio {
    inbox: FrameQueue,
    outbox: FrameQueue,
    powered: Arc<AtomicBool>,
    control: Arc<LinkControl>,
}

/// Test / simulation handle onto a [`LoopbackRadio`].
#[derive(Clone)]
pub struct LoopbackHandle {
    inbox: FrameQueue,
    powered: Arc<AtomicBool>,
    control: Arc<LinkControl>,
}

impl LoopbackRadio {
    fn with_queues(inbox: FrameQueue, outbox: FrameQueue, control: Arc<LinkControl>) -> Self {
        Self {
            inbox,
            outbox,
            powered: Arc::new(AtomicBool::new(false)),
            control,
        }
    }

    fn new_control() -> Arc<LinkControl> {
        Arc::new(LinkControl {
            link_up: AtomicBool::new(true),
            lost_frames: AtomicU64::new(0),
        })
    }

    /// Radio that receives what it sends.
    pub fn self_loop() -> Self {
        let queue = FrameQueue::default();
        Self::with_queues(queue.clone(), queue, Self::new_control())
    }

    /// Two radios on the same channel. Link state is shared, power is not.
    pub fn pair() -> (Self, Self) {
        let a_to_b = FrameQueue::default();
        let b_to_a = FrameQueue::default();
        let control = Self::new_control();
        (
            Self::with_queues(b_to_a.clone(), a_to_b.clone(), control.clone()),
            Self::with_queues(a_to_b, b_to_a, control),
        )
    }

    /// Handle for injecting frames into this radio and simulating link loss.
    pub fn handle(&self) -> LoopbackHandle {
        LoopbackHandle {
            inbox: self.inbox.clone(),
            powered: self.powered.clone(),
            control: self.control.clone(),
        }
    }
}

fn push_bounded(queue: &FrameQueue, frame: RadioFrame) {
    let mut queue = queue.lock();
    if queue.len() == FRAME_QUEUE_CAP {
        queue.pop_front();
    }
    queue.push_back(frame);
}

impl RadioLink for LoopbackRadio {
    fn name(&self) -> &'static str {
        "loopback"
    }

    fn configure(&mut self, config: &RadioConfig) -> Result<(), TransportError> {
        if config.address.iter().all(|&b| b == 0) {
            return Err(TransportError::OpenFailed(
                "radio address must not be all zeros".to_string(),
            ));
        }
        self.powered.store(true, Ordering::Release);
        Ok(())
    }

    fn transmit(&mut self, frame: &[u8]) -> Result<bool, TransportError> {
        if !self.powered.load(Ordering::Acquire) {
            return Err(TransportError::SendFailed("radio powered down".to_string()));
        }
        if !self.control.link_up.load(Ordering::Relaxed) {
            self.control.lost_frames.fetch_add(1, Ordering::Relaxed);
            return Ok(false);
        }
        let frame = radio_frame(frame).ok_or(TransportError::PayloadTooLarge {
            len: frame.len(),
            max: RADIO_MAX_PAYLOAD,
        })?;
        push_bounded(&self.outbox, frame);
        Ok(true)
    }

    fn poll_frame(&mut self) -> Option<RadioFrame> {
        if !self.powered.load(Ordering::Acquire) {
            return None;
        }
        self.inbox.lock().pop_front()
    }

    fn power_down(&mut self) {
        self.powered.store(false, Ordering::Release);
    }
}

impl LoopbackHandle {
    /// Bring the simulated link up or down.
    pub fn set_link_up(&self, up: bool) {
        self.control.link_up.store(up, Ordering::Relaxed);
    }

    /// Whether the radio is currently powered.
    pub fn is_powered(&self) -> bool {
        self.powered.load(Ordering::Acquire)
    }

    /// Frames lost while the link was down.
    pub fn lost_frames(&self) -> u64 {
        self.control.lost_frames.load(Ordering::Relaxed)
    }

    /// Queue a frame for the radio to receive, as if sent over the air.
    /// `false` if it exceeds the radio frame size.
    pub fn inject(&self, frame: &[u8]) -> bool {
        match radio_frame(frame) {
            Some(frame) => {
                push_bounded(&self.inbox, frame);
                true
            }
            None => false,
        }
    }

    /// Frames waiting to be polled.
    pub fn pending(&self) -> usize {
        self.inbox.lock().len()
    }
}
