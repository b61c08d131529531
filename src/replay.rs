//! Feed a recorded `input_event` stream through a [`TouchMapper`].

use std::io::{ErrorKind, Read, Write};
use std::time::Duration;

use crate::config::ReaderConfig;
use crate::context::ReaderContext;
use crate::device::DeviceProfile;
use crate::error::{Error, Result};
use crate::input::event::{INPUT_EVENT_SIZE_32, INPUT_EVENT_SIZE_64};
use crate::input::{parse_input_event, RawEvent};
use crate::touch::{Output, TouchMapper};

/// Reads fixed-size `input_event` records from a byte stream.
pub struct EventReader<R> {
    inner: R,
    buf: Vec<u8>,
}

impl<R: Read> EventReader<R> {
    pub fn new(inner: R, event_size: usize) -> Result<Self> {
        if event_size != INPUT_EVENT_SIZE_32 && event_size != INPUT_EVENT_SIZE_64 {
            return Err(Error::InvalidEventSize(event_size));
        }
        Ok(Self {
            inner,
            buf: vec![0u8; event_size],
        })
    }

    /// Fill the record buffer. `Ok(false)` at a clean end of stream.
    fn fill(&mut self) -> Result<bool> {
        let mut filled = 0;
        while filled < self.buf.len() {
            match self.inner.read(&mut self.buf[filled..]) {
                Ok(0) => {
                    if filled > 0 {
                        log::warn!("Ignoring truncated trailing record ({} bytes)", filled);
                    }
                    return Ok(false);
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(true)
    }
}

impl<R: Read> Iterator for EventReader<R> {
    type Item = Result<RawEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.fill() {
                Ok(true) => {}
                Ok(false) => return None,
                Err(e) => return Some(Err(e)),
            }
            match parse_input_event(&self.buf) {
                Some(ev) => return Some(Ok(ev)),
                None => log::warn!("Skipping input_event with invalid timestamp"),
            }
        }
    }
}

/// Counters reported at the end of a replay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayStats {
    pub events: u64,
    pub frames: u64,
    pub notifications: u64,
    pub timeouts: u64,
}

/// Drives one device's engine from recorded events, firing engine timeouts
/// off the stream's own clock.
pub struct Replay<W> {
    device: DeviceProfile,
    mapper: TouchMapper,
    ctx: ReaderContext,
    pending_timeout: Option<Duration>,
    out: W,
    stats: ReplayStats,
}

impl<W: Write> Replay<W> {
    pub fn new(device: DeviceProfile, config: &ReaderConfig, device_id: i32, out: W) -> Self {
        let mapper = TouchMapper::new(device_id, &device, config);
        Self {
            device,
            mapper,
            ctx: ReaderContext::new(),
            pending_timeout: None,
            out,
            stats: ReplayStats::default(),
        }
    }

    pub fn mapper(&self) -> &TouchMapper {
        &self.mapper
    }

    /// Process one event, first firing a pending timeout it has passed.
    pub fn feed(&mut self, event: &RawEvent) -> Result<()> {
        if let Some(deadline) = self.pending_timeout {
            if event.when >= deadline {
                self.fire_timeout(deadline)?;
            }
        }

        self.stats.events += 1;
        if event.is_sync_report() {
            self.stats.frames += 1;
        }
        self.device.observe(event);
        let output = self.mapper.process(event, &self.device, &mut self.ctx);
        self.write(output)
    }

    /// Fire the timeout still pending when the stream ends, then return the
    /// counters.
    pub fn finish(mut self) -> Result<ReplayStats> {
        if let Some(deadline) = self.pending_timeout {
            self.fire_timeout(deadline)?;
        }
        self.out.flush()?;
        Ok(self.stats)
    }

    fn fire_timeout(&mut self, deadline: Duration) -> Result<()> {
        log::debug!("Timeout at {:?}", deadline);
        self.stats.timeouts += 1;
        let output = self.mapper.timeout_expired(deadline, &self.ctx);
        self.write(output)
    }

    fn write(&mut self, output: Output) -> Result<()> {
        for n in &output.notifications {
            writeln!(self.out, "{}", n)?;
        }
        self.stats.notifications += output.notifications.len() as u64;
        self.pending_timeout = output.next_timeout;
        Ok(())
    }
}

/// Replay a whole stream and print the notifications to `out`.
pub fn run<R: Read, W: Write>(
    input: R,
    event_size: usize,
    device: DeviceProfile,
    config: &ReaderConfig,
    device_id: i32,
    out: W,
) -> Result<ReplayStats> {
    let reader = EventReader::new(input, event_size)?;
    let mut replay = Replay::new(device, config, device_id, out);
    for ev in reader {
        replay.feed(&ev?)?;
    }
    let stats = replay.finish()?;
    log::info!(
        "Replayed {} events in {} frames: {} notifications, {} timeouts",
        stats.events,
        stats.frames,
        stats.notifications,
        stats.timeouts
    );
    Ok(stats)
}
