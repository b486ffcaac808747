//! Application context and event loop

use std::{
    sync::mpsc::{Receiver, RecvTimeoutError},
    time::Instant,
};

use log::{debug, info, warn};

use crate::{
    config::{Config, RunOptions},
    constants::NMEA_CHANNEL,
    error::{FrameConfigError, StartupError},
    frames::FrameGraph,
    geometry::MountingOffset,
    parser::FixDecoder,
    rebroadcast::{GlobalPoseSample, PoseRebroadcaster},
    reconciler::FixReconciler,
    transport::{receive_utime, Event, Publisher, Subscriptions},
    types::{GpsToLocalEstimate, NmeaMessage},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Initializing,
    Running,
    ShuttingDown,
}

/// Everything the event loop works on. Owned by the loop thread, so none of
/// it is shared or locked.
pub struct AppContext<D: FixDecoder, P: Publisher> {
    decoder: D,
    publisher: P,
    frames: FrameGraph,
    reconciler: FixReconciler,
    mounting_offset: MountingOffset,
    latest: Option<GlobalPoseSample>,
    rebroadcaster: Option<PoseRebroadcaster>,
    state: Lifecycle,
    open_sources: usize,
}

impl<D: FixDecoder, P: Publisher> AppContext<D, P> {
    /// Builds the frame tree and resolves the mounting offset. Nothing is
    /// subscribed yet; any error here is fatal.
    pub fn initialize(
        config: &Config,
        options: RunOptions,
        decoder: D,
        publisher: P,
    ) -> Result<Self, StartupError> {
        let names = &config.frame_names;
        let frames = FrameGraph::from_config(&config.frames)?;
        for frame in [&names.sensor, &names.body, &names.local] {
            if !frames.has_frame(frame) {
                return Err(FrameConfigError::MissingFrame(frame.clone()).into());
            }
        }
        let mounting_offset =
            MountingOffset::load(&frames, &names.sensor, &names.body, receive_utime())?;

        // Re-armed by `start`
        let rebroadcaster = if options.publish_global_to_local {
            Some(PoseRebroadcaster::new(
                options.global_to_local_hz,
                Instant::now(),
            )?)
        } else {
            None
        };

        Ok(Self {
            decoder,
            publisher,
            reconciler: FixReconciler::new(&names.body, &names.local),
            frames,
            mounting_offset,
            latest: None,
            rebroadcaster,
            state: Lifecycle::Initializing,
            open_sources: 0,
        })
    }

    /// Moves the context over to `publisher`, e.g. once the real output is
    /// open. Only valid before `start`.
    pub fn with_publisher<Q: Publisher>(self, publisher: Q) -> AppContext<D, Q> {
        AppContext {
            decoder: self.decoder,
            publisher,
            frames: self.frames,
            reconciler: self.reconciler,
            mounting_offset: self.mounting_offset,
            latest: self.latest,
            rebroadcaster: self.rebroadcaster,
            state: self.state,
            open_sources: self.open_sources,
        }
    }

    pub fn state(&self) -> Lifecycle {
        self.state
    }

    pub fn mounting_offset(&self) -> &MountingOffset {
        &self.mounting_offset
    }

    pub fn latest_sample(&self) -> Option<&GlobalPoseSample> {
        self.latest.as_ref()
    }

    pub fn publisher(&self) -> &P {
        &self.publisher
    }

    /// Channels inbound sources may deliver once running
    pub fn subscriptions(&self) -> Subscriptions {
        Subscriptions {
            nmea: NMEA_CHANNEL.to_string(),
            poses: self.frames.update_channels().map(str::to_string).collect(),
        }
    }

    /// Enters `Running` with `sources` inbound sources feeding the queue.
    /// The rebroadcast timer, if enabled, starts at `now`.
    pub fn start(&mut self, sources: usize, now: Instant) -> Result<(), StartupError> {
        if let Some(timer) = &mut self.rebroadcaster {
            timer.restart(now)?;
            info!("Publishing global to local at {} Hz", timer.rate_hz());
        }
        self.open_sources = sources;
        self.state = if sources == 0 {
            Lifecycle::ShuttingDown
        } else {
            Lifecycle::Running
        };
        Ok(())
    }

    /// Dispatches events until shutdown. Each event is processed to
    /// completion; the rebroadcast deadline bounds every wait.
    pub fn run(&mut self, events: &Receiver<Event>) {
        while self.state == Lifecycle::Running {
            let received = match &self.rebroadcaster {
                Some(timer) => events.recv_timeout(timer.time_until_tick(Instant::now())),
                None => events.recv().map_err(|_| RecvTimeoutError::Disconnected),
            };
            match received {
                Ok(event) => self.handle_event(event),
                Err(RecvTimeoutError::Timeout) => {},
                Err(RecvTimeoutError::Disconnected) => {
                    info!("Every inbound source is gone");
                    self.state = Lifecycle::ShuttingDown;
                },
            }
            if self.state == Lifecycle::Running {
                self.poll_timer(Instant::now());
            }
        }
        info!("Shutting down");
    }

    pub fn handle_event(&mut self, event: Event) {
        if self.state != Lifecycle::Running {
            debug!("Ignoring event while {:?}", self.state);
            return;
        }
        match event {
            Event::Nmea(message) => {
                self.handle_nmea(&message);
            },
            Event::Pose { channel, pose } => match self.frames.handle_pose(&channel, &pose) {
                Ok(true) => {},
                Ok(false) => debug!("No frame is updated from channel '{}'", channel),
                Err(e) => warn!("Ignoring pose on '{}': {}", channel, e),
            },
            Event::SourceClosed(name) => {
                info!("Input {} closed", name);
                self.open_sources = self.open_sources.saturating_sub(1);
                if self.open_sources == 0 {
                    self.state = Lifecycle::ShuttingDown;
                }
            },
            Event::Shutdown => {
                info!("Termination requested");
                self.state = Lifecycle::ShuttingDown;
            },
        }
    }

    /// Decodes and reconciles one sentence. Returns the published estimate.
    pub fn handle_nmea(&mut self, message: &NmeaMessage) -> Option<GpsToLocalEstimate> {
        let fix = match self.decoder.decode(message) {
            Ok(fix) => fix,
            Err(e) => {
                debug!("Dropping sentence {:?}: {}", message.nmea, e);
                return None;
            },
        };
        self.reconciler
            .handle_fix(&fix, &self.frames, &mut self.publisher, &mut self.latest)
    }

    /// Runs the rebroadcaster if its deadline has passed at `now`
    pub fn poll_timer(&mut self, now: Instant) {
        if let Some(timer) = &mut self.rebroadcaster {
            if timer.poll(now) {
                timer.tick(self.latest.as_ref(), &mut self.publisher);
            }
        }
    }
}
