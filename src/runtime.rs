//! Wiring and the 1 Hz driver loop.
//!
//! [`Monitor::setup`] claims the outputs, attaches the pulse callback and
//! derives QFF.  Any failure there is fatal and nothing is left running.
//! [`Monitor::run`] then owns the calling thread until stopped:
//!
//! ```text
//!   ┌──────────── every second ────────────┐
//!   │ sleep to boundary → commands → step  │
//!   └──────────────────────────────────────┘
//!   exit: HV off → indicator stop → join → Stopped
//! ```

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

use log::{error, info};

use crate::app::commands::AppCommand;
use crate::app::events::AppEvent;
use crate::app::ports::{BarometerPort, ClockPort, EdgeTrigger, EventSink, GpioPort};
use crate::app::service::MonitorService;
use crate::config::MonitorConfig;
use crate::drivers::threads::spawn_named;
use crate::error::{Error, SetupError};
use crate::pins;
use crate::shared::{handle_edge, SharedState};

/// Stack for the indicator thread (KB).
const INDICATOR_STACK_KB: usize = 32;

/// Cloneable handle that stops a running [`Monitor`] from another thread.
#[derive(Clone)]
pub struct StopHandle {
    shared: Arc<SharedState>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.shared.stop();
    }
}

pub struct Monitor<B: BarometerPort> {
    service: MonitorService<B>,
    shared: Arc<SharedState>,
    gpio: Arc<dyn GpioPort>,
    clock: Arc<dyn ClockPort>,
    commands_tx: Sender<AppCommand>,
    commands_rx: Receiver<AppCommand>,
}

impl<B: BarometerPort> Monitor<B> {
    /// Validate config, claim GPIO, attach the pulse callback and set QFF.
    pub fn setup(
        config: MonitorConfig,
        barometer: B,
        gpio: Arc<dyn GpioPort>,
        clock: Arc<dyn ClockPort>,
    ) -> Result<Self, Error> {
        config.validate()?;

        let shared = Arc::new(SharedState::new(&config, gpio.clone()).map_err(SetupError::Gpio)?);

        let edge_shared = shared.clone();
        gpio.register_edge_callback(
            pins::GEIGER_PIN,
            EdgeTrigger::Both,
            Box::new(move |ts_ns| {
                handle_edge(&edge_shared, ts_ns);
            }),
        )
        .map_err(SetupError::Gpio)?;

        let station = config.station;
        let mut service = MonitorService::new(config, barometer, shared.clone());
        service.set_qff(&station)?;

        let (commands_tx, commands_rx) = mpsc::channel();
        info!("monitor setup complete");
        Ok(Self {
            service,
            shared,
            gpio,
            clock,
            commands_tx,
            commands_rx,
        })
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            shared: self.shared.clone(),
        }
    }

    /// Sender for commands applied at the top of each cycle.
    pub fn command_sender(&self) -> Sender<AppCommand> {
        self.commands_tx.clone()
    }

    pub fn service(&self) -> &MonitorService<B> {
        &self.service
    }

    pub fn hv_on(&self) -> bool {
        self.shared.hv_on()
    }

    pub fn second_index(&self) -> usize {
        self.shared.second_index()
    }

    /// Run the 1 Hz loop until stopped.  HV is off when this returns.
    pub fn run(&mut self, sink: &mut impl EventSink) -> Result<(), Error> {
        let indicator = {
            let shared = self.shared.clone();
            let gpio = self.gpio.clone();
            spawn_named("indicator", INDICATOR_STACK_KB, move || {
                shared.indicator.run(gpio.as_ref(), pins::LED_PIN);
            })?
        };

        self.service.start(sink);
        sink.emit(&AppEvent::QffSet(self.service.qff()));

        let mut last_elapsed = self.clock.elapsed_secs();
        while self.shared.is_running() {
            self.clock.sleep_until_next_second();

            while let Ok(cmd) = self.commands_rx.try_recv() {
                self.service.handle_command(cmd, sink);
            }
            if !self.shared.is_running() {
                break;
            }

            let elapsed = self.clock.elapsed_secs();
            if elapsed == last_elapsed {
                continue;
            }
            last_elapsed = elapsed;
            self.service.step(elapsed, sink);
        }

        self.service.shutdown(sink);
        self.shared.indicator.shutdown();
        if indicator.join().is_err() {
            error!("indicator thread panicked");
        }
        sink.emit(&AppEvent::Stopped);
        info!("monitor stopped");
        Ok(())
    }
}
