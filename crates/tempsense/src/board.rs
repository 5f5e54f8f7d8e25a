//! Top-level readout board.
//!
//! Wires the periodic trigger, the transaction sequencer, the bus
//! master engine and (optionally) an ADT7420 model on the shared
//! two-wire bus.
//!
//! # Tick loop
//!
//! Each system tick, in dependency order:
//! 1. Trigger timer: may emit the readout pulse
//! 2. Bus master engine (its bit clock ticks first internally),
//!    consuming the request the sequencer produced on the PREVIOUS tick
//! 3. Sensor model: observes the lines the master just drove
//! 4. Sequencer: reacts to the engine's busy/error/data outputs; its
//!    new request is stored for the next tick
//!
//! The stored request is what keeps the sequencer/engine feedback pair
//! free of in-tick cycles: each side only ever sees the other's
//! previous snapshot. The board reset input is active-high; component
//! reset lines that idle the other way are inverted at this wiring
//! point, which in simulation simply means every `reset()` call below.

use adi_adt7420::Adt7420;
use sense_core::{Observable, Tickable, Value};
use twi_master::{Request, TwiBus, TwiMaster};

use crate::config::{ConfigError, TempSenseConfig};
use crate::sequencer::TempSequencer;
use crate::trigger::TriggerTimer;

/// Temperature readout board.
pub struct TempSense {
    /// Shared open-drain bus.
    bus: TwiBus,
    /// Bus master protocol engine.
    master: TwiMaster,
    /// Three-transfer readout sequencer.
    sequencer: TempSequencer,
    /// Free-running readout trigger.
    trigger: TriggerTimer,
    /// Sensor model (absent sensors exercise the ack-failure path).
    sensor: Option<Adt7420>,
    /// Sequencer request from the previous tick, consumed by the
    /// engine this tick.
    request: Request,
    /// One-shot trigger injected by the caller.
    manual_trigger: bool,
    /// System ticks elapsed.
    master_clock: u64,
    /// Completed readout cycles.
    cycle_count: u64,
}

impl TempSense {
    /// Build a board from the given configuration.
    pub fn new(config: &TempSenseConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let divisor = config.clock.ticks_per_bit(config.bus_hz).get() as u32;
        let sensor = config.sensor_present.then(|| {
            let mut sensor = Adt7420::new(config.sensor_address);
            sensor.set_stretch(config.sensor_stretch);
            sensor
        });
        Ok(Self {
            bus: TwiBus::new(),
            master: TwiMaster::new(divisor),
            sequencer: TempSequencer::new(config.sensor_address),
            trigger: TriggerTimer::new(config.clock.ticks_per_trigger(config.trigger_hz)),
            sensor,
            request: Request::disabled(),
            manual_trigger: false,
            master_clock: 0,
            cycle_count: 0,
        })
    }

    /// Inject a one-shot trigger pulse on the next tick. Ignored by the
    /// sequencer while a cycle is in flight.
    pub fn trigger_now(&mut self) {
        self.manual_trigger = true;
    }

    /// Tick until a reading is published, up to `max_ticks`.
    ///
    /// Returns the reading, or `None` if no cycle completed in time.
    pub fn run_until_reading(&mut self, max_ticks: u64) -> Option<u16> {
        for _ in 0..max_ticks {
            self.tick();
            if self.sequencer.cycle_done() {
                return Some(self.sequencer.value());
            }
        }
        None
    }

    /// Last published 16-bit reading (first byte high, second byte low).
    #[must_use]
    pub fn reading(&self) -> u16 {
        self.sequencer.value()
    }

    /// At least one cycle has completed since reset.
    #[must_use]
    pub fn has_reading(&self) -> bool {
        self.sequencer.has_reading()
    }

    /// The last completed cycle saw an acknowledgement failure.
    #[must_use]
    pub fn ack_failed(&self) -> bool {
        self.sequencer.ack_failed()
    }

    /// A readout cycle is in flight.
    #[must_use]
    pub fn busy(&self) -> bool {
        self.sequencer.busy()
    }

    /// A reading was published on the current tick.
    #[must_use]
    pub fn cycle_done(&self) -> bool {
        self.sequencer.cycle_done()
    }

    /// System ticks elapsed since construction or reset.
    #[must_use]
    pub fn master_clock(&self) -> u64 {
        self.master_clock
    }

    /// Completed readout cycles since construction or reset.
    #[must_use]
    pub fn cycle_count(&self) -> u64 {
        self.cycle_count
    }

    /// Reference to the shared bus (line-level inspection).
    #[must_use]
    pub fn bus(&self) -> &TwiBus {
        &self.bus
    }

    /// Reference to the bus master engine.
    #[must_use]
    pub fn master(&self) -> &TwiMaster {
        &self.master
    }

    /// Reference to the sensor model, if present.
    #[must_use]
    pub fn sensor(&self) -> Option<&Adt7420> {
        self.sensor.as_ref()
    }

    /// Mutable reference to the sensor model, if present.
    pub fn sensor_mut(&mut self) -> Option<&mut Adt7420> {
        self.sensor.as_mut()
    }
}

impl Tickable for TempSense {
    fn tick(&mut self) {
        self.master_clock += 1;

        // 1. Trigger: periodic pulse, or one injected by the caller.
        let pulse = self.trigger.tick() || self.manual_trigger;
        self.manual_trigger = false;

        // 2. Bus master engine, consuming last tick's request.
        self.master.tick(&self.request, &mut self.bus);

        // 3. Sensor model sees the lines as the master left them.
        if let Some(sensor) = &mut self.sensor {
            sensor.tick(&mut self.bus);
        }

        // 4. Sequencer; its request is consumed next tick.
        self.sequencer.tick(
            pulse,
            self.master.busy(),
            self.master.ack_error(),
            self.master.read_byte(),
        );
        self.request = self.sequencer.request();

        if self.sequencer.cycle_done() {
            self.cycle_count += 1;
            if self.sequencer.ack_failed() {
                log::warn!(
                    "readout cycle {} completed with ack failure, reading {:#06X}",
                    self.cycle_count,
                    self.sequencer.value()
                );
            } else {
                log::debug!(
                    "readout cycle {} complete, reading {:#06X}",
                    self.cycle_count,
                    self.sequencer.value()
                );
            }
        }
    }

    fn reset(&mut self) {
        self.master.reset();
        self.sequencer.reset();
        self.trigger.reset();
        if let Some(sensor) = &mut self.sensor {
            sensor.reset();
        }
        self.bus.release_all();
        self.request = Request::disabled();
        self.manual_trigger = false;
        self.master_clock = 0;
        self.cycle_count = 0;
    }
}

impl Observable for TempSense {
    fn query(&self, path: &str) -> Option<Value> {
        if let Some(rest) = path.strip_prefix("master.") {
            match rest {
                "state" => Some(self.master.state().name().into()),
                "busy" => Some(self.master.busy().into()),
                "ack_error" => Some(self.master.ack_error().into()),
                "read_byte" => Some(self.master.read_byte().into()),
                "stretched" => Some(self.master.stretched().into()),
                _ => None,
            }
        } else if let Some(rest) = path.strip_prefix("sequencer.") {
            match rest {
                "state" => Some(self.sequencer.state().name().into()),
                "busy" => Some(self.sequencer.busy().into()),
                _ => None,
            }
        } else if let Some(rest) = path.strip_prefix("bus.") {
            match rest {
                "scl" => Some(self.bus.scl().into()),
                "sda" => Some(self.bus.sda().into()),
                _ => None,
            }
        } else if let Some(rest) = path.strip_prefix("sensor.") {
            let sensor = self.sensor.as_ref()?;
            match rest {
                "pointer" => Some(sensor.pointer().into()),
                "raw" => Some(sensor.temperature_raw().into()),
                _ => None,
            }
        } else {
            match path {
                "busy" => Some(self.busy().into()),
                "reading" => Some(self.reading().into()),
                "ack_failed" => Some(self.ack_failed().into()),
                "master_clock" => Some(self.master_clock.into()),
                "cycle_count" => Some(self.cycle_count.into()),
                _ => None,
            }
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "busy",
            "reading",
            "ack_failed",
            "master_clock",
            "cycle_count",
            "master.state",
            "master.busy",
            "master.ack_error",
            "master.read_byte",
            "master.stretched",
            "sequencer.state",
            "sequencer.busy",
            "bus.scl",
            "bus.sda",
            "sensor.pointer",
            "sensor.raw",
        ]
    }
}
