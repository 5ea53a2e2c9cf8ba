//! Smartshade — host simulation entry point.
//!
//! Wires the decision engine to in-memory adapters simulating a home: a
//! handful of covers, a sun track, a weather feed, and lockout sensors.
//! Runs a full simulated day at the 60-second cycle cadence and logs every
//! decision that moves a cover.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                  Adapters (outer ring)                   │
//! │                                                          │
//! │  SimCovers      SimWeather      SimLockouts    SimClock  │
//! │  (CoverPort)  (EnvironmentPort) (LockoutPort)  (Clock)   │
//! │                                                          │
//! │  ────────────── Port Trait Boundary ──────────────       │
//! │                                                          │
//! │  ┌────────────────────────────────────────────────────┐  │
//! │  │         AutomationService (pure logic)             │  │
//! │  │  Gate · Lock · Policy · Override · Resolver        │  │
//! │  └────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────┘
//! ```

use std::cell::Cell;
use std::collections::{HashMap, HashSet};

use anyhow::{anyhow, Result};
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Timelike, Utc};
use log::{info, LevelFilter};

use smartshade::app::commands::EngineCommand;
use smartshade::app::events::CycleSummary;
use smartshade::app::ports::{
    Clock, CoverPort, CoverState, DecisionSink, EnvironmentPort, ForecastDay, LockoutPort,
    PortError,
};
use smartshade::app::service::AutomationService;
use smartshade::config::{AutomationConfig, CoverConfig, TimeRange};
use smartshade::decision::{CoverCommand, Decision};
use smartshade::lock::LockMode;
use smartshade::sun::SunPosition;

// ── Console logger ────────────────────────────────────────────

struct ConsoleLogger;

impl log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{:5}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: ConsoleLogger = ConsoleLogger;

fn init_logger() -> Result<()> {
    log::set_logger(&LOGGER).map_err(|e| anyhow!("logger init failed: {e}"))?;
    log::set_max_level(LevelFilter::Info);
    Ok(())
}

// ── Simulated home ────────────────────────────────────────────

struct SimDevice {
    position: u8,
    supports_position: bool,
}

struct SimCovers {
    devices: HashMap<String, SimDevice>,
}

impl SimCovers {
    fn position(&self, id: &str) -> Option<u8> {
        self.devices.get(id).map(|d| d.position)
    }

    fn nudge(&mut self, id: &str, position: u8) {
        if let Some(device) = self.devices.get_mut(id) {
            device.position = position;
        }
    }
}

impl CoverPort for SimCovers {
    fn read_state(&mut self, id: &str) -> std::result::Result<CoverState, PortError> {
        let device = self.devices.get(id).ok_or(PortError::Unavailable)?;
        Ok(CoverState {
            position: Some(device.position),
            moving: false,
            supports_position: device.supports_position,
        })
    }

    fn issue_command(
        &mut self,
        id: &str,
        command: CoverCommand,
    ) -> std::result::Result<(), PortError> {
        let device = self.devices.get_mut(id).ok_or(PortError::Unavailable)?;
        // The simulation completes moves instantly.
        device.position = match command {
            CoverCommand::SetPosition(p) => p,
            CoverCommand::Open => 100,
            CoverCommand::Close => 0,
        };
        Ok(())
    }
}

struct SimWeather {
    sun: SunPosition,
    forecast_today: f64,
    forecast_tomorrow: f64,
    condition: String,
}

impl SimWeather {
    /// Crude daily sun track: up at 06:00, down at 21:00, peak 45°.
    fn follow(&mut self, minute_of_day: u32) {
        let m = f64::from(minute_of_day);
        if (360.0..=1260.0).contains(&m) {
            self.sun.elevation = 45.0 * (std::f64::consts::PI * (m - 360.0) / 900.0).sin();
            self.sun.azimuth = 90.0 + (m - 360.0) * 0.2;
        } else {
            self.sun.elevation = -8.0;
            self.sun.azimuth = 0.0;
        }
    }
}

impl EnvironmentPort for SimWeather {
    fn sun_position(&mut self) -> std::result::Result<SunPosition, PortError> {
        Ok(self.sun)
    }

    fn forecast_max_temp(&mut self, day: ForecastDay) -> std::result::Result<f64, PortError> {
        Ok(match day {
            ForecastDay::Today => self.forecast_today,
            ForecastDay::Tomorrow => self.forecast_tomorrow,
        })
    }

    fn weather_condition(&mut self) -> std::result::Result<String, PortError> {
        Ok(self.condition.clone())
    }
}

struct SimLockouts {
    open: HashSet<String>,
}

impl LockoutPort for SimLockouts {
    fn is_open(&mut self, id: &str) -> std::result::Result<bool, PortError> {
        Ok(self.open.contains(id))
    }
}

struct SimClock {
    now: Cell<DateTime<Utc>>,
    offset: FixedOffset,
}

impl SimClock {
    fn new(start: DateTime<Utc>, offset: FixedOffset) -> Self {
        Self {
            now: Cell::new(start),
            offset,
        }
    }

    fn advance(&self, seconds: i64) {
        self.now.set(self.now.get() + Duration::seconds(seconds));
    }

    fn minute_of_day(&self) -> u32 {
        let local = self.now.get().with_timezone(&self.offset);
        local.time().hour() * 60 + local.time().minute()
    }
}

impl Clock for SimClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }

    fn local_time(&self) -> NaiveTime {
        self.now.get().with_timezone(&self.offset).time()
    }

    fn today(&self) -> NaiveDate {
        self.now.get().with_timezone(&self.offset).date_naive()
    }

    fn sunset(&self, day: NaiveDate) -> Option<DateTime<Utc>> {
        let local = day.and_time(NaiveTime::from_hms_opt(21, 0, 0)?);
        self.offset
            .from_local_datetime(&local)
            .single()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

// ── Decision sink ─────────────────────────────────────────────

struct LogSink;

impl DecisionSink for LogSink {
    fn decision(&mut self, decision: &Decision) {
        if decision.moved {
            info!(
                "decision [{}]: {:?} -> {:?} ({})",
                decision.cover, decision.current, decision.target, decision.reason
            );
        }
    }

    fn cycle_completed(&mut self, summary: &CycleSummary) {
        if summary.covers_moved > 0 {
            info!(
                "cycle {}: moved {}/{} (hot={:?}, elevation={:?})",
                summary.cycle,
                summary.covers_moved,
                summary.covers_total,
                summary.temp_hot,
                summary.sun_elevation
            );
        }
    }
}

// ── Entry point ───────────────────────────────────────────────

fn main() -> Result<()> {
    init_logger()?;

    let mut config = AutomationConfig::default();
    config.evening_closure.enabled = true;
    config.evening_closure.delay_secs = 900;
    config.disabled_range = Some(TimeRange::new(
        NaiveTime::from_hms_opt(0, 0, 0).ok_or_else(|| anyhow!("bad time literal"))?,
        NaiveTime::from_hms_opt(5, 0, 0).ok_or_else(|| anyhow!("bad time literal"))?,
    ));

    let mut south = CoverConfig::new("cover.living_room_south");
    south.azimuth = Some(180.0);
    south.lockout_sensors = vec!["binary_sensor.patio_door".to_owned()];
    south.evening_closure = true;

    let mut west = CoverConfig::new("cover.bedroom_west");
    west.azimuth = Some(270.0);
    west.max_position = Some(90);
    west.evening_closure = true;

    // No azimuth: temperature policy only.
    let north = CoverConfig::new("cover.stairwell_north");

    let mut service = AutomationService::new(config, vec![south, west, north])?;

    let offset = FixedOffset::east_opt(2 * 3600).ok_or_else(|| anyhow!("bad offset"))?;
    let start = Utc
        .with_ymd_and_hms(2025, 7, 12, 4, 0, 0) // 06:00 local
        .single()
        .ok_or_else(|| anyhow!("bad start instant"))?;
    let clock = SimClock::new(start, offset);

    let mut covers = SimCovers {
        devices: HashMap::from([
            (
                "cover.living_room_south".to_owned(),
                SimDevice {
                    position: 100,
                    supports_position: true,
                },
            ),
            (
                "cover.bedroom_west".to_owned(),
                SimDevice {
                    position: 100,
                    supports_position: true,
                },
            ),
            (
                "cover.stairwell_north".to_owned(),
                SimDevice {
                    position: 100,
                    supports_position: false,
                },
            ),
        ]),
    };
    let mut weather = SimWeather {
        sun: SunPosition {
            elevation: -8.0,
            azimuth: 0.0,
        },
        forecast_today: 29.0,
        forecast_tomorrow: 21.0,
        condition: "sunny".to_owned(),
    };
    let mut lockouts = SimLockouts {
        open: HashSet::new(),
    };
    let mut sink = LogSink;

    info!("simulating one day at 60 s cycles");

    // 06:00 to 23:00 local, one cycle per minute.
    for cycle in 0..(17 * 60) {
        weather.follow(clock.minute_of_day());

        // Scripted events along the day.
        match cycle {
            300 => {
                info!("(sim) patio door opened");
                lockouts.open.insert("binary_sensor.patio_door".to_owned());
            }
            420 => {
                info!("(sim) patio door closed");
                lockouts.open.remove("binary_sensor.patio_door");
            }
            480 => {
                info!("(sim) resident adjusts the west cover by hand");
                covers.nudge("cover.bedroom_west", 55);
            }
            600 => {
                info!("(sim) operator forces all covers open");
                service.handle_command(EngineCommand::SetLockMode(LockMode::ForceOpen))?;
            }
            660 => {
                info!("(sim) operator unlocks");
                service.handle_command(EngineCommand::SetLockMode(LockMode::Unlocked))?;
            }
            _ => {}
        }

        if let Err(e) =
            service.run_cycle(&mut covers, &mut weather, &mut lockouts, &clock, &mut sink)
        {
            log::error!("cycle failed: {e}");
        }

        // Lock-mode changes request an out-of-band cycle; run it now,
        // coalesced to a single extra pass.
        if service.take_refresh_request() {
            if let Err(e) =
                service.run_cycle(&mut covers, &mut weather, &mut lockouts, &clock, &mut sink)
            {
                log::error!("refresh cycle failed: {e}");
            }
        }

        clock.advance(60);
    }

    info!(
        "simulation done after {} cycles; final positions: south={:?} west={:?} north={:?}",
        service.cycle_count(),
        covers.position("cover.living_room_south"),
        covers.position("cover.bedroom_west"),
        covers.position("cover.stairwell_north"),
    );
    Ok(())
}
