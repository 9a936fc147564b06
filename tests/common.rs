#![allow(unused)]
use std::sync::Once;
use std::time::{Duration, Instant};

use ratesteer::{AbrController, Actuator, Adjustment, Bitrate, Input};

pub fn init_log() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

    static START: Once = Once::new();

    START.call_once(|| {
        tracing_subscriber::registry()
            .with(fmt::layer())
            .with(env_filter)
            .init();
    });
}

/// Actuator call as seen by the encoder.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Bitrate(u32),
    Profile(u32, u32, Duration),
}

/// Encoder stand-in that records every call and tracks the configured bitrate.
#[derive(Debug)]
pub struct Encoder {
    pub bitrate: u32,
    pub calls: Vec<Call>,
}

impl Encoder {
    pub fn new(bitrate: u32) -> Self {
        Encoder {
            bitrate,
            calls: vec![],
        }
    }

    pub fn bitrate_calls(&self) -> Vec<u32> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Bitrate(b) => Some(*b),
                _ => None,
            })
            .collect()
    }
}

impl Actuator for Encoder {
    fn set_bitrate(&mut self, bits: u32) {
        self.bitrate = bits;
        self.calls.push(Call::Bitrate(bits));
    }

    fn set_profile(&mut self, width: u32, height: u32, keyframe_interval: Duration) {
        self.calls.push(Call::Profile(width, height, keyframe_interval));
    }
}

/// Drives a controller and an encoder from a simulated clock.
pub struct Session {
    pub abr: AbrController,
    pub encoder: Encoder,
    pub start: Instant,
    pub elapsed: Duration,
    pub adjustments: Vec<Adjustment>,
}

impl Session {
    pub fn new(abr: AbrController, encoder_bitrate: u32) -> Self {
        Session {
            abr,
            encoder: Encoder::new(encoder_bitrate),
            start: Instant::now(),
            elapsed: Duration::ZERO,
            adjustments: vec![],
        }
    }

    pub fn now(&self) -> Instant {
        self.start + self.elapsed
    }

    pub fn advance(&mut self, d: Duration) {
        self.elapsed += d;
    }

    pub fn tick(&mut self, bps: u32) {
        self.input(Input::StatsTick {
            bytes_per_sec: bps / 8,
        });
    }

    pub fn sufficient(&mut self, bps: u32) {
        self.input(Input::SufficientBandwidth {
            now: self.now(),
            bytes_per_sec: bps / 8,
            current_bitrate: self.encoder.bitrate,
        });
    }

    pub fn insufficient(&mut self, bps: u32) {
        self.input(Input::InsufficientBandwidth {
            now: self.now(),
            bytes_per_sec: bps / 8,
            current_bitrate: self.encoder.bitrate,
        });
    }

    fn input(&mut self, input: Input) {
        self.abr.handle_input(input);
        while let Some(adjustment) = self.abr.poll_adjustment() {
            adjustment.apply(&mut self.encoder);
            self.adjustments.push(adjustment);
        }
    }
}
