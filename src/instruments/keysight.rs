//! Driver shared by the Keysight InfiniiVision (MSO-X/DSO-X 3000A) and
//! Infiniium (UXR, MXR) oscilloscopes. Model differences come from the
//! [`Variant`] the driver is built with.

use std::{
    fmt, fs,
    path::Path,
    str::FromStr,
    thread::sleep,
    time::{Duration, Instant},
};

use log::{debug, info, warn};

use crate::{
    config::Settings,
    error::Error,
    scpi::{com_cmd, definite_block, scpi_error::ScpiError, Command, Scpi},
    session::Session,
    units::{Polished, OVER_RANGE},
    visa::Resource,
};

use super::{
    channel::Channel,
    measure,
    models::{Hardcopy, Variant},
    statistics::{parse_statistics, StatRecord},
};

/// Depth of the SCPI error queue on these instruments.
const ERROR_QUEUE_DEPTH: usize = 30;

/// Parsed `*IDN?` reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub manufacturer: String,
    pub model: String,
    pub serial: String,
    pub firmware: String,
}

impl FromStr for Identity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = s.trim().splitn(4, ',').map(str::trim).collect();
        match fields[..] {
            [manufacturer, model, serial, firmware] => Ok(Identity {
                manufacturer: manufacturer.to_string(),
                model: model.to_string(),
                serial: serial.to_string(),
                firmware: firmware.to_string(),
            }),
            _ => Err(Error::MalformedReply(format!("identification '{}'", s))),
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} (serial {}, firmware {})",
            self.manufacturer, self.model, self.serial, self.firmware
        )
    }
}

/// Colors accepted by `DISPlay:ANN:COLor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationColor {
    Ch1,
    Ch2,
    Ch3,
    Ch4,
    Digital,
    Math,
    Reference,
    Marker,
    White,
    Red,
}

impl AnnotationColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnnotationColor::Ch1 => "CH1",
            AnnotationColor::Ch2 => "CH2",
            AnnotationColor::Ch3 => "CH3",
            AnnotationColor::Ch4 => "CH4",
            AnnotationColor::Digital => "DIG",
            AnnotationColor::Math => "MATH",
            AnnotationColor::Reference => "REF",
            AnnotationColor::Marker => "MARK",
            AnnotationColor::White => "WHIT",
            AnnotationColor::Red => "RED",
        }
    }

    /// The trace color of an analog channel.
    pub fn of(channel: Channel) -> Option<Self> {
        match channel {
            Channel::Analog(1) => Some(AnnotationColor::Ch1),
            Channel::Analog(2) => Some(AnnotationColor::Ch2),
            Channel::Analog(3) => Some(AnnotationColor::Ch3),
            Channel::Analog(4) => Some(AnnotationColor::Ch4),
            Channel::Digital(_) | Channel::Pod(_) => Some(AnnotationColor::Digital),
            Channel::Math | Channel::Function(_) => Some(AnnotationColor::Math),
            Channel::WMemory(_) => Some(AnnotationColor::Reference),
            Channel::Analog(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Background {
    #[default]
    Transparent,
    Opaque,
    Inverted,
}

impl Background {
    pub fn as_str(&self) -> &'static str {
        match self {
            Background::Transparent => "TRAN",
            Background::Opaque => "OPAQue",
            Background::Inverted => "INVerted",
        }
    }
}

pub struct Oscilloscope<S: Scpi = Session> {
    link: S,
    variant: &'static Variant,
    channel: Channel,
    wait: Duration,
}

impl Oscilloscope<Session> {
    /// Opens the resource named in `settings`. The model is taken from the
    /// settings when given, otherwise detected with `*IDN?`.
    pub fn open(settings: &Settings) -> Result<Self, Error> {
        let resource: Resource = settings.resource.parse()?;
        let named = match settings.model.as_deref() {
            Some(name) => {
                Some(Variant::by_name(name).ok_or_else(|| Error::UnknownModel(name.to_string()))?)
            }
            None => None,
        };
        let mut session = Session::open(&resource, settings.timeout())?;
        let detected = match named {
            Some(variant) => Ok(variant),
            None => identify_variant(&mut session),
        };
        let variant = match detected {
            Ok(variant) => variant,
            Err(e) => {
                if let Err(close) = session.close() {
                    warn!("closing {} failed: {}", resource, close);
                }
                return Err(e);
            }
        };
        info!("connected to {} at {}", variant.description, resource);
        Ok(Oscilloscope::new(session, variant, settings.wait()))
    }

    /// Device clear.
    pub fn clear(&mut self) -> Result<(), Error> {
        Ok(self.link.clear()?)
    }

    /// Gives the front panel back to the operator.
    pub fn set_local(&mut self) -> Result<(), Error> {
        Ok(self.link.set_local()?)
    }

    pub fn close(self) -> Result<(), Error> {
        self.link.close()
    }
}

impl<S: Scpi> Oscilloscope<S> {
    pub fn new(link: S, variant: &'static Variant, wait: Duration) -> Self {
        Self {
            link,
            variant,
            channel: Channel::default(),
            wait,
        }
    }

    /// Builds the driver for whatever model answers `*IDN?` on `link`.
    pub fn detect(mut link: S, wait: Duration) -> Result<Self, Error> {
        let variant = identify_variant(&mut link)?;
        Ok(Self::new(link, variant, wait))
    }

    pub fn variant(&self) -> &'static Variant {
        self.variant
    }

    /// Source used when an operation is given no channel.
    pub fn channel(&self) -> Channel {
        self.channel
    }

    pub fn set_channel(&mut self, channel: Channel) -> Result<(), Error> {
        self.channel = channel.validate(self.variant)?;
        Ok(())
    }

    pub fn wait(&self) -> Duration {
        self.wait
    }

    pub fn set_wait(&mut self, wait: Duration) {
        self.wait = wait;
    }

    pub fn link(&self) -> &S {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut S {
        &mut self.link
    }

    pub fn into_link(self) -> S {
        self.link
    }

    /// Sends a command, then pauses for the configured wait.
    pub fn write<C: AsRef<str>>(&mut self, command: C) -> Result<(), Error> {
        self.link.scpi_send(command.as_ref())?;
        if !self.wait.is_zero() {
            sleep(self.wait);
        }
        Ok(())
    }

    pub fn query<C: AsRef<str>>(&mut self, command: C) -> Result<String, Error> {
        Ok(self.link.scpi_query(command.as_ref())?)
    }

    pub fn query_number<C: AsRef<str>>(&mut self, command: C) -> Result<f64, Error> {
        let reply = self.query(command)?;
        reply
            .parse::<f64>()
            .map_err(|_| Error::MalformedReply(format!("'{}' is not a number", reply)))
    }

    pub fn identify(&mut self) -> Result<Identity, Error> {
        self.query(Command::from(com_cmd::Query::IDN))?.parse()
    }

    /// SCPI name of `channel`, or of the default channel, checked against
    /// the model.
    pub fn channel_str(&self, channel: Option<Channel>) -> Result<String, Error> {
        Ok(channel
            .unwrap_or(self.channel)
            .validate(self.variant)?
            .scpi())
    }

    /// Autoscales the given channels, or the default channel when none are
    /// given. Nothing is sent unless every channel is valid.
    pub fn setup_autoscale(&mut self, channels: &[Channel]) -> Result<(), Error> {
        let default = [self.channel];
        let channels = if channels.is_empty() {
            &default[..]
        } else {
            channels
        };
        if channels.len() > self.variant.autoscale_limit {
            return Err(Error::TooManyChannels {
                count: channels.len(),
                max: self.variant.autoscale_limit,
                model: self.variant.name,
            });
        }
        let sources = channels
            .iter()
            .map(|c| c.validate(self.variant).map(|c| c.scpi()))
            .collect::<Result<Vec<_>, _>>()?;
        if let [single] = channels {
            self.channel = *single;
        }

        if let Some(placement) = self.variant.placement {
            self.write(Command::new("AUToscale:PLACement").para(placement.as_str()))?;
        }
        self.write(Command::new("AUToscale").para(sources.join(",")))
    }

    /// Reads every row of the measurement statistics window.
    pub fn measure_statistics(&mut self) -> Result<Vec<StatRecord>, Error> {
        if self.variant.statistics_menu {
            self.write("SYSTem:MENU MEASure")?;
            self.write("MEASure:STATistics:DISPlay ON")?;
        }
        self.write("MEASure:STATistics ON")?;
        let reply = self.query("MEASure:RESults?")?;
        parse_statistics(&reply, self.variant.count_rule)
    }

    /// Shows `text` on screen. A literal `\n` (two characters) breaks the line.
    pub fn annotate(
        &mut self,
        text: &str,
        color: Option<AnnotationColor>,
        background: Background,
    ) -> Result<(), Error> {
        if let Some(color) = color {
            self.annotate_color(color)?;
        }
        self.write(Command::new("DISPlay:ANN:BACKground").para(background.as_str()))?;
        self.write(Command::new("DISPlay:ANN:TEXT").quoted(text))?;
        self.write("DISPlay:ANN ON")
    }

    pub fn annotate_color(&mut self, color: AnnotationColor) -> Result<(), Error> {
        self.write(Command::new("DISPlay:ANN:COLor").para(color.as_str()))
    }

    pub fn annotate_off(&mut self) -> Result<(), Error> {
        self.write("DISPlay:ANN OFF")
    }

    /// Formats a measurement value for display, with the unit of the named
    /// measurement when it is known.
    pub fn polish(&self, value: f64, name: Option<&str>) -> Polished {
        let unit = name.and_then(measure::lookup).and_then(|m| m.unit);
        Polished::new(value, unit)
    }

    /// Reads one of the named measurements of [`measure::MEASUREMENTS`].
    /// With `install` the measurement is also added to the statistics
    /// window.
    pub fn measure(
        &mut self,
        name: &str,
        channel: Option<Channel>,
        install: bool,
    ) -> Result<f64, Error> {
        let measurement =
            measure::lookup(name).ok_or_else(|| Error::UnknownMeasurement(name.to_string()))?;
        let source = self.channel_str(channel)?;
        if install {
            self.write(measurement.install_command(&source))?;
        }
        self.query_number(measurement.query_command(&source))
    }

    pub fn measure_volt_average(
        &mut self,
        channel: Option<Channel>,
        install: bool,
    ) -> Result<f64, Error> {
        self.measure("Average - Full Screen", channel, install)
    }

    pub fn measure_pos_pulse_width(
        &mut self,
        channel: Option<Channel>,
        install: bool,
    ) -> Result<f64, Error> {
        self.measure("+ Width", channel, install)
    }

    /// Frequency seen by the built-in digital voltmeter in AC RMS mode.
    ///
    /// Polls every `poll` until the DVM reports a frequency or `timeout`
    /// runs out, in which case the last (over-range) reading is returned.
    pub fn measure_dvm_freq(
        &mut self,
        channel: Option<Channel>,
        timeout: Duration,
        poll: Duration,
    ) -> Result<f64, Error> {
        if !self.variant.dvm {
            return Err(Error::Unsupported {
                feature: "DVM frequency",
                model: self.variant.name,
            });
        }
        let channel = channel.unwrap_or(self.channel).validate(self.variant)?;
        if !channel.is_analog() {
            return Err(Error::InvalidChannel {
                channel: channel.to_string(),
                model: self.variant.name,
            });
        }
        self.write(Command::new("DVM:SOURce").para(channel.scpi()))?;
        self.write("DVM:ENABle ON")?;
        self.write("DVM:MODE ACRMS")?;

        let start = Instant::now();
        loop {
            let value = self.query_number("DVM:FREQuency?")?;
            if value < OVER_RANGE {
                return Ok(value);
            }
            if start.elapsed() >= timeout {
                warn!("DVM found no frequency on {} within {:?}", channel.scpi(), timeout);
                return Ok(value);
            }
            sleep(poll);
        }
    }

    pub fn is_output_on(&mut self, channel: Option<Channel>) -> Result<bool, Error> {
        let source = self.channel_str(channel)?;
        let reply = self.query(format!("{}:DISPlay?", source))?;
        match reply.trim_start_matches('+') {
            "1" | "ON" => Ok(true),
            "0" | "OFF" => Ok(false),
            _ => Err(Error::MalformedReply(format!("display state '{}'", reply))),
        }
    }

    pub fn output_on(&mut self, channel: Option<Channel>) -> Result<(), Error> {
        let source = self.channel_str(channel)?;
        self.write(format!("{}:DISPlay ON", source))
    }

    pub fn output_off(&mut self, channel: Option<Channel>) -> Result<(), Error> {
        let source = self.channel_str(channel)?;
        self.write(format!("{}:DISPlay OFF", source))
    }

    pub fn set_label(&mut self, channel: Option<Channel>, label: &str) -> Result<(), Error> {
        let source = self.channel_str(channel)?;
        self.write(Command::new(format!("{}:LABel", source)).quoted(label))
    }

    pub fn label_display(&mut self, on: bool) -> Result<(), Error> {
        self.write(format!("DISPlay:LABel {}", if on { "ON" } else { "OFF" }))
    }

    /// Saves a PNG screenshot to `path`.
    pub fn hardcopy<P: AsRef<Path>>(&mut self, path: P) -> Result<(), Error> {
        let path = path.as_ref();
        let command = match self.variant.hardcopy {
            Hardcopy::InkSaverPng => {
                self.write("HARDcopy:INKSaver OFF")?;
                "DISPlay:DATA? PNG, COLor"
            }
            Hardcopy::Png => "DISPlay:DATA? PNG",
        };
        self.link.scpi_send(command)?;
        let raw = self.link.scpi_read_raw()?;
        let image = definite_block(&raw)?;
        fs::write(path, image)?;
        info!("saved {} byte screenshot to {}", image.len(), path.display());
        Ok(())
    }

    /// Drains the instrument's error queue.
    pub fn errors(&mut self) -> Result<Vec<ScpiError>, Error> {
        let mut errors = Vec::new();
        while let Some(error) = self.link.next_error()? {
            warn!("instrument reported {}", error);
            errors.push(error);
            if errors.len() >= ERROR_QUEUE_DEPTH {
                break;
            }
        }
        Ok(errors)
    }
}

/// Model of whatever answers `*IDN?` on `link`.
fn identify_variant<S: Scpi>(link: &mut S) -> Result<&'static Variant, Error> {
    let identity: Identity = link
        .scpi_query(Command::from(com_cmd::Query::IDN))?
        .parse()?;
    let variant = Variant::detect(&identity.model)
        .ok_or_else(|| Error::UnknownModel(identity.model.clone()))?;
    debug!("{} is a {}", identity, variant);
    Ok(variant)
}
