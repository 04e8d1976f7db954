//! Denon MC2000 transport
//!
//! Opens the controller's MIDI ports and moves raw frames in and out. Frames
//! arrive on an mpsc channel so the event loop handles them one at a time.

use anyhow::{anyhow, Context, Result};
use midir::{MidiInput, MidiInputConnection, MidiOutput, MidiOutputConnection};
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::codec::{self, LedCommand};
use crate::config::AppConfig;
use crate::midi::format_hex;

/// Raw frame received from the controller
#[derive(Debug, Clone)]
pub struct DeviceFrame {
    pub timestamp: Instant,
    pub raw_data: Vec<u8>,
}

/// MIDI connection to the controller
pub struct ControllerDevice {
    input_conn: Option<MidiInputConnection<()>>,
    output_conn: Option<MidiOutputConnection>,
    frame_tx: mpsc::Sender<DeviceFrame>,
    frame_rx: Option<mpsc::Receiver<DeviceFrame>>,
    input_port_name: String,
    output_port_name: String,
}

impl ControllerDevice {
    pub fn new(config: &AppConfig) -> Self {
        let (frame_tx, frame_rx) = mpsc::channel(1000);

        Self {
            input_conn: None,
            output_conn: None,
            frame_tx,
            frame_rx: Some(frame_rx),
            input_port_name: config.midi.input_port.clone(),
            output_port_name: config.midi.output_port.clone(),
        }
    }

    /// List available MIDI input ports
    pub fn list_input_ports() -> Result<Vec<String>> {
        let midi_in = MidiInput::new("MC2000-Map-Scanner")?;
        Ok(midi_in
            .ports()
            .iter()
            .filter_map(|port| midi_in.port_name(port).ok())
            .collect())
    }

    /// List available MIDI output ports
    pub fn list_output_ports() -> Result<Vec<String>> {
        let midi_out = MidiOutput::new("MC2000-Map-Scanner")?;
        Ok(midi_out
            .ports()
            .iter()
            .filter_map(|port| midi_out.port_name(port).ok())
            .collect())
    }

    fn matches(name: &str, pattern: &str) -> bool {
        name.to_lowercase().contains(&pattern.to_lowercase())
    }

    /// Connect to the controller's MIDI ports
    pub fn connect(&mut self) -> Result<()> {
        self.disconnect();

        info!(
            "Connecting to MC2000 - Input: '{}', Output: '{}'",
            self.input_port_name, self.output_port_name
        );

        let midi_in = MidiInput::new("MC2000-Map-Input").context("Failed to create MIDI input")?;
        let (in_port, in_name) = midi_in
            .ports()
            .into_iter()
            .find_map(|port| {
                let name = midi_in.port_name(&port).ok()?;
                Self::matches(&name, &self.input_port_name).then_some((port, name))
            })
            .ok_or_else(|| anyhow!("Input port '{}' not found", self.input_port_name))?;

        info!("Connecting to input port: {}", in_name);

        let frame_tx = self.frame_tx.clone();
        let input_conn = midi_in
            .connect(
                &in_port,
                "MC2000-Map",
                move |_timestamp, data, _| {
                    let frame = DeviceFrame {
                        timestamp: Instant::now(),
                        raw_data: data.to_vec(),
                    };
                    if frame_tx.try_send(frame).is_err() {
                        warn!("Dropped frame (queue full): {}", format_hex(data));
                    }
                },
                (),
            )
            .map_err(|e| anyhow!("Failed to connect to input port: {}", e))?;

        self.input_conn = Some(input_conn);

        let midi_out =
            MidiOutput::new("MC2000-Map-Output").context("Failed to create MIDI output")?;
        let (out_port, out_name) = midi_out
            .ports()
            .into_iter()
            .find_map(|port| {
                let name = midi_out.port_name(&port).ok()?;
                Self::matches(&name, &self.output_port_name).then_some((port, name))
            })
            .ok_or_else(|| anyhow!("Output port '{}' not found", self.output_port_name))?;

        info!("Connecting to output port: {}", out_name);

        let output_conn = midi_out
            .connect(&out_port, "MC2000-Map")
            .map_err(|e| anyhow!("Failed to connect to output port: {}", e))?;

        self.output_conn = Some(output_conn);

        info!("MC2000 connected");
        Ok(())
    }

    /// Disconnect from MIDI ports
    pub fn disconnect(&mut self) {
        if self.input_conn.take().is_some() | self.output_conn.take().is_some() {
            info!("MC2000 disconnected");
        }
    }

    /// Send raw MIDI bytes to the controller
    pub fn send_raw(&mut self, data: &[u8]) -> Result<()> {
        let conn = self
            .output_conn
            .as_mut()
            .ok_or_else(|| anyhow!("Not connected to output port"))?;

        conn.send(data).context("Failed to send raw MIDI data")?;

        debug!("→ {}", format_hex(data));
        Ok(())
    }

    /// Encode and send a batch of LED commands, in order
    pub fn send_leds(&mut self, commands: &[LedCommand]) {
        for command in commands {
            if let Err(e) = self.send_raw(&codec::encode(command)) {
                warn!("Failed to send {:?}: {}", command, e);
            }
        }
    }

    /// Take the frame receiver (for the event loop to consume)
    pub fn take_frame_receiver(&mut self) -> Option<mpsc::Receiver<DeviceFrame>> {
        self.frame_rx.take()
    }
}

impl Drop for ControllerDevice {
    fn drop(&mut self) {
        self.disconnect();
    }
}

/// Print available MIDI ports
pub fn list_ports_formatted() {
    use colored::*;

    println!("\n{}", "=== Available MIDI Ports ===".bold().cyan());

    let sections = [
        ("Input Ports:", ControllerDevice::list_input_ports()),
        ("Output Ports:", ControllerDevice::list_output_ports()),
    ];

    for (title, ports) in sections {
        println!("\n{}", title.bold());
        match ports {
            Ok(ports) if ports.is_empty() => println!("  {}", "No ports found".dimmed()),
            Ok(ports) => {
                for port in ports {
                    let marker = if ControllerDevice::matches(&port, "mc2000") {
                        "[MC2000]".green()
                    } else {
                        "        ".normal()
                    };
                    println!("  {} {}", marker, port);
                }
            },
            Err(e) => println!("  {}", format!("Failed to list ports: {}", e).red()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_without_connection_fails() {
        let config = AppConfig::parse("midi: {}\n").unwrap();
        let mut device = ControllerDevice::new(&config);

        assert!(device.send_raw(&[0xB0, 0x4A, 0x27]).is_err());
        // LED batches are best effort and never panic when offline
        device.send_leds(&[LedCommand::Indicator {
            channel: 1,
            address: 0x27,
            state: crate::codec::LedState::On,
        }]);
        assert!(device.take_frame_receiver().is_some());
        assert!(device.take_frame_receiver().is_none());
    }
}
