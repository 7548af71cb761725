use std::io::ErrorKind;
use std::net::UdpSocket;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use rosc::{decoder, OscMessage, OscPacket};

use crate::error::{DebuggerError, Result};
use crate::general::check::ListenerStatus;
use crate::registry::{ParameterRegistry, ParameterValue};

/// How often the receive loop wakes up to look at the shutdown flag.
const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Bind the OSC socket. Failing here is fatal for the caller; there is no
/// fallback port.
pub fn bind(addr: &str) -> Result<UdpSocket> {
    let socket = UdpSocket::bind(addr).map_err(|source| DebuggerError::Bind {
        addr: addr.to_string(),
        source,
    })?;
    // Set socket timeout so we can check the shutdown flag periodically
    if let Err(e) = socket.set_read_timeout(Some(POLL_INTERVAL)) {
        log::warn!("Could not set OSC read timeout: {}", e);
    }
    Ok(socket)
}

/// Spawns a background thread that records every OSC message received on
/// `socket` into `registry`. Every address is accepted. The thread exits
/// once `shutdown` is set; datagrams still in flight are dropped.
pub fn spawn_osc_listener(
    socket: UdpSocket,
    registry: ParameterRegistry,
    status: Arc<ListenerStatus>,
    shutdown: Arc<AtomicBool>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        status.mark_started();
        match socket.local_addr() {
            Ok(addr) => log::info!("OSC listener bound on {}", addr),
            Err(_) => log::info!("OSC listener started"),
        }

        let mut buf = [0u8; decoder::MTU];

        loop {
            if shutdown.load(Ordering::SeqCst) {
                break;
            }

            match socket.recv_from(&mut buf) {
                Ok((size, peer_addr)) => {
                    status.count_packet();
                    if !handle_datagram(&buf[..size], &registry) {
                        status.count_dropped();
                        log::debug!("Dropped undecodable OSC datagram ({} bytes) from {}", size, peer_addr);
                    }
                }
                Err(ref e) if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::TimedOut => {
                    continue;
                }
                // Windows reports ICMP port-unreachable on the next recv of a UDP socket.
                Err(ref e) if e.kind() == ErrorKind::ConnectionReset => {
                    log::debug!("OSC recv: {}", e);
                }
                Err(err) => {
                    log::warn!("OSC recv error: {}", err);
                    thread::sleep(POLL_INTERVAL);
                }
            }
        }

        log::info!("OSC listener exiting");
        status.mark_stopped();
    })
}

/// Decode one datagram and record its messages. Returns `false` if the
/// datagram was not valid OSC; nothing is recorded in that case.
pub fn handle_datagram(data: &[u8], registry: &ParameterRegistry) -> bool {
    if data.is_empty() {
        return false;
    }
    match decoder::decode_udp(data) {
        Ok((_, packet)) => {
            handle_packet(packet, registry);
            true
        }
        Err(err) => {
            log::trace!("OSC decode error: {}", err);
            false
        }
    }
}

fn handle_packet(packet: OscPacket, registry: &ParameterRegistry) {
    match packet {
        OscPacket::Message(msg) => handle_message(msg, registry),
        OscPacket::Bundle(bundle) => {
            for pkt in bundle.content {
                handle_packet(pkt, registry);
            }
        }
    }
}

/// Only the first argument is kept; the rest are dropped.
fn handle_message(msg: OscMessage, registry: &ParameterRegistry) {
    let value = ParameterValue::from_osc(msg.args.first());
    registry.record(msg.addr, value);
}

#[cfg(test)]
mod tests {
    use super::*;
    use rosc::{encoder, OscBundle, OscTime, OscType};

    fn encode(packet: &OscPacket) -> Vec<u8> {
        encoder::encode(packet).unwrap()
    }

    #[test]
    fn message_records_first_argument() {
        let registry = ParameterRegistry::new();
        let packet = OscPacket::Message(OscMessage {
            addr: "/avatar/parameters/Hue".to_string(),
            args: vec![OscType::Float(0.5), OscType::Int(7)],
        });
        assert!(handle_datagram(&encode(&packet), &registry));
        assert_eq!(
            registry.get("/avatar/parameters/Hue"),
            Some(ParameterValue::Float(0.5))
        );
    }

    #[test]
    fn message_without_arguments_is_absent() {
        let registry = ParameterRegistry::new();
        let packet = OscPacket::Message(OscMessage {
            addr: "/avatar/change".to_string(),
            args: vec![],
        });
        assert!(handle_datagram(&encode(&packet), &registry));
        assert_eq!(registry.get("/avatar/change"), Some(ParameterValue::Absent));
    }

    #[test]
    fn nested_bundles_are_flattened() {
        let registry = ParameterRegistry::new();
        let inner = OscPacket::Bundle(OscBundle {
            timetag: OscTime { seconds: 0, fractional: 1 },
            content: vec![OscPacket::Message(OscMessage {
                addr: "/avatar/parameters/Inner".to_string(),
                args: vec![OscType::Bool(true)],
            })],
        });
        let outer = OscPacket::Bundle(OscBundle {
            timetag: OscTime { seconds: 0, fractional: 1 },
            content: vec![
                OscPacket::Message(OscMessage {
                    addr: "/avatar/parameters/Outer".to_string(),
                    args: vec![OscType::String("on".into())],
                }),
                inner,
            ],
        });
        assert!(handle_datagram(&encode(&outer), &registry));
        assert_eq!(registry.len(), 2);
        assert_eq!(
            registry.get("/avatar/parameters/Inner"),
            Some(ParameterValue::Bool(true))
        );
    }

    #[test]
    fn garbage_is_dropped() {
        let registry = ParameterRegistry::new();
        assert!(!handle_datagram(b"\x00\x01garbage", &registry));
        assert!(!handle_datagram(&[], &registry));
        assert!(registry.is_empty());
    }
}
