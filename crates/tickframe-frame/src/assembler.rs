use std::fmt;

use bytes::{Bytes, BytesMut};

use crate::config::AssemblerConfig;
use crate::error::{ConfigError, FramingError};
use crate::packet::{Packet, PacketRef};
use crate::types::{TypeRegistrar, TypeTable};

/// Callback invoked for every framing anomaly.
pub type AnomalyHook = Box<dyn FnMut(&Anomaly) + Send>;

/// Where the assembler is within the packet grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Looking for a header; `seen` consecutive marker bytes so far.
    Scanning { seen: usize },
    /// A full header has been seen; the next byte is the packet type.
    TypeByte,
    /// Copying the payload of `packet_type`; `filled` of `size` bytes present.
    Collecting {
        packet_type: u8,
        size: usize,
        filled: usize,
    },
}

/// A recoverable irregularity in the byte stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anomaly {
    /// A partial header was interrupted by a non-marker byte.
    BrokenHeader { seen: usize, byte: u8 },
    /// A complete header was followed by an unregistered type.
    UnknownType { packet_type: u8 },
    /// A registered payload does not fit the assembly buffer.
    PayloadOverflow {
        packet_type: u8,
        size: usize,
        capacity: usize,
    },
}

impl fmt::Display for Anomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Anomaly::BrokenHeader { seen, byte } => {
                write!(f, "header broken after {seen} marker bytes by {byte:#04x}")
            }
            Anomaly::UnknownType { packet_type } => {
                write!(f, "unexpected packet type {packet_type:#04x}")
            }
            Anomaly::PayloadOverflow {
                packet_type,
                size,
                capacity,
            } => write!(
                f,
                "payload overflow for type {packet_type:#04x} ({size} bytes, buffer {capacity})"
            ),
        }
    }
}

/// Running counters for one assembler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssemblerStats {
    /// Bytes consumed from the byte source.
    pub bytes_ingested: u64,
    /// Packets delivered to a sink.
    pub packets: u64,
    /// Bytes thrown away while resynchronizing.
    pub discarded_bytes: u64,
    pub broken_headers: u64,
    pub unknown_types: u64,
    pub overflows: u64,
}

/// Reassembles typed, fixed-size packets from an unframed byte stream.
///
/// A packet on the wire is `header_size` copies of `header_byte`, one type
/// byte, then exactly as many payload bytes as the type table declares for
/// that type. Input can be fed in chunks of any size; state carries over
/// between calls.
///
/// Payloads are handed out as slices of an internal buffer that is reused
/// for the next packet. Sinks that need a payload after returning must copy
/// it, e.g. with [`PacketRef::to_packet`].
///
/// In the default mode every anomaly is logged, reported to the optional
/// hook and recovered by returning to header scanning. With `strict` set in
/// [`AssemblerConfig`], the assembler still resynchronizes but
/// the call returns a [`FramingError`] and the rest of the chunk is dropped.
pub struct PacketAssembler {
    config: AssemblerConfig,
    types: TypeTable,
    buf: BytesMut,
    state: State,
    stats: AssemblerStats,
    last_packet: Option<Packet>,
    anomaly_hook: Option<AnomalyHook>,
}

impl PacketAssembler {
    /// Create an assembler accepting the given `(type, size)` pairs.
    pub fn new<I>(config: AssemblerConfig, sizes: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (u8, usize)>,
    {
        if config.header_size == 0 {
            return Err(ConfigError::HeaderSizeZero);
        }
        let types = TypeTable::from_sizes(config.max_payload_size, sizes)?;
        let buf = BytesMut::zeroed(types.max_size());

        Ok(Self {
            config,
            types,
            buf,
            state: State::Scanning { seen: 0 },
            stats: AssemblerStats::default(),
            last_packet: None,
            anomaly_hook: None,
        })
    }

    /// Accept a new packet type from now on.
    ///
    /// Returns `Ok(false)` without changing anything if the type is already
    /// registered. A packet currently being collected is unaffected.
    pub fn register_type(&mut self, packet_type: u8, size: usize) -> Result<bool, ConfigError> {
        let added = self.types.register(packet_type, size)?;
        self.fit_buffer();
        Ok(added)
    }

    /// Install a callback that observes every anomaly.
    pub fn set_anomaly_hook<F>(&mut self, hook: F)
    where
        F: FnMut(&Anomaly) + Send + 'static,
    {
        self.anomaly_hook = Some(Box::new(hook));
    }

    /// Feed a chunk, calling `on_packet(type, payload)` for each packet that
    /// completes within it.
    pub fn ingest<F>(&mut self, data: &[u8], mut on_packet: F) -> Result<(), FramingError>
    where
        F: FnMut(u8, &[u8]),
    {
        self.ingest_with(data, |packet, _| on_packet(packet.packet_type, packet.payload))
    }

    /// Feed a chunk, letting the sink register types as packets arrive.
    ///
    /// Types registered by the sink apply to the bytes that follow the packet
    /// being handled, including the remainder of this chunk.
    pub fn ingest_with<F>(&mut self, data: &[u8], mut sink: F) -> Result<(), FramingError>
    where
        F: FnMut(PacketRef<'_>, &mut TypeRegistrar<'_>),
    {
        let mut offset = 0usize;
        while offset < data.len() {
            let (used, completed) = self.advance(&data[offset..]).map_err(|mut err| {
                err.consumed += offset;
                err
            })?;
            offset += used;

            if let Some((packet_type, size)) = completed {
                let packet = PacketRef {
                    packet_type,
                    payload: &self.buf[..size],
                };
                sink(packet, &mut TypeRegistrar::new(&mut self.types));
                self.fit_buffer();
            }
        }
        Ok(())
    }

    /// Consume bytes up to the end of the next complete packet.
    ///
    /// Returns how many bytes of `data` were used and the packet if one
    /// completed. When no packet completes, all of `data` is used. On a
    /// strict-mode error, [`FramingError::consumed`] tells how far into
    /// `data` the assembler got; the bytes after it were not fed.
    pub fn next_packet(
        &mut self,
        data: &[u8],
    ) -> Result<(usize, Option<PacketRef<'_>>), FramingError> {
        let (used, completed) = self.advance(data)?;
        let packet = completed.map(|(packet_type, size)| PacketRef {
            packet_type,
            payload: &self.buf[..size],
        });
        Ok((used, packet))
    }

    /// Drop any partial header or payload and return to scanning.
    pub fn reset(&mut self) {
        if let State::Collecting { filled, .. } = self.state {
            self.stats.discarded_bytes += filled as u64;
        }
        self.state = State::Scanning { seen: 0 };
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// The state as a single signed counter.
    ///
    /// Zero or negative while looking for a header (minus the marker bytes
    /// seen, `-header_size` once the type byte is due), positive while
    /// collecting (payload bytes still missing).
    pub fn remaining(&self) -> isize {
        match self.state {
            State::Scanning { seen } => -(seen as isize),
            State::TypeByte => -(self.config.header_size as isize),
            State::Collecting { size, filled, .. } => (size - filled) as isize,
        }
    }

    pub fn types(&self) -> &TypeTable {
        &self.types
    }

    pub fn config(&self) -> &AssemblerConfig {
        &self.config
    }

    pub fn stats(&self) -> AssemblerStats {
        self.stats
    }

    /// Capacity currently reserved for payloads.
    pub fn buffer_capacity(&self) -> usize {
        self.buf.len()
    }

    /// The last packet completed in strict mode.
    ///
    /// Always `None` in the default mode, which keeps no copies.
    pub fn last_packet(&self) -> Option<&Packet> {
        self.last_packet.as_ref()
    }

    fn advance(&mut self, data: &[u8]) -> Result<(usize, Option<(u8, usize)>), FramingError> {
        let mut pos = 0usize;

        while pos < data.len() {
            match self.state {
                State::Scanning { seen } => {
                    let byte = data[pos];
                    pos += 1;
                    self.stats.bytes_ingested += 1;

                    if byte == self.config.header_byte {
                        let seen = seen + 1;
                        self.state = if seen == self.config.header_size {
                            State::TypeByte
                        } else {
                            State::Scanning { seen }
                        };
                    } else if seen > 0 {
                        self.state = State::Scanning { seen: 0 };
                        self.stats.discarded_bytes += seen as u64 + 1;
                        self.stats.broken_headers += 1;
                        self.report(Anomaly::BrokenHeader { seen, byte }, pos)?;
                    } else {
                        self.stats.discarded_bytes += 1;
                    }
                }
                State::TypeByte => {
                    let packet_type = data[pos];
                    pos += 1;
                    self.stats.bytes_ingested += 1;
                    self.state = State::Scanning { seen: 0 };

                    match self.types.size_of(packet_type) {
                        None => {
                            self.stats.discarded_bytes += self.config.header_size as u64 + 1;
                            self.stats.unknown_types += 1;
                            self.report(Anomaly::UnknownType { packet_type }, pos)?;
                        }
                        Some(size) if size > self.buf.len() => {
                            self.stats.discarded_bytes += self.config.header_size as u64 + 1;
                            self.stats.overflows += 1;
                            let capacity = self.buf.len();
                            self.report(
                                Anomaly::PayloadOverflow {
                                    packet_type,
                                    size,
                                    capacity,
                                },
                                pos,
                            )?;
                        }
                        Some(0) => return Ok((pos, Some(self.complete(packet_type, 0)))),
                        Some(size) => {
                            tracing::trace!(packet_type, size, "start packet");
                            self.state = State::Collecting {
                                packet_type,
                                size,
                                filled: 0,
                            };
                        }
                    }
                }
                State::Collecting {
                    packet_type,
                    size,
                    filled,
                } => {
                    let take = (size - filled).min(data.len() - pos);
                    self.buf[filled..filled + take].copy_from_slice(&data[pos..pos + take]);
                    pos += take;
                    self.stats.bytes_ingested += take as u64;

                    let filled = filled + take;
                    if filled == size {
                        self.state = State::Scanning { seen: 0 };
                        return Ok((pos, Some(self.complete(packet_type, size))));
                    }
                    self.state = State::Collecting {
                        packet_type,
                        size,
                        filled,
                    };
                }
            }
        }

        Ok((pos, None))
    }

    fn complete(&mut self, packet_type: u8, size: usize) -> (u8, usize) {
        self.stats.packets += 1;
        tracing::debug!(packet_type, size, "assembled packet");
        if self.config.strict {
            self.last_packet = Some(Packet {
                packet_type,
                payload: Bytes::copy_from_slice(&self.buf[..size]),
            });
        }
        (packet_type, size)
    }

    fn report(&mut self, anomaly: Anomaly, consumed: usize) -> Result<(), FramingError> {
        tracing::warn!(%anomaly, "resynchronizing packet stream");
        if let Some(hook) = self.anomaly_hook.as_mut() {
            hook(&anomaly);
        }
        if self.config.strict {
            return Err(FramingError {
                anomaly,
                last_packet: self.last_packet.clone(),
                consumed,
            });
        }
        Ok(())
    }

    // BytesMut::resize keeps the existing prefix, so in-flight payload bytes
    // stay at their offsets.
    fn fit_buffer(&mut self) {
        let needed = self.types.max_size();
        if needed > self.buf.len() {
            tracing::debug!(from = self.buf.len(), to = needed, "growing assembly buffer");
            self.buf.resize(needed, 0);
        }
    }
}

impl fmt::Debug for PacketAssembler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PacketAssembler")
            .field("config", &self.config)
            .field("types", &self.types)
            .field("state", &self.state)
            .field("buffer_capacity", &self.buf.len())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
