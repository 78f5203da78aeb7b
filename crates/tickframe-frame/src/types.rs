use std::collections::BTreeMap;

use crate::error::ConfigError;

/// Allow-list mapping packet types to their fixed payload sizes.
///
/// Registrations are permanent for the lifetime of the table and the first
/// registration of a type wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeTable {
    sizes: BTreeMap<u8, usize>,
    max_payload_size: usize,
}

impl TypeTable {
    /// Create an empty table accepting payloads up to `max_payload_size`.
    pub fn new(max_payload_size: usize) -> Self {
        Self {
            sizes: BTreeMap::new(),
            max_payload_size,
        }
    }

    /// Create a table from initial `(type, size)` pairs.
    pub fn from_sizes<I>(max_payload_size: usize, sizes: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (u8, usize)>,
    {
        let mut table = Self::new(max_payload_size);
        for (packet_type, size) in sizes {
            table.register(packet_type, size)?;
        }
        Ok(table)
    }

    /// Register a payload size for a packet type.
    ///
    /// Returns `Ok(true)` when the type was added and `Ok(false)` when it was
    /// already registered, in which case the existing size is kept.
    pub fn register(&mut self, packet_type: u8, size: usize) -> Result<bool, ConfigError> {
        if size > self.max_payload_size {
            return Err(ConfigError::PayloadTooLarge {
                packet_type,
                size,
                max: self.max_payload_size,
            });
        }

        if let Some(&existing) = self.sizes.get(&packet_type) {
            if existing != size {
                tracing::warn!(
                    packet_type,
                    existing,
                    requested = size,
                    "ignoring conflicting size for registered packet type"
                );
            }
            return Ok(false);
        }

        tracing::debug!(packet_type, size, "registered packet type");
        self.sizes.insert(packet_type, size);
        Ok(true)
    }

    /// Payload size for a type, if registered.
    pub fn size_of(&self, packet_type: u8) -> Option<usize> {
        self.sizes.get(&packet_type).copied()
    }

    /// Returns true if the type is registered.
    pub fn contains(&self, packet_type: u8) -> bool {
        self.sizes.contains_key(&packet_type)
    }

    /// Largest registered payload size, or 0 for an empty table.
    pub fn max_size(&self) -> usize {
        self.sizes.values().copied().max().unwrap_or(0)
    }

    /// Upper bound accepted by [`TypeTable::register`].
    pub fn max_payload_size(&self) -> usize {
        self.max_payload_size
    }

    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    /// Registered `(type, size)` pairs in ascending type order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, usize)> + '_ {
        self.sizes.iter().map(|(&t, &s)| (t, s))
    }
}

/// Registration access to an assembler's [`TypeTable`] from inside a sink.
///
/// Only adds types; the table itself cannot be replaced or cleared.
#[derive(Debug)]
pub struct TypeRegistrar<'a> {
    table: &'a mut TypeTable,
}

impl<'a> TypeRegistrar<'a> {
    pub(crate) fn new(table: &'a mut TypeTable) -> Self {
        Self { table }
    }

    /// See [`TypeTable::register`].
    pub fn register(&mut self, packet_type: u8, size: usize) -> Result<bool, ConfigError> {
        self.table.register(packet_type, size)
    }

    pub fn size_of(&self, packet_type: u8) -> Option<usize> {
        self.table.size_of(packet_type)
    }

    pub fn contains(&self, packet_type: u8) -> bool {
        self.table.contains(packet_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_registration_wins() {
        let mut table = TypeTable::new(1024);
        assert!(table.register(1, 32).unwrap());
        assert!(!table.register(1, 64).unwrap());
        assert_eq!(table.size_of(1), Some(32));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn rejects_oversized_payload() {
        let mut table = TypeTable::new(16);
        let err = table.register(7, 17).unwrap_err();
        assert_eq!(
            err,
            ConfigError::PayloadTooLarge {
                packet_type: 7,
                size: 17,
                max: 16
            }
        );
        assert!(!table.contains(7));
    }

    #[test]
    fn max_size_tracks_largest_entry() {
        let table = TypeTable::from_sizes(4096, [(0, 66), (1, 2252), (2, 0)]).unwrap();
        assert_eq!(table.max_size(), 2252);
        assert_eq!(
            table.iter().collect::<Vec<_>>(),
            vec![(0, 66), (1, 2252), (2, 0)]
        );
    }

    #[test]
    fn empty_table() {
        let table = TypeTable::new(16);
        assert!(table.is_empty());
        assert_eq!(table.max_size(), 0);
        assert_eq!(table.size_of(0), None);
    }
}
