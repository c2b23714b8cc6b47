//! Block registry seam: runtime IDs to block states and light properties.
//!
//! Chunks only store runtime IDs. Everything that needs to know what a block
//! *is* (the light engine, the disk encoding) asks a [`BlockRegistry`]. The
//! registry is injected by the caller; [`BlockTable`] is a simple owned
//! implementation built once at startup.

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use thiserror::Error;

/// Block state version written alongside every disk palette entry.
pub const CURRENT_BLOCK_VERSION: i32 = 18_168_865;

/// Name of the air block.
pub const AIR_NAME: &str = "minecraft:air";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A single block state property value.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PropertyValue {
    /// Boolean-like properties are stored as bytes.
    Byte(u8),
    Int(i32),
    String(String),
}

/// Block state properties, ordered by name.
pub type BlockProperties = BTreeMap<String, PropertyValue>;

/// A fully qualified block state: namespaced name plus properties.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BlockState {
    /// Namespaced name, e.g. `minecraft:stone`.
    pub name: String,
    pub properties: BlockProperties,
}

impl BlockState {
    /// Creates a state with no properties.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: BlockProperties::new(),
        }
    }

    /// Adds a property, builder style.
    pub fn with(mut self, key: impl Into<String>, value: PropertyValue) -> Self {
        self.properties.insert(key.into(), value);
        self
    }
}

/// Lookups the chunk and light code need from the block registry.
pub trait BlockRegistry {
    /// Runtime ID of air.
    fn air(&self) -> u32;

    /// Light emitted by the block, 0..=15.
    fn light_emission(&self, rid: u32) -> u8;

    /// Light absorbed when passing through the block, 0..=15.
    ///
    /// Air and fully transparent blocks filter 0; opaque blocks filter 15.
    fn light_filter(&self, rid: u32) -> u8;

    /// The state a runtime ID refers to.
    fn state_of(&self, rid: u32) -> Option<&BlockState>;

    /// The runtime ID of a state, if it is registered.
    fn runtime_id(&self, state: &BlockState) -> Option<u32>;
}

/// Full descriptor for a registered block state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockDef {
    pub state: BlockState,
    /// Light emission level (0 = none, 15 = max).
    pub emission: u8,
    /// Light filter level (0 = transparent, 15 = opaque).
    pub filter: u8,
}

impl BlockDef {
    /// An opaque, non-emitting block.
    pub fn opaque(state: BlockState) -> Self {
        Self {
            state,
            emission: 0,
            filter: 15,
        }
    }

    /// A fully transparent, non-emitting block.
    pub fn transparent(state: BlockState) -> Self {
        Self {
            state,
            emission: 0,
            filter: 0,
        }
    }
}

/// Errors that can occur during block registration.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The exact state has already been registered.
    #[error("duplicate block state: {0}")]
    DuplicateState(String),
    /// The runtime ID space is exhausted.
    #[error("block registry is full")]
    RegistryFull,
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Dense runtime ID → [`BlockDef`] table with reverse lookup by state.
///
/// Air is always runtime ID 0.
pub struct BlockTable {
    defs: Vec<BlockDef>,
    by_state: FxHashMap<BlockState, u32>,
}

impl BlockTable {
    /// Creates a table with air pre-registered as runtime ID 0.
    pub fn new() -> Self {
        let air = BlockDef::transparent(BlockState::new(AIR_NAME));
        let mut by_state = FxHashMap::default();
        by_state.insert(air.state.clone(), 0);
        Self {
            defs: vec![air],
            by_state,
        }
    }

    /// Registers a block state and returns its runtime ID.
    ///
    /// IDs are assigned sequentially starting from 1.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateState`] if the state already exists,
    /// or [`RegistryError::RegistryFull`] if no runtime IDs are left.
    pub fn register(&mut self, def: BlockDef) -> Result<u32, RegistryError> {
        if self.by_state.contains_key(&def.state) {
            return Err(RegistryError::DuplicateState(def.state.name));
        }
        let rid = u32::try_from(self.defs.len()).map_err(|_| RegistryError::RegistryFull)?;
        self.by_state.insert(def.state.clone(), rid);
        self.defs.push(def);
        Ok(rid)
    }

    /// Returns the definition for a runtime ID.
    pub fn get(&self, rid: u32) -> Option<&BlockDef> {
        self.defs.get(rid as usize)
    }

    /// Runtime ID of a property-less state by name.
    pub fn lookup_by_name(&self, name: &str) -> Option<u32> {
        self.by_state.get(&BlockState::new(name)).copied()
    }

    /// Number of registered states, including air.
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    /// Returns `true` if only air is registered.
    pub fn is_empty(&self) -> bool {
        self.defs.len() <= 1
    }
}

impl Default for BlockTable {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockRegistry for BlockTable {
    fn air(&self) -> u32 {
        0
    }

    fn light_emission(&self, rid: u32) -> u8 {
        self.get(rid).map_or(0, |def| def.emission.min(15))
    }

    fn light_filter(&self, rid: u32) -> u8 {
        self.get(rid).map_or(0, |def| def.filter.min(15))
    }

    fn state_of(&self, rid: u32) -> Option<&BlockState> {
        self.get(rid).map(|def| &def.state)
    }

    fn runtime_id(&self, state: &BlockState) -> Option<u32> {
        self.by_state.get(state).copied()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
