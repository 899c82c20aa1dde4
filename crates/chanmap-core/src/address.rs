//! Internal PLC memory addresses, sequential allocation, and bus translation.
//!
//! Real values occupy 4 bytes in the `%MD` space; boolean values occupy one
//! bit in the `%MX` space, 8 to a byte.

use crate::signal::ValueKind;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Width of one real value in bytes.
pub const REAL_WIDTH: u32 = 4;

const MAX_BIT: u8 = 7;

/// An internal memory address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Address {
    /// `%MD<offset>`
    Real {
        /// Byte offset
        offset: u32,
    },
    /// `%MX<byte>.<bit>`
    Bool {
        /// Byte offset
        byte: u32,
        /// Bit within the byte, `0..=7`
        bit: u8,
    },
}

impl Address {
    /// Value kind stored at this address.
    #[must_use]
    pub fn value_kind(&self) -> ValueKind {
        match self {
            Address::Real { .. } => ValueKind::Real,
            Address::Bool { .. } => ValueKind::Bool,
        }
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Address::Real { offset } => write!(f, "%MD{offset}"),
            Address::Bool { byte, bit } => write!(f, "%MX{byte}.{bit}"),
        }
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        let unrecognized = || AddressError::Unrecognized(s.to_string());

        if let Some(offset) = token.strip_prefix("%MD") {
            let offset = parse_digits(offset).ok_or_else(unrecognized)?;
            return Ok(Address::Real { offset });
        }

        if let Some(rest) = token.strip_prefix("%MX") {
            let (byte, bit) = rest.split_once('.').ok_or_else(unrecognized)?;
            let byte = parse_digits(byte).ok_or_else(unrecognized)?;
            let bit = parse_digits(bit).ok_or_else(unrecognized)?;
            let bit = u8::try_from(bit)
                .ok()
                .filter(|b| *b <= MAX_BIT)
                .ok_or(AddressError::InvalidBoolBit(bit))?;
            return Ok(Address::Bool { byte, bit });
        }

        Err(unrecognized())
    }
}

fn parse_digits(raw: &str) -> Option<u32> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

impl TryFrom<String> for Address {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.to_string()
    }
}

/// Address errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    /// Token is neither `%MD<n>` nor `%MX<n>.<n>`
    #[error("unrecognized address {0:?}")]
    Unrecognized(String),
    /// Boolean bit above 7
    #[error("boolean bit {0} out of range 0..=7")]
    InvalidBoolBit(u32),
    /// Real base not aligned to a word boundary
    #[error("real base offset {0} must be even")]
    MisalignedRealBase(u32),
    /// Counter would overflow
    #[error("{0} address space exhausted")]
    SpaceExhausted(&'static str),
}

/// Starting counters for an [`AddressAllocator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawAllocatorConfig")]
pub struct AllocatorConfig {
    real_base: u32,
    bool_byte: u32,
    bool_bit: u8,
}

#[derive(Deserialize)]
struct RawAllocatorConfig {
    real_base: u32,
    bool_byte: u32,
    bool_bit: u8,
}

impl TryFrom<RawAllocatorConfig> for AllocatorConfig {
    type Error = AddressError;

    fn try_from(raw: RawAllocatorConfig) -> Result<Self, Self::Error> {
        Self::new(raw.real_base, raw.bool_byte, raw.bool_bit)
    }
}

impl AllocatorConfig {
    /// Create an allocator configuration.
    ///
    /// # Errors
    ///
    /// Returns [`AddressError::MisalignedRealBase`] if `real_base` is odd and
    /// [`AddressError::InvalidBoolBit`] if `bool_bit` is above 7.
    pub fn new(real_base: u32, bool_byte: u32, bool_bit: u8) -> Result<Self, AddressError> {
        if real_base % 2 != 0 {
            return Err(AddressError::MisalignedRealBase(real_base));
        }
        if bool_bit > MAX_BIT {
            return Err(AddressError::InvalidBoolBit(u32::from(bool_bit)));
        }
        Ok(Self {
            real_base,
            bool_byte,
            bool_bit,
        })
    }

    /// Layout used by the existing IO table exports: `%MD320` and `%MX20.0`.
    #[must_use]
    pub fn legacy() -> Self {
        Self {
            real_base: 320,
            bool_byte: 20,
            bool_bit: 0,
        }
    }

    /// Replace the boolean base from a `byte.bit` string.
    ///
    /// # Errors
    ///
    /// Returns error if the string is malformed or the bit is above 7.
    pub fn with_bool_base(self, raw: &str) -> Result<Self, AddressError> {
        let Address::Bool { byte, bit } = format!("%MX{}", raw.trim()).parse::<Address>()? else {
            return Err(AddressError::Unrecognized(raw.to_string()));
        };
        Self::new(self.real_base, byte, bit)
    }

    /// Replace the real base offset.
    ///
    /// # Errors
    ///
    /// Returns error if `real_base` is odd.
    pub fn with_real_base(self, real_base: u32) -> Result<Self, AddressError> {
        Self::new(real_base, self.bool_byte, self.bool_bit)
    }

    /// First `%MD` offset.
    #[must_use]
    pub fn real_base(&self) -> u32 {
        self.real_base
    }

    /// First `%MX` byte.
    #[must_use]
    pub fn bool_byte(&self) -> u32 {
        self.bool_byte
    }

    /// First `%MX` bit.
    #[must_use]
    pub fn bool_bit(&self) -> u8 {
        self.bool_bit
    }
}

/// Snapshot of an allocator's counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressState {
    /// Next `%MD` offset
    pub next_real_offset: u32,
    /// Next `%MX` byte
    pub next_bool_byte: u32,
    /// Next `%MX` bit
    pub next_bool_bit: u8,
}

/// Hands out strictly increasing real and boolean addresses.
///
/// One allocator serves one export pass. Its counters are never shared.
#[derive(Debug)]
pub struct AddressAllocator {
    state: AddressState,
    real_exhausted: bool,
    bool_exhausted: bool,
}

impl AddressAllocator {
    /// Create an allocator starting at the configured bases.
    #[must_use]
    pub fn new(config: &AllocatorConfig) -> Self {
        Self {
            state: AddressState {
                next_real_offset: config.real_base,
                next_bool_byte: config.bool_byte,
                next_bool_bit: config.bool_bit,
            },
            real_exhausted: false,
            bool_exhausted: false,
        }
    }

    /// Allocate the next real address and advance by 4 bytes.
    ///
    /// # Errors
    ///
    /// Returns [`AddressError::SpaceExhausted`] once the offset would leave `u32`.
    pub fn allocate_real(&mut self) -> Result<Address, AddressError> {
        if self.real_exhausted {
            return Err(AddressError::SpaceExhausted("real"));
        }
        let address = Address::Real {
            offset: self.state.next_real_offset,
        };
        match self.state.next_real_offset.checked_add(REAL_WIDTH) {
            Some(next) => self.state.next_real_offset = next,
            None => self.real_exhausted = true,
        }
        tracing::trace!(%address, "Allocated real address");
        Ok(address)
    }

    /// Allocate the next boolean address, packing 8 bits per byte.
    ///
    /// # Errors
    ///
    /// Returns [`AddressError::SpaceExhausted`] once the byte would leave `u32`.
    pub fn allocate_bool(&mut self) -> Result<Address, AddressError> {
        if self.bool_exhausted {
            return Err(AddressError::SpaceExhausted("boolean"));
        }
        let address = Address::Bool {
            byte: self.state.next_bool_byte,
            bit: self.state.next_bool_bit,
        };
        if self.state.next_bool_bit < MAX_BIT {
            self.state.next_bool_bit += 1;
        } else {
            match self.state.next_bool_byte.checked_add(1) {
                Some(next) => {
                    self.state.next_bool_byte = next;
                    self.state.next_bool_bit = 0;
                }
                None => self.bool_exhausted = true,
            }
        }
        tracing::trace!(%address, "Allocated boolean address");
        Ok(address)
    }

    /// Allocate an address of the given kind.
    ///
    /// # Errors
    ///
    /// Returns error if that address space is exhausted.
    pub fn allocate(&mut self, kind: ValueKind) -> Result<Address, AddressError> {
        match kind {
            ValueKind::Real => self.allocate_real(),
            ValueKind::Bool => self.allocate_bool(),
        }
    }

    /// Current counters.
    #[must_use]
    pub fn state(&self) -> AddressState {
        self.state
    }
}

/// Constants of the external bus numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslatorConfig {
    /// Base register for real values
    pub real_base: u32,
    /// Project-wide register offset for real values
    pub project_offset: u32,
    /// Base coil number for boolean values
    pub bool_base: u32,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            real_base: 3000,
            project_offset: 40000,
            bool_base: 3000,
        }
    }
}

/// Maps internal addresses to external bus addresses.
///
/// `%MD x` maps to `x / 2 + real_base + project_offset + 1` and `%MX m.n` to
/// `m * 8 + n + bool_base + 1`. Odd `%MD` offsets are rejected so that the
/// real mapping stays injective.
#[derive(Debug, Clone, Copy, Default)]
pub struct AddressTranslator {
    config: TranslatorConfig,
}

impl AddressTranslator {
    /// Create a translator.
    #[must_use]
    pub fn new(config: TranslatorConfig) -> Self {
        Self { config }
    }

    /// External address of `address`, or `None` if it has none.
    #[must_use]
    pub fn translate_address(&self, address: &Address) -> Option<u32> {
        match *address {
            Address::Real { offset } => {
                if offset % 2 != 0 {
                    return None;
                }
                (offset / 2)
                    .checked_add(self.config.real_base)?
                    .checked_add(self.config.project_offset)?
                    .checked_add(1)
            }
            Address::Bool { byte, bit } => {
                if bit > MAX_BIT {
                    return None;
                }
                byte.checked_mul(8)?
                    .checked_add(u32::from(bit))?
                    .checked_add(self.config.bool_base)?
                    .checked_add(1)
            }
        }
    }

    /// Translate an address token. Empty string means no external address.
    #[must_use]
    pub fn translate(&self, internal: &str) -> String {
        if internal.trim().is_empty() {
            return String::new();
        }
        internal
            .parse::<Address>()
            .ok()
            .and_then(|address| self.translate_address(&address))
            .map(|external| external.to_string())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn real_addresses_advance_by_four() {
        let mut allocator = AddressAllocator::new(&AllocatorConfig::legacy());
        let tokens: Vec<String> = (0..4)
            .map(|_| allocator.allocate_real().unwrap().to_string())
            .collect();
        assert_eq!(tokens, ["%MD320", "%MD324", "%MD328", "%MD332"]);
        assert_eq!(allocator.state().next_real_offset, 336);
    }

    #[test]
    fn bool_addresses_wrap_after_bit_seven() {
        let mut allocator = AddressAllocator::new(&AllocatorConfig::legacy());
        let tokens: Vec<String> = (0..9)
            .map(|_| allocator.allocate_bool().unwrap().to_string())
            .collect();
        assert_eq!(tokens[0], "%MX20.0");
        assert_eq!(tokens[7], "%MX20.7");
        assert_eq!(tokens[8], "%MX21.0");
        assert_eq!(
            allocator.state(),
            AddressState {
                next_real_offset: 320,
                next_bool_byte: 21,
                next_bool_bit: 1,
            }
        );
    }

    #[test]
    fn counters_are_independent() {
        let mut allocator = AddressAllocator::new(&AllocatorConfig::new(0, 5, 6).unwrap());
        assert_eq!(allocator.allocate_bool().unwrap().to_string(), "%MX5.6");
        assert_eq!(allocator.allocate_real().unwrap().to_string(), "%MD0");
        assert_eq!(allocator.allocate_bool().unwrap().to_string(), "%MX5.7");
        assert_eq!(allocator.allocate_real().unwrap().to_string(), "%MD4");
        assert_eq!(allocator.allocate_bool().unwrap().to_string(), "%MX6.0");
    }

    #[test]
    fn real_space_exhaustion_is_reported() {
        let mut allocator = AddressAllocator::new(&AllocatorConfig::new(u32::MAX - 3, 0, 0).unwrap());
        assert!(allocator.allocate_real().is_ok());
        assert_eq!(
            allocator.allocate_real(),
            Err(AddressError::SpaceExhausted("real"))
        );
    }

    #[test]
    fn allocator_config_rejects_bit_above_seven() {
        assert_eq!(
            AllocatorConfig::new(320, 20, 8),
            Err(AddressError::InvalidBoolBit(8))
        );
        assert!(serde_json::from_str::<AllocatorConfig>(
            r#"{"real_base":0,"bool_byte":0,"bool_bit":9}"#
        )
        .is_err());
        assert!(AllocatorConfig::legacy().with_bool_base("4.8").is_err());

        let config = AllocatorConfig::legacy().with_bool_base("4.3").unwrap();
        assert_eq!((config.bool_byte(), config.bool_bit()), (4, 3));
        assert_eq!(config.real_base(), 320);
    }

    #[test]
    fn allocator_config_rejects_odd_real_base() {
        assert_eq!(
            AllocatorConfig::new(321, 20, 0),
            Err(AddressError::MisalignedRealBase(321))
        );
        assert_eq!(
            AllocatorConfig::legacy().with_real_base(321),
            Err(AddressError::MisalignedRealBase(321))
        );
        assert!(serde_json::from_str::<AllocatorConfig>(
            r#"{"real_base":321,"bool_byte":0,"bool_bit":0}"#
        )
        .is_err());

        let config = AllocatorConfig::legacy().with_real_base(1000).unwrap();
        assert_eq!(config.real_base(), 1000);
        assert_eq!((config.bool_byte(), config.bool_bit()), (20, 0));
    }

    #[test]
    fn translates_known_addresses() {
        let translator = AddressTranslator::default();
        assert_eq!(translator.translate("%MD320"), "43161");
        assert_eq!(translator.translate("%MX20.0"), "3161");
        assert_eq!(translator.translate("%MX20.7"), "3168");
        assert_eq!(translator.translate("%MX21.0"), "3169");
    }

    #[test]
    fn untranslatable_input_is_empty() {
        let translator = AddressTranslator::default();
        for raw in ["", "   ", "%IW10", "%MD", "%MDx", "%MX20", "%MX20.8", "%MD321", "MD320"] {
            assert_eq!(translator.translate(raw), "", "{raw:?}");
        }
        assert_eq!(
            translator.translate_address(&Address::Bool {
                byte: u32::MAX,
                bit: 0
            }),
            None
        );
    }

    #[test]
    fn address_tokens_parse() {
        assert_eq!(
            "%MD1024".parse::<Address>().unwrap(),
            Address::Real { offset: 1024 }
        );
        assert_eq!(
            "%MX3.5".parse::<Address>().unwrap(),
            Address::Bool { byte: 3, bit: 5 }
        );
        assert_eq!(
            "%MX3.9".parse::<Address>(),
            Err(AddressError::InvalidBoolBit(9))
        );
    }

    proptest! {
        #[test]
        fn real_translation_is_injective(a in 0u32..4_000_000, b in 0u32..4_000_000) {
            let translator = AddressTranslator::default();
            let (a, b) = (a * 2, b * 2);
            let ta = translator.translate_address(&Address::Real { offset: a });
            let tb = translator.translate_address(&Address::Real { offset: b });
            prop_assert!(ta.is_some() && tb.is_some());
            prop_assert_eq!(a == b, ta == tb);
        }

        #[test]
        fn bool_translation_is_injective(
            a in (0u32..100_000, 0u8..8),
            b in (0u32..100_000, 0u8..8),
        ) {
            let translator = AddressTranslator::default();
            let ta = translator.translate_address(&Address::Bool { byte: a.0, bit: a.1 });
            let tb = translator.translate_address(&Address::Bool { byte: b.0, bit: b.1 });
            prop_assert!(ta.is_some() && tb.is_some());
            prop_assert_eq!(a == b, ta == tb);
        }

        #[test]
        fn allocations_strictly_increase(kinds in proptest::collection::vec(any::<bool>(), 1..64)) {
            let mut allocator = AddressAllocator::new(&AllocatorConfig::legacy());
            let mut last_real = None;
            let mut last_bool = None;
            for is_real in kinds {
                let kind = if is_real { ValueKind::Real } else { ValueKind::Bool };
                let address = allocator.allocate(kind).unwrap();
                let last = if is_real { &mut last_real } else { &mut last_bool };
                if let Some(previous) = *last {
                    prop_assert!(address > previous);
                }
                *last = Some(address);
            }
        }
    }
}
