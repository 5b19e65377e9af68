use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Highest element value assignable to a concept slot.
pub const ELEMENT_MAX: u8 = 0xFD;
/// Reserved element returned by the `ReservedSlot` overflow policy.
pub const ELEMENT_OVERFLOW: u8 = 0xFE;
/// Reserved element for entries whose concept could not be resolved.
pub const ELEMENT_UNKNOWN: u8 = 0xFF;
/// Number of assignable slots per `(domain, category, cluster)` triple.
pub const ELEMENT_SLOTS: usize = ELEMENT_MAX as usize + 1;

/// A 4-byte semantic address.
///
/// Uniqueness of `element` holds only within the same
/// `(domain, category, cluster)` triple, never globally. The text form
/// `"0xDD:CC:EE:XX"` is the interchange contract with storage and downstream
/// consumers, so the type serializes to and from that string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Address {
    pub domain: u8,
    pub category: u8,
    pub cluster: u8,
    pub element: u8,
}

impl Address {
    pub fn new(domain: u8, category: u8, cluster: u8, element: u8) -> Self {
        Self {
            domain,
            category,
            cluster,
            element,
        }
    }

    /// The `(domain, category, cluster)` namespace this address lives in.
    pub fn triple(&self) -> (u8, u8, u8) {
        (self.domain, self.category, self.cluster)
    }

    /// Maps this address into another domain, holding category, cluster and
    /// element fixed. This is how the same concept is aligned across
    /// languages. Pure and total; it does not check that the target domain
    /// actually has the concept registered.
    pub fn equivalent_in_domain(&self, target_domain: u8) -> Address {
        Address {
            domain: target_domain,
            ..*self
        }
    }

    /// Parses the `"0xDD:CC:EE:XX"` text form.
    pub fn parse(text: &str) -> Result<Address> {
        let trimmed = text.trim();
        let Some(rest) = trimmed.strip_prefix("0x") else {
            bail!("malformed address '{}': missing 0x prefix", text);
        };

        let groups: Vec<&str> = rest.split(':').collect();
        if groups.len() != 4 {
            bail!(
                "malformed address '{}': expected 4 byte groups, got {}",
                text,
                groups.len()
            );
        }

        let mut bytes = [0u8; 4];
        for (i, group) in groups.iter().enumerate() {
            if group.len() != 2 {
                bail!("malformed address '{}': byte group '{}' is not 2 hex digits", text, group);
            }
            bytes[i] = u8::from_str_radix(group, 16)
                .map_err(|e| anyhow::anyhow!("malformed address '{}': {}", text, e))?;
        }

        Ok(Address::new(bytes[0], bytes[1], bytes[2], bytes[3]))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "0x{:02X}:{:02X}:{:02X}:{:02X}",
            self.domain, self.category, self.cluster, self.element
        )
    }
}

impl From<Address> for String {
    fn from(addr: Address) -> Self {
        addr.to_string()
    }
}

impl TryFrom<String> for Address {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Address::parse(&value).map_err(|e| e.to_string())
    }
}
