use std::fmt::{self, Display};
use std::str::FromStr;

const HARDENED: u32 = 0x8000_0000;

/// BIP-44 purpose and SLIP-44 coin type used by the Stellar app.
pub const STELLAR_PURPOSE: u32 = 44;
pub const STELLAR_COIN_TYPE: u32 = 148;

/// A BIP-32 style key path such as `44'/148'/0'`.
///
/// Components are stored with the hardened bit already applied, which is the
/// form the device expects on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DerivationPath {
    components: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid derivation path '{path}': {reason}")]
pub struct PathError {
    pub path: String,
    pub reason: String,
}

impl DerivationPath {
    /// `44'/148'/{index}'`
    pub fn for_account(index: u32) -> Result<Self, PathError> {
        if index >= HARDENED {
            return Err(PathError {
                path: format!("44'/148'/{}'", index),
                reason: "account index is too large".into(),
            });
        }
        Ok(Self {
            components: vec![
                STELLAR_PURPOSE | HARDENED,
                STELLAR_COIN_TYPE | HARDENED,
                index | HARDENED,
            ],
        })
    }

    pub fn components(&self) -> &[u32] {
        &self.components
    }

    /// The account index, if this is a plain `44'/148'/N'` path.
    pub fn account_index(&self) -> Option<u32> {
        match self.components.as_slice() {
            [purpose, coin, account]
                if *purpose == STELLAR_PURPOSE | HARDENED
                    && *coin == STELLAR_COIN_TYPE | HARDENED
                    && account & HARDENED != 0 =>
            {
                Some(account & !HARDENED)
            }
            _ => None,
        }
    }
}

impl FromStr for DerivationPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = |reason: &str| PathError {
            path: s.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = s.trim();
        let body = trimmed.strip_prefix("m/").unwrap_or(trimmed);
        if body.is_empty() {
            return Err(err("path is empty"));
        }

        let mut components = Vec::new();
        for segment in body.split('/') {
            let (digits, hardened) = match segment
                .strip_suffix('\'')
                .or_else(|| segment.strip_suffix('h'))
            {
                Some(d) => (d, true),
                None => (segment, false),
            };
            let value: u32 = digits
                .parse()
                .map_err(|_| err(&format!("'{}' is not a number", segment)))?;
            if value >= HARDENED {
                return Err(err(&format!("'{}' is out of range", segment)));
            }
            components.push(if hardened { value | HARDENED } else { value });
        }
        Ok(Self { components })
    }
}

impl Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, c) in self.components.iter().enumerate() {
            if i > 0 {
                write!(f, "/")?;
            }
            if c & HARDENED != 0 {
                write!(f, "{}'", c & !HARDENED)?;
            } else {
                write!(f, "{}", c)?;
            }
        }
        Ok(())
    }
}
