//! Composite key codec
//!
//! Each component is written as a one-byte length followed by its bytes, so
//! a packed key can be split back into its components and no packed key is a
//! prefix of a different packed key with the same number of components.

use crate::error::{Result, StarnameError};

/// Largest component length a packed key can carry
pub const MAX_COMPONENT_LEN: usize = 254;

/// Pack components into one length-prefixed key
pub fn pack<T: AsRef<[u8]>>(components: &[T]) -> Result<Vec<u8>> {
    let capacity = components.iter().map(|c| c.as_ref().len() + 1).sum();
    let mut packed = Vec::with_capacity(capacity);

    for (position, component) in components.iter().enumerate() {
        let component = component.as_ref();
        if component.is_empty() || component.len() > MAX_COMPONENT_LEN {
            return Err(StarnameError::Codec(format!(
                "component {} has length {}, expected 1..={}",
                position,
                component.len(),
                MAX_COMPONENT_LEN
            )));
        }
        packed.push(component.len() as u8);
        packed.extend_from_slice(component);
    }

    Ok(packed)
}

/// Split a packed key back into its components
pub fn unpack(packed: &[u8]) -> Result<Vec<Vec<u8>>> {
    let mut components = Vec::new();
    let mut rest = packed;

    loop {
        if rest.len() < 2 {
            return Err(StarnameError::Codec(format!(
                "packed key too short: {} bytes left",
                rest.len()
            )));
        }
        let len = rest[0] as usize;
        if len == 0 || len > MAX_COMPONENT_LEN || len > rest.len() - 1 {
            return Err(StarnameError::Codec(format!(
                "declared length {} does not fit in {} remaining bytes",
                len,
                rest.len() - 1
            )));
        }
        components.push(rest[1..=len].to_vec());
        rest = &rest[len + 1..];
        if rest.is_empty() {
            return Ok(components);
        }
    }
}
