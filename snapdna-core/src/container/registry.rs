use std::collections::HashMap;

use crate::blocks::{self, Block};
use crate::container::{codes, Decoded, Payload};
use crate::error::SnapResult;

pub type DecodeFn = fn(&[u8]) -> SnapResult<Block>;
pub type EncodeFn = fn(&Block) -> SnapResult<Vec<u8>>;

/// Matching decoder/encoder pair for one segment type.
#[derive(Clone, Copy, Debug)]
pub struct Codec {
    pub name: &'static str,
    pub decode: DecodeFn,
    pub encode: EncodeFn,
}

#[derive(Clone, Copy, Debug)]
pub enum Handler {
    Typed(Codec),
    /// Kept as raw bytes, but with a canonical value it can be reset to.
    Resettable {
        name: &'static str,
        reset: &'static [u8],
    },
}

impl Handler {
    pub fn name(&self) -> &'static str {
        match self {
            Handler::Typed(codec) => codec.name,
            Handler::Resettable { name, .. } => name,
        }
    }
}

/// Lookup table from segment type code to its handler.
///
/// Type codes without a handler are carried through as opaque bytes, so
/// teaching the codec a new segment type is a matter of registering one
/// more entry.
#[derive(Clone, Debug)]
pub struct Registry {
    handlers: HashMap<u8, Handler>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::standard()
    }
}

impl Registry {
    pub fn empty() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    pub fn standard() -> Self {
        let mut registry = Self::empty();
        for codec in blocks::standard_codecs() {
            registry.register(codec.0, Handler::Typed(codec.1));
        }
        registry.register(
            codes::HISTORY,
            Handler::Resettable {
                name: "history",
                reset: blocks::history::EMPTY_HISTORY,
            },
        );
        registry
    }

    pub fn register(&mut self, type_code: u8, handler: Handler) -> Option<Handler> {
        self.handlers.insert(type_code, handler)
    }

    pub fn unregister(&mut self, type_code: u8) -> Option<Handler> {
        self.handlers.remove(&type_code)
    }

    pub fn handler(&self, type_code: u8) -> Option<&Handler> {
        self.handlers.get(&type_code)
    }

    pub fn is_registered(&self, type_code: u8) -> bool {
        self.handlers.contains_key(&type_code)
    }

    pub fn name_of(&self, type_code: u8) -> &'static str {
        self.handler(type_code).map_or("opaque", Handler::name)
    }

    pub fn decode_payload(&self, type_code: u8, bytes: &[u8]) -> SnapResult<Payload> {
        match self.handlers.get(&type_code) {
            Some(Handler::Typed(codec)) => {
                let block = (codec.decode)(bytes)?;
                Ok(Payload::Decoded(Decoded::pristine(block, *codec, bytes.to_vec())))
            }
            Some(Handler::Resettable { reset, .. }) => Ok(Payload::Resettable {
                bytes: bytes.to_vec(),
                reset: *reset,
            }),
            None => {
                tracing::trace!(type_code, len = bytes.len(), "keeping opaque segment");
                Ok(Payload::Opaque(bytes.to_vec()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_table_covers_known_types() {
        let registry = Registry::standard();
        for code in [
            codes::DNA,
            codes::RESTRICTION_DIGEST,
            codes::NOTES,
            codes::HISTORY,
            codes::COOKIE,
            codes::FEATURES,
            codes::ALIGNED_SEQUENCE,
            codes::ALIGNABLE_SEQUENCES,
            codes::PROTEIN,
        ] {
            assert!(registry.is_registered(code), "type {code} not registered");
        }
        assert!(!registry.is_registered(codes::PRIMERS));
        assert!(!registry.is_registered(200));
        assert_eq!(registry.name_of(200), "opaque");
        assert_eq!(registry.name_of(codes::FEATURES), "features");
    }

    #[test]
    fn unknown_type_is_opaque() {
        let registry = Registry::standard();
        let payload = registry.decode_payload(42, b"\x00\xffjunk").unwrap();
        match payload {
            Payload::Opaque(bytes) => assert_eq!(bytes, b"\x00\xffjunk"),
            other => panic!("expected opaque payload, got {other:?}"),
        }
    }

    #[test]
    fn unregistering_makes_type_opaque() {
        let mut registry = Registry::standard();
        assert!(registry.unregister(codes::DNA).is_some());
        let payload = registry.decode_payload(codes::DNA, b"\x03ACGT").unwrap();
        assert!(matches!(payload, Payload::Opaque(_)));
    }

    #[test]
    fn history_is_resettable() {
        let registry = Registry::standard();
        let payload = registry.decode_payload(codes::HISTORY, b"\x5d\x00\x00").unwrap();
        match payload {
            Payload::Resettable { bytes, reset } => {
                assert_eq!(bytes, b"\x5d\x00\x00");
                assert_eq!(reset, blocks::history::EMPTY_HISTORY);
            }
            other => panic!("expected resettable payload, got {other:?}"),
        }
    }
}
