use std::{any::type_name, cmp::Ordering, fmt::Debug, marker::PhantomData};

use redb::{Key, TypeName, Value};
use ssz::{Decode, Encode};

use crate::errors::StoreError;

/// Stores `T` as its SSZ serialization. Used for roots in key position.
///
/// Keys encoded this way are ordered by their raw SSZ bytes, which for roots is
/// lexicographic byte order. Records are decoded through a [ValueCodec] instead, so a
/// corrupt value surfaces as [StoreError::Malformed].
#[derive(Debug)]
pub struct SSZEncoding<T>(PhantomData<T>);

impl<T> Value for SSZEncoding<T>
where
    T: Debug + Encode + Decode,
{
    type SelfType<'a>
        = T
    where
        Self: 'a;

    type AsBytes<'a>
        = Vec<u8>
    where
        Self: 'a;

    fn fixed_width() -> Option<usize> {
        None
    }

    fn from_bytes<'a>(data: &'a [u8]) -> Self::SelfType<'a>
    where
        Self: 'a,
    {
        // Only fixed size roots written by this crate are stored with this encoding
        T::from_ssz_bytes(data).expect("Failed to decode SSZ key bytes")
    }

    fn as_bytes<'a, 'b: 'a>(value: &'a Self::SelfType<'b>) -> Self::AsBytes<'a>
    where
        Self: 'b,
    {
        value.as_ssz_bytes()
    }

    fn type_name() -> TypeName {
        TypeName::new(&format!("SSZEncoding<{}>", type_name::<T>()))
    }
}

impl<T> Key for SSZEncoding<T>
where
    T: Debug + Encode + Decode,
{
    fn compare(data1: &[u8], data2: &[u8]) -> Ordering {
        data1.cmp(data2)
    }
}

/// Byte encoding of a stored record.
pub trait ValueCodec<T> {
    fn encode(value: &T) -> Result<Vec<u8>, StoreError>;

    fn decode(bytes: &[u8]) -> Result<T, StoreError>;
}

/// Plain SSZ.
#[derive(Debug)]
pub struct SSZCodec;

impl<T> ValueCodec<T> for SSZCodec
where
    T: Encode + Decode,
{
    fn encode(value: &T) -> Result<Vec<u8>, StoreError> {
        Ok(value.as_ssz_bytes())
    }

    fn decode(bytes: &[u8]) -> Result<T, StoreError> {
        T::from_ssz_bytes(bytes).map_err(|err| StoreError::malformed(type_name::<T>(), err))
    }
}

/// Snappy compressed SSZ. Used for states, whose randao mixes are mostly zero and
/// compress well.
#[derive(Debug)]
pub struct SnappySSZCodec;

impl<T> ValueCodec<T> for SnappySSZCodec
where
    T: Encode + Decode,
{
    fn encode(value: &T) -> Result<Vec<u8>, StoreError> {
        Ok(snap::raw::Encoder::new().compress_vec(&value.as_ssz_bytes())?)
    }

    fn decode(bytes: &[u8]) -> Result<T, StoreError> {
        let decompressed =
            snap::raw::Decoder::new()
                .decompress_vec(bytes)
                .map_err(|err| StoreError::Malformed {
                    kind: type_name::<T>(),
                    reason: err.to_string(),
                })?;
        SSZCodec::decode(&decompressed)
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::B256;
    use cairn_consensus_beacon::checkpoint::Checkpoint;

    use super::*;

    #[test]
    fn test_codecs_reject_corrupt_bytes() {
        let checkpoint = Checkpoint {
            epoch: 3,
            root: B256::repeat_byte(7),
        };
        let bytes = <SSZCodec as ValueCodec<Checkpoint>>::encode(&checkpoint)
            .expect("ssz encoding is infallible");
        assert_eq!(
            <SSZCodec as ValueCodec<Checkpoint>>::decode(&bytes).ok(),
            Some(checkpoint)
        );

        assert!(matches!(
            <SSZCodec as ValueCodec<Checkpoint>>::decode(&bytes[..5]),
            Err(StoreError::Malformed { .. })
        ));
        assert!(matches!(
            <SnappySSZCodec as ValueCodec<Checkpoint>>::decode(&[0xff, 0xff, 0xff]),
            Err(StoreError::Malformed { .. })
        ));
    }
}
