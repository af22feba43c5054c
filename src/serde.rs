//! Serde support for `Params` and `PubStore`.
//!
//! Both go through their binary wire encoding, so every format sees the same bytes.

use serde::{de, Deserialize as SerdeDeserialize, Deserializer as SerdeDeserializer};
use serde::{Serialize as SerdeSerialize, Serializer as SerdeSerializer};

use crate::codec::Serializable;
use crate::{Params, PubStore};

macro_rules! serde_via_wire_format {
    ($($t:ty),+) => {
        $(
            impl SerdeSerialize for $t {
                fn serialize<SS>(&self, serializer: SS) -> Result<SS::Ok, SS::Error>
                where
                    SS: SerdeSerializer,
                {
                    serializer.serialize_bytes(&self.to_vec())
                }
            }

            impl<'de> SerdeDeserialize<'de> for $t {
                fn deserialize<SD>(deserializer: SD) -> Result<$t, SD::Error>
                where
                    SD: SerdeDeserializer<'de>,
                {
                    // serde_bytes handles the insane variety of formats that various serialization
                    // formats present as what they think of as "bytes", like JSON's love of "a
                    // sequence of numbers".
                    let v: Vec<u8> = serde_bytes::deserialize(deserializer)?;
                    <$t>::from_slice(&v).map_err(|e| de::Error::custom(e.to_string()))
                }
            }
        )+
    };
}

serde_via_wire_format!(Params, PubStore);
