//! The `data`/`meta` envelope used by every service of the auction platform
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meta {
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "String::is_empty"
    )]
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub data: Option<T>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub meta: Meta,
}

/// Peers send `null` for fields they have nothing to say about
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            data: Some(data),
            meta: Meta::default(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            data: None,
            meta: Meta {
                message: message.into(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, PartialEq, Deserialize)]
    struct Id {
        id: String,
    }

    #[test]
    fn data_and_meta_are_both_optional_on_the_wire() -> anyhow::Result<()> {
        let only_data: Envelope<Id> = serde_json::from_value(json!({"data": {"id": "x"}}))?;
        assert_eq!(only_data.data, Some(Id { id: "x".into() }));
        assert_eq!(only_data.meta, Meta::default());

        let only_meta: Envelope<Id> =
            serde_json::from_value(json!({"meta": {"message": "nope"}}))?;
        assert_eq!(only_meta.data, None);
        assert_eq!(only_meta.meta.message, "nope");
        Ok(())
    }

    #[test]
    fn explicit_nulls_decode_as_missing() -> anyhow::Result<()> {
        let null_meta: Envelope<Id> =
            serde_json::from_value(json!({"data": {"id": "x"}, "meta": null}))?;
        assert_eq!(null_meta.data, Some(Id { id: "x".into() }));
        assert_eq!(null_meta.meta, Meta::default());

        let null_message: Envelope<Id> =
            serde_json::from_value(json!({"data": null, "meta": {"message": null}}))?;
        assert_eq!(null_message.data, None);
        assert_eq!(null_message.meta.message, "");
        Ok(())
    }

    #[test]
    fn success_envelope_shape() -> anyhow::Result<()> {
        assert_eq!(
            serde_json::to_value(Envelope::ok(json!({"a": 1})))?,
            json!({"data": {"a": 1}, "meta": {}})
        );
        assert_eq!(
            serde_json::to_value(Envelope::<()>::error("boom"))?,
            json!({"data": null, "meta": {"message": "boom"}})
        );
        Ok(())
    }
}
