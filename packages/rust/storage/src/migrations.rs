//! Schema migrations for stored slot blobs.
//!
//! Every slot is stored as a [`SlotEnvelope`]. Older blobs are upgraded in
//! memory on read, one version step at a time; the upgraded form reaches the
//! database the next time the slot is written.

use dealdesk_shared::{CURRENT_SCHEMA_VERSION, DealDeskError, Result};
use serde_json::{Map, Value, json};
use uuid::Uuid;

use crate::SlotEnvelope;

/// A blob migration from `from_version` to `from_version + 1`.
pub(crate) struct Migration {
    pub from_version: u32,
    pub description: &'static str,
    pub apply: fn(Value) -> Value,
}

/// All migrations, in ascending version order.
pub(crate) fn all_migrations() -> Vec<Migration> {
    vec![Migration {
        from_version: 0,
        description: "Wrap bare collection in a versioned envelope, numeric ids become UUIDs",
        apply: envelope_v1,
    }]
}

/// Schema version of a raw stored value. Anything that is not an envelope
/// is a schema-0 bare value; a version past `u32` counts as unsupported.
pub(crate) fn detect_version(raw: &Value) -> u32 {
    match raw {
        Value::Object(map) if map.contains_key("data") => map
            .get("schemaVersion")
            .and_then(Value::as_u64)
            .map(|v| u32::try_from(v).unwrap_or(u32::MAX))
            .unwrap_or(0),
        _ => 0,
    }
}

/// Bring a raw stored value up to [`CURRENT_SCHEMA_VERSION`].
pub(crate) fn upgrade(raw: Value) -> Result<SlotEnvelope> {
    let mut version = detect_version(&raw);
    if version > CURRENT_SCHEMA_VERSION {
        return Err(DealDeskError::Storage(format!(
            "slot schema v{version} is newer than supported v{CURRENT_SCHEMA_VERSION}"
        )));
    }

    let mut value = raw;
    for migration in all_migrations() {
        if migration.from_version == version && version < CURRENT_SCHEMA_VERSION {
            tracing::debug!(
                from = migration.from_version,
                description = migration.description,
                "upgrading slot blob"
            );
            value = (migration.apply)(value);
            version += 1;
        }
    }

    serde_json::from_value(value)
        .map_err(|e| DealDeskError::Storage(format!("invalid slot envelope: {e}")))
}

fn envelope_v1(value: Value) -> Value {
    // an explicit v0 envelope keeps its payload and timestamp
    let (data, saved_at) = match value {
        Value::Object(mut map) if map.contains_key("data") => (
            map.remove("data").unwrap_or(Value::Null),
            map.remove("savedAt"),
        ),
        bare => (bare, None),
    };

    let mut envelope = json!({
        "schemaVersion": 1,
        "data": upgrade_legacy_ids(data),
    });
    if let Some(saved_at) = saved_at {
        envelope["savedAt"] = saved_at;
    }
    envelope
}

/// Schema-0 records used numeric, timestamp-derived ids. Each maps onto a
/// fixed UUID, so `contactIds` and `contactListId` in other slots still
/// point at the same records after their own upgrade.
fn upgrade_legacy_ids(value: Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.into_iter().map(upgrade_legacy_ids).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(field, value)| {
                    let value = if field == "id" || field.ends_with("Id") {
                        legacy_id(value)
                    } else if field.ends_with("Ids") {
                        match value {
                            Value::Array(ids) => Value::Array(ids.into_iter().map(legacy_id).collect()),
                            other => other,
                        }
                    } else {
                        upgrade_legacy_ids(value)
                    };
                    (field, value)
                })
                .collect::<Map<String, Value>>(),
        ),
        other => other,
    }
}

fn legacy_id(value: Value) -> Value {
    let numeric = match &value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse::<u64>().ok(),
        _ => None,
    };
    match numeric {
        Some(n) => Value::String(Uuid::from_u128(u128::from(n)).to_string()),
        None => value,
    }
}
